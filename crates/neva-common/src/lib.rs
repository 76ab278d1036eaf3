//! Common utilities for Neva.
//!
//! This crate provides the primitive decoders shared by the archive crates:
//!
//! - [`decode_uint`] - Little-endian unsigned integers of any width up to 8 bytes
//! - [`decode_legacy_text`] - Shift-JIS, null-padded name slots to UTF-8
//! - [`BinaryReader`] - Bounds-checked cursor over a byte slice

mod decode;
mod error;
mod reader;

pub use decode::{decode_legacy_text, decode_uint, LegacyText};
pub use error::{Error, Result};
pub use reader::BinaryReader;
