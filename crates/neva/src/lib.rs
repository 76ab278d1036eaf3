//! Neva - BPK0 game archive inspection library.
//!
//! This crate provides a unified interface to the Neva crates.
//!
//! # Crates
//!
//! - [`neva_common`] - Little-endian and Shift-JIS primitive decoders
//! - [`neva_bpk`] - BPK0 folder/file table walker and chunk scanner
//!
//! # Example
//!
//! ```no_run
//! use neva::prelude::*;
//!
//! let mut files = 0;
//! for record in ArchiveWalker::open("neva.pkg")? {
//!     if record?.file.is_some() {
//!         files += 1;
//!     }
//! }
//! println!("Files: {}", files);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use neva_bpk as bpk;
pub use neva_common as common;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use neva_bpk::{
        ArchiveSource, ArchiveWalker, ChunkScanner, FileEntry, Folder, Layout, Record, ScanReport,
    };
    pub use neva_common::{decode_legacy_text, decode_uint};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
