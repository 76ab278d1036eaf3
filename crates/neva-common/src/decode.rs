//! Primitive field decoders.
//!
//! Every multi-byte field in a BPK0 archive is an unsigned little-endian
//! integer, and every name is a null-padded Shift-JIS slot. These two
//! functions are the only places those encodings are interpreted.

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::SHIFT_JIS;

/// Decode `bytes` as an unsigned little-endian integer.
///
/// The width is the length of the slice, between 1 and 8 bytes. Callers slice
/// exactly the field they want; passing an empty or oversized slice is a
/// contract violation and panics.
///
/// ```
/// use neva_common::decode_uint;
///
/// assert_eq!(decode_uint(&[0x20, 0x00, 0x00, 0x00]), 0x20);
/// assert_eq!(decode_uint(&[0xFF, 0x01]), 0x01FF);
/// ```
#[inline]
pub fn decode_uint(bytes: &[u8]) -> u64 {
    LittleEndian::read_uint(bytes, bytes.len())
}

/// Text recovered from a legacy name slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyText {
    /// The decoded UTF-8 text, without padding.
    pub text: String,
    /// Whether any byte sequence had to be replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode a null-padded Shift-JIS buffer into UTF-8.
///
/// Decoding stops at the first `0x00` byte or at the end of the buffer.
/// Shift-JIS trail bytes never take the value zero, so cutting there cannot
/// split a double-byte character. Sequences with no Unicode mapping are
/// replaced rather than rejected.
pub fn decode_legacy_text(bytes: &[u8]) -> LegacyText {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (text, had_errors) = SHIFT_JIS.decode_without_bom_handling(&bytes[..end]);

    LegacyText {
        text: text.into_owned(),
        had_errors,
    }
}
