//! Binary reader for bounds-checked parsing of record buffers.
//!
//! This module provides [`BinaryReader`], a cursor-like type that walks a
//! record that has already been read from the archive in one piece.

use crate::decode::{decode_legacy_text, decode_uint, LegacyText};
use crate::{Error, Result};

/// A binary reader over a byte slice.
///
/// All integer reads are little-endian and go through [`decode_uint`].
///
/// # Example
///
/// ```
/// use neva_common::BinaryReader;
///
/// let data = [0x15, 0x00, 0x02, 0x00, 0x00, 0x01, 0x00, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u16().unwrap(), 0x15);
/// assert_eq!(reader.read_u16().unwrap(), 2);
/// assert_eq!(reader.read_u32().unwrap(), 0x100);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Skip over bytes that carry no information.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Read an unsigned little-endian integer `width` bytes wide (1 to 8).
    #[inline]
    pub fn read_uint(&mut self, width: usize) -> Result<u64> {
        self.read_bytes(width).map(decode_uint)
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_uint(2).map(|v| v as u16)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_uint(4).map(|v| v as u32)
    }

    /// Read a fixed-size Shift-JIS name slot, stopping at the first null.
    pub fn read_legacy_text(&mut self, slot_size: usize) -> Result<LegacyText> {
        self.read_bytes(slot_size).map(decode_legacy_text)
    }
}
