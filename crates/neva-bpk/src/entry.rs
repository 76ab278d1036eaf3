//! Records decoded from the folder and file tables.

use std::sync::Arc;

/// Archive header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Signature found at offset 0.
    pub signature: [u8; 4],
    /// Absolute offset of the folder table.
    pub folder_table_address: u64,
}

/// A folder record from the folder table.
///
/// This contains the folder's own metadata, not its files. Files are
/// delivered one [`Record`] at a time by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    /// Decoded folder name.
    pub name: String,
    /// Whether the name contained bytes with no Unicode mapping.
    pub name_lossy: bool,
    /// Absolute offset of this folder record.
    pub record_address: u64,
    /// Declared record length, name included.
    pub record_length: u64,
    /// Number of file records in this folder's file table.
    pub file_count: u64,
    /// Absolute offset of the folder's file table.
    pub file_table_address: u64,
    /// Reserved size field, carried as-is.
    pub reserved_size: u64,
}

impl Folder {
    /// Check if this folder has no files.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }
}

/// A file record with its decoded name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Decoded file name.
    pub name: String,
    /// Whether the name contained bytes with no Unicode mapping.
    pub name_lossy: bool,
    /// Absolute offset of the 16-byte file record.
    pub record_address: u64,
    /// Name offset relative to `record_address`.
    pub name_offset: u64,
    /// Decompressed size in bytes.
    pub full_size: u64,
    /// Size of the payload as stored in the archive.
    pub stored_size: u64,
    /// Absolute offset of the payload.
    pub data_address: u64,
}

impl FileEntry {
    /// Check if the payload is stored compressed.
    ///
    /// Equal sizes mean the payload is stored as-is.
    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.stored_size > self.full_size
    }

    /// Absolute offset of the name slot.
    #[inline]
    pub fn name_address(&self) -> u64 {
        self.record_address + self.name_offset
    }
}

/// One item of a walk: a file in its folder, or an empty folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Folder the file belongs to, shared between that folder's records.
    pub folder: Arc<Folder>,
    /// The file, or `None` when the folder has no files.
    pub file: Option<FileEntry>,
}
