//! Fixed layout of the BPK0 container.
//!
//! The format belongs to a third party, so these values are data to match,
//! not parameters to tune. They are grouped in immutable values that the
//! walker and the scanner carry instead of reading globals.

/// Layout of the folder/file table interpretation.
///
/// Folder record:
///
/// | bytes   | field                   |
/// |---------|-------------------------|
/// | 0..4    | reserved                |
/// | 4..6    | record length           |
/// | 6..8    | file count              |
/// | 8..12   | file table address      |
/// | 12..16  | reserved size           |
/// | 16..20  | divider                 |
/// | 20..len | name                    |
///
/// File record: name offset, full size, stored size, data address, each u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Signature at offset 0.
    pub signature: [u8; 4],
    /// Offset of the u32 pointer to the folder table.
    pub folder_table_pointer: u64,
    /// Fixed part of a folder record, before the name.
    pub folder_prefix_len: u64,
    /// Offset of the u16 record length inside a folder record.
    pub folder_length_offset: u64,
    /// Stride between file records in a file table.
    pub file_record_len: u64,
    /// Size of the name slot a file record points at.
    pub file_name_len: usize,
}

impl Layout {
    /// The layout used by every known BPK0 archive.
    pub const BPK0: Layout = Layout {
        signature: *b"BPK0",
        folder_table_pointer: 8,
        folder_prefix_len: 20,
        folder_length_offset: 4,
        file_record_len: 16,
        file_name_len: 64,
    };
}

impl Default for Layout {
    fn default() -> Self {
        Self::BPK0
    }
}

/// Layout of the raw chunk interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLayout {
    /// Signature at offset 0.
    pub signature: [u8; 4],
    /// Signature at the start of every data chunk.
    pub chunk_signature: [u8; 4],
    /// Alignment of chunks and of the footer.
    pub block_size: u64,
    /// Header bytes reported as the header's magic.
    pub magic_range: (usize, usize),
    /// Offset of the u32 footer address in the header.
    pub footer_pointer: usize,
    /// Offset of the 3-byte uncompressed size in a chunk header.
    pub raw_size_offset: usize,
    /// Offset of the 3-byte compressed size in a chunk header; zero means stored.
    pub packed_size_offset: usize,
    /// Width of both chunk size fields.
    pub size_width: usize,
}

impl ScanLayout {
    pub const BPK0: ScanLayout = ScanLayout {
        signature: *b"BPK0",
        chunk_signature: *b"BDL0",
        block_size: 2048,
        magic_range: (4, 20),
        footer_pointer: 16,
        raw_size_offset: 4,
        packed_size_offset: 8,
        size_width: 3,
    };
}

impl Default for ScanLayout {
    fn default() -> Self {
        Self::BPK0
    }
}
