//! Raw chunk scan of a BPK0 archive.
//!
//! A second reading of the same container: instead of following the folder
//! table, step through the archive in fixed-size blocks and report every
//! block that opens a `BDL0` data chunk, up to the footer the header
//! points at.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, warn};
use neva_common::decode_uint;

use crate::layout::ScanLayout;
use crate::source::ArchiveSource;
use crate::walker::read_signature;
use crate::{Error, Result};

/// Header block of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScanHeader {
    /// Always zero.
    pub address: u64,
    /// The header bytes following the signature.
    #[cfg_attr(feature = "serde", serde(serialize_with = "hex_bytes"))]
    pub magic_bytes: Vec<u8>,
    /// Address of the footer announced by the header.
    pub footer_address: u64,
}

/// A `BDL0` data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Chunk {
    pub address: u64,
    /// Compressed size when `compressed`, raw size otherwise.
    pub size: u64,
    pub compressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Footer {
    pub address: u64,
}

/// Result of a chunk scan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScanReport {
    pub header: ScanHeader,
    pub chunks: Vec<Chunk>,
    /// `None` when no block boundary matched the footer address.
    pub footer: Option<Footer>,
}

/// Block-by-block scanner for `BDL0` chunks.
#[derive(Debug)]
pub struct ChunkScanner<R> {
    source: ArchiveSource<R>,
    layout: ScanLayout,
}

impl ChunkScanner<BufReader<File>> {
    /// Open an archive file with the standard layout.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(ArchiveSource::open(path)?, ScanLayout::BPK0))
    }
}

impl<R: Read + Seek> ChunkScanner<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        Ok(Self::new(ArchiveSource::new(reader)?, ScanLayout::BPK0))
    }

    pub fn new(source: ArchiveSource<R>, layout: ScanLayout) -> Self {
        Self { source, layout }
    }

    /// Scan the whole archive.
    pub fn scan(mut self) -> Result<ScanReport> {
        let layout = self.layout;
        read_signature(&mut self.source, &layout.signature)?;

        let (magic_start, magic_end) = layout.magic_range;
        let head = self.source.read_at(0, magic_end.max(layout.footer_pointer + 4))?;
        let footer_address = decode_uint(&head[layout.footer_pointer..layout.footer_pointer + 4]);
        let header = ScanHeader {
            address: 0,
            magic_bytes: head[magic_start..magic_end].to_vec(),
            footer_address,
        };
        debug!("footer announced at {:#x}", footer_address);

        let chunk_header_len = layout.packed_size_offset.max(layout.raw_size_offset) + layout.size_width;
        let mut chunks = Vec::new();
        let mut footer = None;
        // Block 0 holds the header, but a footer address of zero still matches it.
        let mut address = 0;

        while address < self.source.len() {
            let block = self.source.read_up_to(address, chunk_header_len)?;

            if block.starts_with(&layout.chunk_signature) {
                if block.len() < chunk_header_len {
                    return Err(Error::TruncatedRead {
                        offset: address,
                        needed: chunk_header_len as u64,
                        available: block.len() as u64,
                    });
                }
                chunks.push(self.read_chunk(address, &block));
            } else if address == footer_address {
                footer = Some(Footer { address });
                break;
            }

            address += layout.block_size;
        }

        if footer.is_none() {
            warn!(
                "footer address {:#x} is not a {}-byte block boundary inside the archive",
                footer_address, layout.block_size
            );
        }

        Ok(ScanReport {
            header,
            chunks,
            footer,
        })
    }

    fn read_chunk(&self, address: u64, block: &[u8]) -> Chunk {
        let width = self.layout.size_width;
        let packed_at = self.layout.packed_size_offset;
        let raw_at = self.layout.raw_size_offset;

        let packed = decode_uint(&block[packed_at..packed_at + width]);
        let chunk = if packed == 0 {
            Chunk {
                address,
                size: decode_uint(&block[raw_at..raw_at + width]),
                compressed: false,
            }
        } else {
            Chunk {
                address,
                size: packed,
                compressed: true,
            }
        };

        debug!(
            "chunk at {:#x}: {} bytes{}",
            address,
            chunk.size,
            if chunk.compressed { " (compressed)" } else { "" }
        );
        chunk
    }
}

#[cfg(feature = "serde")]
fn hex_bytes<S: serde::Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    serializer.serialize_str(&hex.join(" "))
}
