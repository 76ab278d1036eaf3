//! Folder/file table walker.
//!
//! The archive has no index: the header points at the folder table, each
//! folder record points at its own file table, and each file record points
//! at its name. The walker follows those pointers one read at a time and
//! yields a [`Record`] per file, or per folder when the folder is empty.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use log::{debug, trace, warn};
use neva_common::{decode_legacy_text, decode_uint, BinaryReader};

use crate::entry::{FileEntry, Folder, Header, Record};
use crate::source::ArchiveSource;
use crate::{Error, Layout, Result};

#[derive(Debug)]
enum State {
    /// Next step reads the folder record at `consumed`.
    Folders,
    /// Inside a folder's file table.
    Files { folder: Arc<Folder>, next: u64 },
    Done,
}

/// Streaming reader for the folder and file tables of a BPK0 archive.
///
/// Opening validates the signature and locates the folder table; iterating
/// decodes one record at a time. The iterator is fused: after the first
/// error, or once the folder table is exhausted, it only returns `None`.
///
/// # Example
///
/// ```no_run
/// use neva_bpk::ArchiveWalker;
///
/// let walker = ArchiveWalker::open("neva.pkg")?;
/// for record in walker {
///     let record = record?;
///     match &record.file {
///         Some(file) => println!("{}/{}: {} bytes", record.folder.name, file.name, file.stored_size),
///         None => println!("{}/ (empty)", record.folder.name),
///     }
/// }
/// # Ok::<(), neva_bpk::Error>(())
/// ```
#[derive(Debug)]
pub struct ArchiveWalker<R> {
    source: ArchiveSource<R>,
    layout: Layout,
    header: Header,
    folder_table_size: u64,
    consumed: u64,
    state: State,
}

impl ArchiveWalker<BufReader<File>> {
    /// Open an archive file with the standard layout.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(ArchiveSource::open(path)?, Layout::BPK0)
    }
}

impl<R: Read + Seek> ArchiveWalker<R> {
    /// Walk any seekable reader with the standard layout.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::new(ArchiveSource::new(reader)?, Layout::BPK0)
    }

    /// Check the signature and locate the folder table.
    pub fn new(mut source: ArchiveSource<R>, layout: Layout) -> Result<Self> {
        let signature = read_signature(&mut source, &layout.signature)?;

        let pointer = source.read_at(layout.folder_table_pointer, 4)?;
        let folder_table_address = decode_uint(&pointer);
        let folder_table_size = source
            .len()
            .checked_sub(folder_table_address)
            .ok_or(Error::TruncatedRead {
                offset: folder_table_address,
                needed: layout.folder_prefix_len,
                available: 0,
            })?;

        debug!(
            "folder table at {:#x}, {} bytes",
            folder_table_address, folder_table_size
        );

        Ok(Self {
            source,
            layout,
            header: Header {
                signature,
                folder_table_address,
            },
            folder_table_size,
            consumed: 0,
            state: State::Folders,
        })
    }

    /// Get the decoded header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Absolute offset of the folder table.
    #[inline]
    pub fn folder_table_address(&self) -> u64 {
        self.header.folder_table_address
    }

    /// Size of the folder table, which runs to the end of the archive.
    #[inline]
    pub fn folder_table_size(&self) -> u64 {
        self.folder_table_size
    }

    /// Bytes of the folder table belonging to fully walked folders.
    #[inline]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    fn advance(&mut self) -> Result<Option<Record>> {
        loop {
            match &mut self.state {
                State::Done => return Ok(None),
                State::Folders => {
                    if self.consumed >= self.folder_table_size {
                        self.state = State::Done;
                        return Ok(None);
                    }

                    let folder = Arc::new(self.read_folder()?);
                    if folder.is_empty() {
                        // The file table address of an empty folder is never followed.
                        self.consumed += folder.record_length;
                        return Ok(Some(Record { folder, file: None }));
                    }
                    self.state = State::Files { folder, next: 0 };
                }
                State::Files { folder, next } => {
                    if *next == folder.file_count {
                        self.consumed += folder.record_length;
                        self.state = State::Folders;
                        continue;
                    }

                    let index = *next;
                    *next += 1;
                    let folder = Arc::clone(folder);
                    let file = self.read_file(&folder, index)?;
                    return Ok(Some(Record {
                        folder,
                        file: Some(file),
                    }));
                }
            }
        }
    }

    fn read_folder(&mut self) -> Result<Folder> {
        let address = self.header.folder_table_address + self.consumed;

        let length = self
            .source
            .read_at(address + self.layout.folder_length_offset, 2)
            .map(|bytes| decode_uint(&bytes))?;
        if length < self.layout.folder_prefix_len {
            return Err(Error::InvalidRecordLength {
                address,
                length,
                minimum: self.layout.folder_prefix_len,
            });
        }

        let unit = self.source.read_at(address, length as usize)?;
        let mut reader = BinaryReader::new(&unit);

        reader.skip(4)?; // reserved
        let record_length = reader.read_u16()? as u64;
        let file_count = reader.read_u16()? as u64;
        let file_table_address = reader.read_u32()? as u64;
        let reserved_size = reader.read_u32()? as u64;
        reader.skip(4)?; // divider
        let name = reader.read_legacy_text(reader.remaining())?;

        if name.had_errors {
            warn!(
                "folder name at {:#x} is not valid Shift-JIS, decoded as {:?}",
                address, name.text
            );
        }
        debug!(
            "folder {:?} at {:#x}: {} files, table at {:#x}",
            name.text, address, file_count, file_table_address
        );

        Ok(Folder {
            name: name.text,
            name_lossy: name.had_errors,
            record_address: address,
            record_length,
            file_count,
            file_table_address,
            reserved_size,
        })
    }

    fn read_file(&mut self, folder: &Folder, index: u64) -> Result<FileEntry> {
        let record_address = folder.file_table_address + index * self.layout.file_record_len;
        let record = self
            .source
            .read_at(record_address, self.layout.file_record_len as usize)?;

        let mut reader = BinaryReader::new(&record);
        let name_offset = reader.read_u32()? as u64;
        let full_size = reader.read_u32()? as u64;
        let stored_size = reader.read_u32()? as u64;
        let data_address = reader.read_u32()? as u64;

        // The last name slot may end on the final byte of the archive.
        let slot = self
            .source
            .read_up_to(record_address + name_offset, self.layout.file_name_len)?;
        let name = decode_legacy_text(&slot);

        if name.had_errors {
            warn!(
                "file name at {:#x} in folder {:?} is not valid Shift-JIS, decoded as {:?}",
                record_address + name_offset,
                folder.name,
                name.text
            );
        }
        trace!(
            "file {:?} at {:#x}: {} -> {} bytes at {:#x}",
            name.text,
            record_address,
            stored_size,
            full_size,
            data_address
        );

        Ok(FileEntry {
            name: name.text,
            name_lossy: name.had_errors,
            record_address,
            name_offset,
            full_size,
            stored_size,
            data_address,
        })
    }
}

impl<R: Read + Seek> Iterator for ArchiveWalker<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read + Seek> std::iter::FusedIterator for ArchiveWalker<R> {}

/// Compare the first bytes of the source with `expected`.
///
/// Files shorter than the signature are a mismatch, not a truncated read.
pub(crate) fn read_signature<R: Read + Seek>(
    source: &mut ArchiveSource<R>,
    expected: &[u8; 4],
) -> Result<[u8; 4]> {
    let actual = if source.is_empty() {
        Vec::new()
    } else {
        source.read_up_to(0, expected.len())?
    };

    if actual.as_slice() != expected {
        return Err(Error::SignatureMismatch {
            expected: expected.to_vec(),
            actual,
        });
    }
    Ok(*expected)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::fixture::{ArchiveBuilder, FixtureFile, FixtureFolder};

    fn walk(data: Vec<u8>) -> Vec<Record> {
        ArchiveWalker::from_reader(Cursor::new(data))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_single_empty_folder() {
        let data = ArchiveBuilder::new(0x20)
            .folder(FixtureFolder::new(b"A", vec![]))
            .build();
        assert_eq!(&data[8..12], &[0x20, 0, 0, 0]);

        let mut walker = ArchiveWalker::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(walker.folder_table_address(), 0x20);
        assert_eq!(walker.folder_table_size(), 21);

        let record = walker.next().unwrap().unwrap();
        assert_eq!(record.folder.name, "A");
        assert_eq!(record.folder.record_length, 21);
        assert!(record.file.is_none());

        assert!(walker.next().is_none());
        assert_eq!(walker.consumed(), 21);
    }

    #[test]
    fn test_files_read_with_record_stride() {
        let data = ArchiveBuilder::new(0x100)
            .folder(FixtureFolder::new(
                b"sound",
                vec![
                    FixtureFile::new(b"bgm01.ogg", 100, 100, 0x4000),
                    FixtureFile::new(b"se01.ogg", 50, 80, 0x5000),
                ],
            ))
            .build();

        let records = walk(data);
        assert_eq!(records.len(), 2);

        let first = records[0].file.as_ref().unwrap();
        let second = records[1].file.as_ref().unwrap();

        assert_eq!(records[0].folder.file_table_address, 0x100);
        assert_eq!(records[0].folder.file_count, 2);
        assert_eq!(first.record_address, 0x100);
        assert_eq!(second.record_address, 0x110);

        // Names follow the two records, one 64-byte slot each.
        assert_eq!(first.name_offset, 0x20);
        assert_eq!(second.name_offset, 0x50);
        assert_eq!(first.name_address(), 0x120);
        assert_eq!(second.name_address(), 0x160);

        assert_eq!(first.name, "bgm01.ogg");
        assert_eq!(second.name, "se01.ogg");
        assert_eq!(first.data_address, 0x4000);
        assert_eq!(second.stored_size, 80);
        assert!(Arc::ptr_eq(&records[0].folder, &records[1].folder));
    }

    #[test]
    fn test_compression_flag() {
        let data = ArchiveBuilder::new(0x20)
            .folder(FixtureFolder::new(
                b"data",
                vec![
                    FixtureFile::new(b"packed", 10, 20, 0),
                    FixtureFile::new(b"stored", 20, 20, 0),
                    FixtureFile::new(b"smaller", 20, 10, 0),
                ],
            ))
            .build();

        let flags: Vec<bool> = walk(data)
            .iter()
            .map(|r| r.file.as_ref().unwrap().is_compressed())
            .collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_empty_folder_ignores_file_table_address() {
        let data = ArchiveBuilder::new(0x20)
            .folder(FixtureFolder::new(b"empty", vec![]).with_file_table_address(0xDEAD_BEEF))
            .folder(FixtureFolder::new(b"next", vec![FixtureFile::new(b"f", 1, 1, 0)]))
            .build();

        let records = walk(data);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].folder.name, "empty");
        assert_eq!(records[0].folder.file_table_address, 0xDEAD_BEEF);
        assert!(records[0].file.is_none());
        assert_eq!(records[1].file.as_ref().unwrap().name, "f");
    }

    #[test]
    fn test_folder_table_consumed_exactly() {
        let data = ArchiveBuilder::new(0x40)
            .folder(FixtureFolder::new(b"a", vec![FixtureFile::new(b"1", 1, 1, 0)]))
            .folder(FixtureFolder::new(b"longer_name", vec![]))
            .folder(FixtureFolder::new(
                b"bc",
                vec![FixtureFile::new(b"2", 1, 1, 0), FixtureFile::new(b"3", 1, 1, 0)],
            ))
            .build();

        let mut walker = ArchiveWalker::from_reader(Cursor::new(data)).unwrap();
        let mut lengths = Vec::new();
        let mut last_folder = None;
        for record in walker.by_ref() {
            let record = record.unwrap();
            if last_folder != Some(record.folder.record_address) {
                lengths.push(record.folder.record_length);
                last_folder = Some(record.folder.record_address);
            }
        }

        assert_eq!(lengths, vec![21, 31, 22]);
        assert_eq!(lengths.iter().sum::<u64>(), walker.folder_table_size());
        assert_eq!(walker.consumed(), walker.folder_table_size());
    }

    #[test]
    fn test_bad_signature_any_length() {
        let valid = ArchiveBuilder::new(0x20)
            .folder(FixtureFolder::new(b"A", vec![]))
            .build();

        for len in 0..valid.len() {
            let mut data = valid[..len].to_vec();
            if len >= 4 {
                data[3] = b'1';
            }
            match ArchiveWalker::from_reader(Cursor::new(data)) {
                Err(e) => assert!(e.is_invalid_format(), "length {}: {:?}", len, e),
                Ok(_) => panic!("length {} accepted", len),
            }
        }
    }

    #[test]
    fn test_pointer_past_end() {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(b"BPK0");
        data[8..12].copy_from_slice(&0x40u32.to_le_bytes());

        assert!(matches!(
            ArchiveWalker::from_reader(Cursor::new(data)),
            Err(Error::TruncatedRead { offset: 0x40, .. })
        ));
    }

    #[test]
    fn test_header_too_short_for_pointer() {
        assert!(matches!(
            ArchiveWalker::from_reader(Cursor::new(b"BPK0\0\0\0\0\x20".to_vec())),
            Err(Error::TruncatedRead { offset: 8, .. })
        ));
    }

    #[test]
    fn test_corrupt_record_length_is_truncated_read() {
        let mut data = ArchiveBuilder::new(0x20)
            .folder(FixtureFolder::new(b"first", vec![]))
            .folder(FixtureFolder::new(b"second", vec![]))
            .build();
        // Second folder record starts after the first (20 + 5 bytes).
        let second = 0x20 + 25;
        data[second + 4..second + 6].copy_from_slice(&0x200u16.to_le_bytes());

        let mut walker = ArchiveWalker::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(walker.next().unwrap().unwrap().folder.name, "first");
        assert!(matches!(
            walker.next(),
            Some(Err(Error::TruncatedRead { .. }))
        ));
        assert!(walker.next().is_none());
        assert_eq!(walker.consumed(), 25);
    }

    #[test]
    fn test_record_length_below_prefix() {
        let mut data = ArchiveBuilder::new(0x20)
            .folder(FixtureFolder::new(b"A", vec![]))
            .build();
        data[0x24..0x26].copy_from_slice(&0u16.to_le_bytes());

        let mut walker = ArchiveWalker::from_reader(Cursor::new(data)).unwrap();
        assert!(matches!(
            walker.next(),
            Some(Err(Error::InvalidRecordLength {
                address: 0x20,
                length: 0,
                minimum: 20
            }))
        ));
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_file_table_out_of_bounds() {
        let data = ArchiveBuilder::new(0x20)
            .folder(
                FixtureFolder::new(b"broken", vec![FixtureFile::new(b"x", 1, 1, 0)])
                    .with_file_table_address(0x10_0000),
            )
            .build();

        let mut walker = ArchiveWalker::from_reader(Cursor::new(data)).unwrap();
        assert!(matches!(
            walker.next(),
            Some(Err(Error::TruncatedRead {
                offset: 0x10_0000,
                ..
            }))
        ));
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_name_slot_clamped_at_end_of_archive() {
        let mut data = ArchiveBuilder::new(0x20)
            .folder(FixtureFolder::new(b"Z", vec![FixtureFile::new(b"x", 1, 1, 0)]))
            .build();
        // Point the file name at the folder name, the last byte of the archive.
        let name_offset = (data.len() - 1 - 0x20) as u32;
        data[0x20..0x24].copy_from_slice(&name_offset.to_le_bytes());

        let records = walk(data);
        assert_eq!(records[0].file.as_ref().unwrap().name, "Z");
    }

    #[test]
    fn test_shift_jis_names() {
        let data = ArchiveBuilder::new(0x20)
            .folder(FixtureFolder::new(
                &[0x83, 0x65, 0x83, 0x58, 0x83, 0x67],
                vec![FixtureFile::new(&[0x82, 0x60, b'.', b'b', b'i', b'n'], 1, 1, 0)],
            ))
            .build();

        let records = walk(data);
        assert_eq!(records[0].folder.name, "テスト");
        assert_eq!(records[0].file.as_ref().unwrap().name, "Ａ.bin");
        assert!(!records[0].file.as_ref().unwrap().name_lossy);
    }

    #[test]
    fn test_undecodable_name_is_lossy() {
        let data = ArchiveBuilder::new(0x20)
            .folder(FixtureFolder::new(
                b"dir",
                vec![FixtureFile::new(&[b'a', 0x81], 1, 1, 0)],
            ))
            .build();

        let records = walk(data);
        let file = records[0].file.as_ref().unwrap();
        assert_eq!(file.name, "a\u{FFFD}");
        assert!(file.name_lossy);
    }

    #[test]
    fn test_empty_folder_table() {
        let mut data = vec![0u8; 12];
        data[..4].copy_from_slice(b"BPK0");
        data[8..12].copy_from_slice(&12u32.to_le_bytes());

        assert!(walk(data).is_empty());
    }

    #[test]
    fn test_walker_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ArchiveWalker<Cursor<Vec<u8>>>>();
        assert_send::<ArchiveWalker<BufReader<File>>>();
    }
}
