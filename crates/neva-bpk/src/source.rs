//! Seekable byte source with a known length.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::{Error, Result};

/// An open archive: a seekable reader plus its total length.
///
/// Every read is checked against the length measured at open time, so a
/// corrupt offset surfaces as [`Error::TruncatedRead`] instead of garbage.
#[derive(Debug)]
pub struct ArchiveSource<R> {
    inner: R,
    len: u64,
}

impl ArchiveSource<BufReader<File>> {
    /// Open an archive file for reading.
    ///
    /// Anything that keeps the file from being measured, directories
    /// included, is reported as [`Error::Open`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |source| Error::Open {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(open_error)?;
        if file.metadata().map_err(open_error)?.is_dir() {
            return Err(open_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "is a directory",
            )));
        }

        Self::new(BufReader::new(file)).map_err(|e| match e {
            Error::Io(source) => open_error(source),
            other => other,
        })
    }
}

impl<R: Read + Seek> ArchiveSource<R> {
    /// Wrap a reader, measuring its length by seeking to the end.
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, len })
    }

    /// Total length of the archive in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the archive is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read exactly `count` bytes at `offset`.
    pub fn read_at(&mut self, offset: u64, count: usize) -> Result<Vec<u8>> {
        let end = offset.checked_add(count as u64);
        if end.map_or(true, |end| end > self.len) {
            return Err(self.truncated(offset, count as u64));
        }

        self.read_exact_at(offset, count)
    }

    /// Read up to `count` bytes at `offset`, stopping at the end of the archive.
    ///
    /// `offset` itself must lie inside the archive.
    pub fn read_up_to(&mut self, offset: u64, count: usize) -> Result<Vec<u8>> {
        if offset >= self.len {
            return Err(self.truncated(offset, count as u64));
        }

        let available = (self.len - offset).min(count as u64) as usize;
        self.read_exact_at(offset, available)
    }

    fn read_exact_at(&mut self, offset: u64, count: usize) -> Result<Vec<u8>> {
        self.inner.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; count];
        self.inner.read_exact(&mut buffer).map_err(|e| {
            // The reader shrank after its length was measured.
            if e.kind() == io::ErrorKind::UnexpectedEof {
                self.truncated(offset, count as u64)
            } else {
                Error::Io(e)
            }
        })?;

        Ok(buffer)
    }

    fn truncated(&self, offset: u64, needed: u64) -> Error {
        Error::TruncatedRead {
            offset,
            needed,
            available: self.len.saturating_sub(offset),
        }
    }
}
