//! Error types for the BPK crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading BPK0 archives.
#[derive(Debug, Error)]
pub enum Error {
    /// The archive file could not be opened.
    #[error("cannot open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error(transparent)]
    Common(#[from] neva_common::Error),

    /// The file does not start with the archive signature.
    #[error("bad signature: expected {expected:?}, got {actual:?}")]
    SignatureMismatch { expected: Vec<u8>, actual: Vec<u8> },

    /// A read ran past the end of the archive.
    #[error(
        "truncated read at {offset:#x}: needed {needed} bytes but only {available} available"
    )]
    TruncatedRead {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// A folder record declares a length shorter than its fixed prefix.
    #[error("folder record at {address:#x} has length {length}, minimum is {minimum}")]
    InvalidRecordLength {
        address: u64,
        length: u64,
        minimum: u64,
    },
}

impl Error {
    /// Whether the error means the input is not a BPK0 archive at all.
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, Error::SignatureMismatch { .. })
    }

    /// Whether the error happened before any byte of the archive was read.
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Error::Open { .. })
    }
}

/// Result type for BPK operations.
pub type Result<T> = std::result::Result<T, Error>;
