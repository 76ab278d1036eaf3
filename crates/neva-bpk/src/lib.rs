//! BPK0 archive reader.
//!
//! BPK0 is a game archive container that bundles named folders of files,
//! some of them compressed, in a single file:
//!
//! - A header with the `BPK0` signature and a pointer to the folder table
//! - A folder table at the end of the file, one variable-length record per folder
//! - One file table per folder, one 16-byte record per file
//! - Shift-JIS file names in 64-byte slots
//!
//! [`ArchiveWalker`] reads that structure as a stream of [`Record`]s.
//! [`ChunkScanner`] gives the lower-level view of the same file as a
//! sequence of `BDL0` data chunks.
//!
//! # Example
//!
//! ```no_run
//! use neva_bpk::ArchiveWalker;
//!
//! let walker = ArchiveWalker::open("neva.pkg")?;
//! println!("folder table at {:#x}", walker.folder_table_address());
//!
//! for record in walker {
//!     let record = record?;
//!     if let Some(file) = &record.file {
//!         println!("{}\\{} ({} bytes)", record.folder.name, file.name, file.full_size);
//!     }
//! }
//! # Ok::<(), neva_bpk::Error>(())
//! ```

mod entry;
mod error;
mod layout;
mod scan;
mod source;
mod walker;

#[cfg(test)]
mod fixture;

pub use entry::{FileEntry, Folder, Header, Record};
pub use error::{Error, Result};
pub use layout::{Layout, ScanLayout};
pub use scan::{Chunk, ChunkScanner, Footer, ScanHeader, ScanReport};
pub use source::ArchiveSource;
pub use walker::ArchiveWalker;
