//! Report sinks for the CLI.

use std::borrow::Cow;
use std::error::Error;
use std::io::{self, Write};

use neva::bpk::{Record, ScanReport};

/// Column header of the table report.
pub const CSV_HEADER: &str =
    "Folder name,Folder address,Number of files,File name,Is file compressed?,File size,File address";

/// Streams walker records as comma-separated rows.
pub struct CsvReport<W: Write> {
    out: W,
}

impl<W: Write> CsvReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", CSV_HEADER)
    }

    /// Write one row. Empty folders leave the four file columns blank.
    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        let folder = &record.folder;
        write!(
            self.out,
            "{},{:#x},{},",
            field(&folder.name),
            folder.file_table_address,
            folder.file_count
        )?;

        match &record.file {
            Some(file) => writeln!(
                self.out,
                "{},{},{},{:#x}",
                field(&file.name),
                if file.is_compressed() { "Yes" } else { "No" },
                file.stored_size,
                file.data_address
            ),
            None => writeln!(self.out, ",,,"),
        }
    }

    /// Mark the point where the walk stopped, with the full cause chain.
    pub fn write_error(&mut self, error: &dyn Error) -> io::Result<()> {
        write!(self.out, "# error: {}", error)?;
        let mut source = error.source();
        while let Some(cause) = source {
            write!(self.out, ": {}", cause)?;
            source = cause.source();
        }
        writeln!(self.out)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Quote a field when it would otherwise break the row.
fn field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Write a chunk scan as a pretty-printed JSON document.
pub fn write_scan_report<W: Write>(mut out: W, report: &ScanReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)
}
