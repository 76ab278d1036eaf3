//! Neva CLI - Command-line tool for BPK0 game archive inspection.
//!
//! This is the main entry point for the Neva command-line application.

mod report;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use neva::prelude::*;

use crate::report::{write_scan_report, CsvReport};

const EXIT_USAGE: u8 = 1;
const EXIT_CANNOT_OPEN: u8 = 2;
const EXIT_INVALID_FORMAT: u8 = 3;
const EXIT_CORRUPT: u8 = 4;

/// Neva - BPK0 game archive inspection tool
#[derive(Parser)]
#[command(name = "neva")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the BPK0 archive
    archive: PathBuf,

    /// Report to produce
    #[arg(short, long, value_enum, default_value_t = Mode::Table)]
    mode: Mode,

    /// Write the report to a file instead of standard output
    #[arg(short, long, env = "NEVA_OUTPUT")]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Walk the folder and file tables, one CSV row per file
    Table,
    /// Scan for raw data chunks, as a JSON document
    Scan,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return usage_error(e),
    };

    let result = match cli.mode {
        Mode::Table => cmd_table(&cli.archive, cli.output.as_deref()),
        Mode::Scan => cmd_scan(&cli.archive, cli.output.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn usage_error(e: clap::Error) -> ExitCode {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = e.print();
            ExitCode::SUCCESS
        }
        ErrorKind::MissingRequiredArgument => {
            println!("{}", Cli::command().render_usage());
            ExitCode::from(EXIT_USAGE)
        }
        _ => {
            let _ = e.print();
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<neva::bpk::Error>() {
        Some(e) if e.is_open_failure() => EXIT_CANNOT_OPEN,
        Some(e) if e.is_invalid_format() => EXIT_INVALID_FORMAT,
        _ => EXIT_CORRUPT,
    }
}

fn cmd_table(archive: &Path, output: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let mut walker = ArchiveWalker::open(archive).context("Failed to open BPK0 archive")?;

    info!(
        "{}: folder table at {:#x} ({} bytes)",
        archive.display(),
        walker.folder_table_address(),
        walker.folder_table_size()
    );

    let mut report = CsvReport::new(open_output(output)?);
    report.write_header()?;

    // Standard output carries the report itself, so only draw when writing to a file.
    let pb = if output.is_some() {
        let pb = ProgressBar::new(walker.folder_table_size());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut rows = 0;
    while let Some(record) = walker.next() {
        match record {
            Ok(record) => {
                report.write_record(&record)?;
                rows += 1;
                pb.set_position(walker.consumed());
            }
            Err(e) => {
                report.write_error(&e)?;
                report.flush()?;
                pb.abandon();
                return Err(anyhow::Error::new(e)
                    .context(format!("Archive walk stopped after {} rows", rows)));
            }
        }
    }

    report.flush()?;
    pb.finish_and_clear();
    info!("Reported {} rows in {:?}", rows, start.elapsed());

    Ok(())
}

fn cmd_scan(archive: &Path, output: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let report = ChunkScanner::open(archive)
        .context("Failed to open BPK0 archive")?
        .scan()
        .context("Failed to scan BPK0 archive")?;

    info!(
        "{}: {} chunks in {:?}",
        archive.display(),
        report.chunks.len(),
        start.elapsed()
    );

    let mut out = open_output(output)?;
    write_scan_report(&mut out, &report)?;
    out.flush()?;

    Ok(())
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
