//! Report and document output
//!
//! A report goes to JSON (the wire format of the report itself) or to CSV
//! (one row per bid), chosen by the output file's extension.

use crate::downloader::Report;
use crate::fetcher::document::Document;
use crate::{Bid, Category, CategoryResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod csv;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing bids
pub trait BidsWriter: OutputWriter {
    /// Write a single bid of `category`
    fn write_bid(&mut self, category: &Category, bid: &Bid) -> OutputResult<()>;

    /// Write every bid of a category result
    fn write_category(&mut self, result: &CategoryResult) -> OutputResult<()> {
        for bid in &result.bids {
            self.write_bid(&result.category, bid)?;
        }
        Ok(())
    }
}

/// Report file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// The report as JSON
    Json,
    /// One CSV row per bid
    Csv,
}

impl ReportFormat {
    /// `.csv` (any case) selects CSV, anything else JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ReportFormat::Csv,
            _ => ReportFormat::Json,
        }
    }
}

/// Write `report` to `path` in the format its extension selects
pub fn write_report(report: &Report, path: &Path) -> OutputResult<ReportFormat> {
    let format = ReportFormat::from_path(path);
    match format {
        ReportFormat::Json => write_json_report(report, path)?,
        ReportFormat::Csv => write_csv_report(report, path)?,
    }
    Ok(format)
}

/// Write `report` as pretty-printed JSON
pub fn write_json_report(report: &Report, path: &Path) -> OutputResult<()> {
    let mut writer = BufWriter::new(create_file(path)?);

    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| OutputError::SerializationError(format!("Failed to encode report: {e}")))?;
    writer
        .flush()
        .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))?;

    info!(path = %path.display(), "JSON report written");
    Ok(())
}

/// Write every bid of `report` as CSV rows
pub fn write_csv_report(report: &Report, path: &Path) -> OutputResult<()> {
    let mut writer = self::csv::CsvBidsWriter::new(path)?;
    for result in report.categories() {
        writer.write_category(result)?;
    }
    writer.close()
}

/// Save a downloaded document into `dir`, returning the file path
pub fn write_document(document: &Document, dir: &Path) -> OutputResult<PathBuf> {
    let path = dir.join(&document.filename);
    let mut file = create_file(&path)?;
    file.write_all(&document.bytes)
        .map_err(|e| OutputError::IoError(format!("Failed to write document: {e}")))?;

    info!(path = %path.display(), bytes = document.bytes.len(), "Document saved");
    Ok(path)
}

fn create_file(path: &Path) -> OutputResult<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
    }
    File::create(path).map_err(|e| OutputError::IoError(format!("Failed to create file: {e}")))
}
