//! CSV output writer: one row per bid

use crate::{Bid, Category};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{BidsWriter, OutputError, OutputResult, OutputWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// CSV record for one bid, tagged with its category
#[derive(Debug, Serialize)]
struct BidRecord<'a> {
    category_name: &'a str,
    category_id: &'a str,
    id: &'a str,
    bid_number: &'a str,
    quantity: Option<u64>,
    end_date: Option<String>,
    department: Option<&'a str>,
}

impl<'a> BidRecord<'a> {
    fn new(category: &'a Category, bid: &'a Bid) -> Self {
        Self {
            category_name: &category.name,
            category_id: &category.identifier,
            id: &bid.id,
            bid_number: &bid.bid_number,
            quantity: bid.quantity,
            end_date: bid.end_date.map(|date| date.to_rfc3339()),
            department: bid.department.as_deref(),
        }
    }
}

/// CSV writer for bids
pub struct CsvBidsWriter {
    writer: Writer<BufWriter<File>>,
    bids_written: u64,
}

impl CsvBidsWriter {
    /// Create a new CSV bids writer
    ///
    /// # Arguments
    /// * `path` - Output file path; missing parent directories are created
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new CSV bids writer with custom buffer size
    pub fn new_with_buffer_size<P: AsRef<Path>>(
        path: P,
        buffer_size: usize,
    ) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;

        let buf_writer = BufWriter::with_capacity(buffer_size, file);

        Ok(Self {
            writer: Writer::from_writer(buf_writer),
            bids_written: 0,
        })
    }

    /// Get number of bids written so far
    pub fn bids_written(&self) -> u64 {
        self.bids_written
    }
}

impl BidsWriter for CsvBidsWriter {
    fn write_bid(&mut self, category: &Category, bid: &Bid) -> OutputResult<()> {
        self.writer
            .serialize(BidRecord::new(category, bid))
            .map_err(|e| OutputError::CsvError(format!("Failed to write bid: {}", e)))?;

        self.bids_written += 1;
        Ok(())
    }
}

impl OutputWriter for CsvBidsWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn close(mut self) -> OutputResult<()> {
        debug!("Closing CSV writer: {} total bids written", self.bids_written);

        self.flush()?;

        let buf_writer = self.writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get inner writer: {}", e))
        })?;

        let file = buf_writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get file handle: {}", e))
        })?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

        info!("CSV writer closed successfully: {} bids written", self.bids_written);
        Ok(())
    }
}
