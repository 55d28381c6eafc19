//! # Tidy Table Writers
//!
//! Sinks that receive tidy rows one at a time, as the parser produces them,
//! and persist them. Every sink fixes its column set up front: the nine core
//! columns followed by the supplementary metadata columns in load order.
//!
//! - [`CsvTidyWriter`] writes the comma-separated tidy table row by row.
//! - [`ParquetTidyWriter`] buffers up to `batch_size` rows and flushes them as
//!   Arrow record batches into a ZSTD-compressed Parquet file whose footer
//!   records the instrument, volume and source file.
//! - [`TableSink`] collects rows into an in-memory [`TidyTable`].

mod config;
mod csv_writer;
mod error;
mod parquet_writer;
mod stats;


pub use config::{CompressionType, OutputFormat, WriterConfig, DEFAULT_ZSTD_LEVEL};
pub use csv_writer::CsvTidyWriter;
pub use error::WriterError;
pub use parquet_writer::ParquetTidyWriter;
pub use stats::WriterStats;

use crate::table::{TidyRow, TidyTable};

/// Destination for a stream of tidy rows
pub trait TidySink {
    /// Append one row
    fn write_row(&mut self, row: TidyRow) -> Result<(), WriterError>;

    /// Rows accepted so far
    fn rows_written(&self) -> usize;

    /// Flush buffered rows and finalize the output
    fn finish(&mut self) -> Result<WriterStats, WriterError>;
}

/// Sink that materializes rows into a [`TidyTable`]
#[derive(Debug, Default)]
pub struct TableSink {
    table: TidyTable,
}

impl TableSink {
    /// Create a sink for a table with the given metadata columns
    pub fn new(extra_columns: Vec<String>) -> Self {
        Self {
            table: TidyTable::new(extra_columns),
        }
    }

    /// The collected table
    pub fn into_table(self) -> TidyTable {
        self.table
    }
}

impl TidySink for TableSink {
    fn write_row(&mut self, row: TidyRow) -> Result<(), WriterError> {
        self.table.push(row);
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.table.len()
    }

    fn finish(&mut self) -> Result<WriterStats, WriterError> {
        Ok(WriterStats {
            rows_written: self.table.len(),
            ..WriterStats::default()
        })
    }
}
