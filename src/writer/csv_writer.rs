use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{TidySink, WriterError, WriterStats};
use crate::schema;
use crate::table::TidyRow;

/// Streaming writer for the comma-separated tidy table
pub struct CsvTidyWriter<W: Write> {
    writer: csv::Writer<W>,
    extra_columns: Vec<String>,
    rows_written: usize,
}

impl CsvTidyWriter<BufWriter<File>> {
    /// Create a writer to a file path
    pub fn new_file<P: AsRef<Path>>(path: P, extra_columns: Vec<String>) -> Result<Self, WriterError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), extra_columns)
    }
}

impl<W: Write> CsvTidyWriter<W> {
    /// Create a writer and emit the header line
    pub fn new(writer: W, extra_columns: Vec<String>) -> Result<Self, WriterError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

        let header = schema::CORE_COLUMNS
            .iter()
            .copied()
            .chain(extra_columns.iter().map(|c| c.as_str()));
        writer.write_record(header)?;

        Ok(Self {
            writer,
            extra_columns,
            rows_written: 0,
        })
    }

    /// Finalize and return the inner writer
    pub fn into_inner(mut self) -> Result<W, WriterError> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| WriterError::IoError(e.into_error()))
    }
}

impl<W: Write> TidySink for CsvTidyWriter<W> {
    fn write_row(&mut self, row: TidyRow) -> Result<(), WriterError> {
        self.writer.write_record(row.to_record(&self.extra_columns))?;
        self.rows_written += 1;
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn finish(&mut self) -> Result<WriterStats, WriterError> {
        self.writer.flush()?;
        log::info!("Wrote {} tidy rows as CSV", self.rows_written);
        Ok(WriterStats {
            rows_written: self.rows_written,
            ..WriterStats::default()
        })
    }
}
