use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, Int32Builder, StringBuilder};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::{TidySink, WriterConfig, WriterError, WriterStats};
use crate::schema::create_tidy_schema_arc;
use crate::table::{CellValue, TidyRow};

/// Streaming writer for tidy Parquet files.
///
/// Rows are buffered and flushed as one record batch every `batch_size` rows,
/// so memory stays bounded by the batch size.
pub struct ParquetTidyWriter<W: Write + Send> {
    writer: ArrowWriter<W>,
    schema: Arc<Schema>,
    extra_columns: Vec<String>,
    buffer: Vec<TidyRow>,
    batch_size: usize,
    rows_written: usize,
    batches_written: usize,
}

impl ParquetTidyWriter<File> {
    /// Create a writer to a file path
    pub fn new_file<P: AsRef<Path>>(
        path: P,
        extra_columns: Vec<String>,
        footer: &HashMap<String, String>,
        config: &WriterConfig,
    ) -> Result<Self, WriterError> {
        let file = File::create(path)?;
        Self::new(file, extra_columns, footer, config)
    }
}

impl<W: Write + Send> ParquetTidyWriter<W> {
    /// Create a writer to any Write implementation.
    ///
    /// `footer` is stored as key-value metadata in the Parquet footer.
    pub fn new(
        writer: W,
        extra_columns: Vec<String>,
        footer: &HashMap<String, String>,
        config: &WriterConfig,
    ) -> Result<Self, WriterError> {
        if config.batch_size == 0 {
            return Err(WriterError::InvalidData("batch_size must be positive".to_string()));
        }
        let schema = create_tidy_schema_arc(&extra_columns);
        let props = config.to_writer_properties(footer);
        let arrow_writer = ArrowWriter::try_new(writer, schema.clone(), Some(props))?;

        Ok(Self {
            writer: arrow_writer,
            schema,
            extra_columns,
            buffer: Vec::with_capacity(config.batch_size),
            batch_size: config.batch_size,
            rows_written: 0,
            batches_written: 0,
        })
    }

    /// Flush buffered rows as one record batch
    fn flush_batch(&mut self) -> Result<(), WriterError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let n = self.buffer.len();

        let mut channel = StringBuilder::with_capacity(n, n * 8);
        let mut gain = StringBuilder::with_capacity(n, n * 4);
        let mut time_sec = Float64Builder::with_capacity(n);
        let mut time_hr = Float64Builder::with_capacity(n);
        let mut well = StringBuilder::with_capacity(n, n * 3);
        let mut measurement = Float64Builder::with_capacity(n);
        let mut units = StringBuilder::with_capacity(n, n * 4);
        let mut excitation = Int32Builder::with_capacity(n);
        let mut emission = Int32Builder::with_capacity(n);
        let mut extras: Vec<StringBuilder> = self
            .extra_columns
            .iter()
            .map(|_| StringBuilder::with_capacity(n, n * 8))
            .collect();

        for row in &self.buffer {
            channel.append_value(&row.channel);
            gain.append_value(row.gain.to_string());
            time_sec.append_value(row.time_sec);
            time_hr.append_value(row.time_hr);
            well.append_value(&row.well);
            measurement.append_value(row.measurement);
            units.append_value(&row.units);
            excitation.append_value(row.excitation);
            emission.append_value(row.emission);

            for (name, builder) in self.extra_columns.iter().zip(extras.iter_mut()) {
                match row.extra.get(name) {
                    Some(CellValue::Missing) | None => builder.append_null(),
                    Some(value) => builder.append_value(value.to_string()),
                }
            }
        }

        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(channel.finish()),
            Arc::new(gain.finish()),
            Arc::new(time_sec.finish()),
            Arc::new(time_hr.finish()),
            Arc::new(well.finish()),
            Arc::new(measurement.finish()),
            Arc::new(units.finish()),
            Arc::new(excitation.finish()),
            Arc::new(emission.finish()),
        ];
        for mut builder in extras {
            arrays.push(Arc::new(builder.finish()));
        }

        let batch = RecordBatch::try_new(self.schema.clone(), arrays)?;
        self.writer.write(&batch)?;

        log::debug!("Flushed record batch of {} rows", n);
        self.rows_written += n;
        self.batches_written += 1;
        self.buffer.clear();
        Ok(())
    }

    /// Finalize and return the inner writer (for buffer extraction)
    pub fn finish_into_inner(mut self) -> Result<W, WriterError> {
        self.flush_batch()?;
        let writer = self.writer.into_inner()?;
        Ok(writer)
    }
}

impl<W: Write + Send> TidySink for ParquetTidyWriter<W> {
    fn write_row(&mut self, row: TidyRow) -> Result<(), WriterError> {
        self.buffer.push(row);
        if self.buffer.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.rows_written + self.buffer.len()
    }

    fn finish(&mut self) -> Result<WriterStats, WriterError> {
        self.flush_batch()?;
        let file_metadata = self.writer.finish()?;

        log::info!(
            "Wrote {} tidy rows as Parquet in {} row groups",
            self.rows_written,
            file_metadata.row_groups.len()
        );
        Ok(WriterStats {
            rows_written: self.rows_written,
            batches_written: self.batches_written,
            row_groups_written: file_metadata.row_groups.len(),
            file_size_bytes: file_metadata
                .row_groups
                .iter()
                .map(|rg| rg.total_byte_size as u64)
                .sum(),
        })
    }
}
