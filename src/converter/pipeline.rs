use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::info;

use super::{ConversionError, ConversionStats, TidyConverter};
use crate::biotek::{PlateReaderStreamer, DEFAULT_VOLUME_UL};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::metadata::SupplementaryMetadata;
use crate::schema;
use crate::table::TidyTable;
use crate::writer::{CsvTidyWriter, OutputFormat, ParquetTidyWriter, TableSink, TidySink};

/// Default output path: `<input stem>_tidy.<ext>` next to the input
pub fn default_output_path<P: AsRef<Path>>(input: P, format: OutputFormat) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plate".to_string());
    input.with_file_name(format!("{}_tidy.{}", stem, format.extension()))
}

impl TidyConverter {
    /// Resolve the reaction volume, recording a reminder when it was not given
    fn resolve_volume(&self, diagnostics: &mut Diagnostics) -> Result<f64, ConversionError> {
        match self.config.volume_ul {
            Some(v) if v > 0.0 && v.is_finite() => Ok(v),
            Some(v) => Err(ConversionError::InvalidVolume(v)),
            None => {
                diagnostics.push(
                    DiagnosticKind::DefaultVolume,
                    format!(
                        "Reminder: assuming default volume of {} uL; specify a volume if this is wrong",
                        DEFAULT_VOLUME_UL
                    ),
                    DEFAULT_VOLUME_UL.to_string(),
                );
                Ok(DEFAULT_VOLUME_UL)
            }
        }
    }

    fn load_metadata(&self) -> Result<Option<SupplementaryMetadata>, ConversionError> {
        match &self.config.supplementary_path {
            Some(path) => {
                info!("Loading supplementary metadata from {}", path.display());
                Ok(Some(SupplementaryMetadata::load(path)?))
            }
            None => Ok(None),
        }
    }

    fn open_streamer<R: Read>(
        &self,
        reader: R,
        diagnostics: &mut Diagnostics,
    ) -> Result<(PlateReaderStreamer<R>, f64), ConversionError> {
        let volume_ul = self.resolve_volume(diagnostics)?;
        let mut streamer = PlateReaderStreamer::new(reader, volume_ul);
        if let Some(metadata) = self.load_metadata()? {
            streamer = streamer.with_metadata(metadata);
        }
        streamer.read_header()?;
        Ok((streamer, volume_ul))
    }

    /// Convert an export file, writing the tidy table to `output_path`.
    ///
    /// The output format comes from the writer configuration.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<ConversionStats, ConversionError> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!("Converting {} to {}", input_path.display(), output_path.display());

        let file = std::fs::File::open(input_path)?;
        let reader = std::io::BufReader::with_capacity(64 * 1024, file);

        let mut diagnostics = Diagnostics::new();
        let (mut streamer, volume_ul) = self.open_streamer(reader, &mut diagnostics)?;
        let columns = streamer.metadata_columns();

        let source_file = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut sink: Box<dyn TidySink> = match self.config.writer.format {
            OutputFormat::Csv => Box::new(CsvTidyWriter::new_file(output_path, columns)?),
            OutputFormat::Parquet => {
                let mut footer = HashMap::new();
                if let Some(instrument) = streamer.context().instrument {
                    footer.insert(schema::KEY_INSTRUMENT.to_string(), instrument.code().to_string());
                }
                footer.insert(schema::KEY_VOLUME_UL.to_string(), volume_ul.to_string());
                footer.insert(schema::KEY_SOURCE_FILE.to_string(), source_file.clone());
                Box::new(ParquetTidyWriter::new_file(
                    output_path,
                    columns,
                    &footer,
                    &self.config.writer,
                )?)
            }
        };

        pump(&mut streamer, sink.as_mut())?;
        let writer_stats = sink.finish()?;

        let mut stats = finish_stats(streamer, volume_ul, diagnostics);
        stats.source_file = Some(source_file);
        stats.writer = writer_stats;

        info!(
            "Converted {} rows from {} blocks ({} dropped, {} warnings)",
            stats.rows_written,
            stats.blocks_read,
            stats.rows_dropped,
            stats.diagnostics.len()
        );
        Ok(stats)
    }

    /// Parse an export file into an in-memory tidy table
    pub fn convert_to_table<P: AsRef<Path>>(
        &self,
        input_path: P,
    ) -> Result<(TidyTable, ConversionStats), ConversionError> {
        let input_path = input_path.as_ref();
        let file = std::fs::File::open(input_path)?;
        let (table, mut stats) = self.convert_reader(std::io::BufReader::new(file))?;
        stats.source_file = input_path.file_name().map(|n| n.to_string_lossy().into_owned());
        Ok((table, stats))
    }

    /// Parse an export from any reader into an in-memory tidy table
    pub fn convert_reader<R: Read>(&self, reader: R) -> Result<(TidyTable, ConversionStats), ConversionError> {
        let mut diagnostics = Diagnostics::new();
        let (mut streamer, volume_ul) = self.open_streamer(reader, &mut diagnostics)?;

        let mut sink = TableSink::new(streamer.metadata_columns());
        pump(&mut streamer, &mut sink)?;
        let writer_stats = sink.finish()?;

        let mut stats = finish_stats(streamer, volume_ul, diagnostics);
        stats.writer = writer_stats;
        Ok((sink.into_table(), stats))
    }
}

/// Move every row from the parser into the sink
fn pump<R: Read>(streamer: &mut PlateReaderStreamer<R>, sink: &mut dyn TidySink) -> Result<usize, ConversionError> {
    while let Some(row) = streamer.next_row()? {
        sink.write_row(row)?;
    }
    Ok(sink.rows_written())
}

fn finish_stats<R: Read>(
    streamer: PlateReaderStreamer<R>,
    volume_ul: f64,
    mut diagnostics: Diagnostics,
) -> ConversionStats {
    let parse_stats = streamer.stats();
    let instrument = streamer.context().instrument;
    diagnostics.extend(streamer.into_diagnostics());

    ConversionStats {
        source_file: None,
        instrument,
        volume_ul,
        blocks_read: parse_stats.blocks_read,
        rows_written: parse_stats.rows_emitted,
        rows_dropped: parse_stats.rows_dropped,
        writer: Default::default(),
        diagnostics,
    }
}
