//! Plate-reader export to tidy table converter
//!
//! Ties the streaming parser to a tidy sink: supplementary metadata is loaded
//! first (its columns fix the output header), the export header is scanned
//! (its instrument goes into the Parquet footer) and rows are then pumped one
//! at a time from the parser into the writer.

mod pipeline;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::biotek::ParseError;
use crate::calibration::PlateReader;
use crate::diagnostics::Diagnostics;
use crate::metadata::MetadataError;
use crate::writer::{OutputFormat, WriterConfig, WriterError, WriterStats};

pub use pipeline::default_output_path;

/// Errors that can occur during conversion
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Error parsing the plate-reader export
    #[error("Export parsing error: {0}")]
    ParseError(#[from] ParseError),

    /// Error loading the supplementary metadata file
    #[error("Metadata error: {0}")]
    MetadataError(#[from] MetadataError),

    /// Error writing the tidy table
    #[error("Writer error: {0}")]
    WriterError(#[from] WriterError),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reaction volume must be a positive number of microliters
    #[error("Invalid reaction volume: {0} uL")]
    InvalidVolume(f64),
}

/// Configuration for a conversion
#[derive(Debug, Clone, Default)]
pub struct ConversionConfig {
    /// Reaction volume in microliters; `None` assumes 10 uL with a warning
    pub volume_ul: Option<f64>,

    /// Optional well-to-metadata CSV joined onto every row
    pub supplementary_path: Option<PathBuf>,

    /// Output writer configuration
    pub writer: WriterConfig,
}

impl ConversionConfig {
    /// Configuration writing Parquet instead of CSV
    pub fn parquet() -> Self {
        Self {
            writer: WriterConfig::for_format(OutputFormat::Parquet),
            ..Self::default()
        }
    }

    /// Set the reaction volume
    pub fn with_volume(mut self, volume_ul: f64) -> Self {
        self.volume_ul = Some(volume_ul);
        self
    }

    /// Set the supplementary metadata file
    pub fn with_supplementary<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.supplementary_path = Some(path.as_ref().to_path_buf());
        self
    }
}

/// Statistics from a conversion
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Source export file, when converting from a path
    pub source_file: Option<String>,
    /// Resolved plate reader, `None` when the serial was unknown or absent
    pub instrument: Option<PlateReader>,
    /// Reaction volume used for molar conversion
    pub volume_ul: f64,
    /// Data blocks read
    pub blocks_read: usize,
    /// Tidy rows written
    pub rows_written: usize,
    /// Readings dropped for lack of supplementary metadata
    pub rows_dropped: usize,
    /// Writer statistics
    pub writer: WriterStats,
    /// Every warning raised during the conversion, in order
    pub diagnostics: Diagnostics,
}

/// Converter from plate-reader exports to tidy tables
pub struct TidyConverter {
    config: ConversionConfig,
}

impl TidyConverter {
    /// Create a new converter with default configuration
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
        }
    }

    /// Create a new converter with custom configuration
    pub fn with_config(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }
}

impl Default for TidyConverter {
    fn default() -> Self {
        Self::new()
    }
}
