use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use parquet::schema::types::ColumnPath;
use serde::{Deserialize, Serialize};

use crate::schema;

/// Output table format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated text
    #[default]
    Csv,
    /// Columnar Parquet file
    Parquet,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(OutputFormat::Csv),
            "parquet" | "pq" => Some(OutputFormat::Parquet),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(format!("Unknown output format '{}' (expected csv or parquet)", other)),
        }
    }
}

/// ZSTD level used when none is configured
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Compression options for Parquet output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// ZSTD at the given level
    Zstd(i32),
    /// Snappy compression
    Snappy,
    /// No compression
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(DEFAULT_ZSTD_LEVEL)
    }
}

/// Configuration for tidy table writers
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Output format
    pub format: OutputFormat,

    /// Parquet compression
    pub compression: CompressionType,

    /// Maximum rows per Parquet row group
    pub row_group_size: usize,

    /// Rows buffered before a record batch is flushed
    pub batch_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write column statistics
    pub write_statistics: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Csv,
            compression: CompressionType::default(),
            // A full 384-well plate with a few hundred time points per channel
            row_group_size: 100_000,
            batch_size: 8_192,
            data_page_size: 1024 * 1024,
            write_statistics: true,
        }
    }
}

impl WriterConfig {
    /// Default configuration for the given format
    pub fn for_format(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Create Parquet writer properties from this configuration
    pub(super) fn to_writer_properties(&self, metadata: &HashMap<String, String>) -> WriterProperties {
        let compression = match self.compression {
            CompressionType::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Snappy => Compression::SNAPPY,
            CompressionType::Uncompressed => Compression::UNCOMPRESSED,
        };

        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(compression)
            .set_data_page_size_limit(self.data_page_size)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size);

        // Low-cardinality columns repeat across every time point of a series
        for col in [schema::CHANNEL, schema::GAIN, schema::WELL, schema::UNITS] {
            builder = builder.set_column_dictionary_enabled(ColumnPath::new(vec![col.to_string()]), true);
        }
        builder = builder.set_column_dictionary_enabled(
            ColumnPath::new(vec![schema::MEASUREMENT.to_string()]),
            false,
        );

        let mut kv_metadata: Vec<KeyValue> = metadata
            .iter()
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: Some(v.clone()),
            })
            .collect();
        kv_metadata.sort_by(|a, b| a.key.cmp(&b.key));

        builder = builder.set_key_value_metadata(Some(kv_metadata));

        builder.build()
    }
}
