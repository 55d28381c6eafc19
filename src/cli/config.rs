//! TOML configuration file support.
//!
//! Settings that repeat across runs of one experiment can live in a config
//! file instead of on the command line; flags always win over file values.
//!
//! ```toml
//! # tidyplate.toml
//! [conversion]
//! volume_ul = 20.0
//! supplementary = "plate_map.csv"
//! format = "parquet"
//! compression = "zstd"
//! compression_level = 9
//! row_group_size = 200000
//!
//! [analysis]
//! group_by = ["Plate"]
//! smoothing = 5.0
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tidyplate::writer::OutputFormat;

use super::CompressionArg;

/// Root configuration structure for tidyplate.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Conversion-specific settings.
    #[serde(default)]
    pub conversion: ConversionSection,

    /// Settings shared by the transform commands.
    #[serde(default)]
    pub analysis: AnalysisSection,
}

/// Configuration for the convert command.
#[derive(Debug, Default, Deserialize)]
pub struct ConversionSection {
    /// Reaction volume in microliters.
    pub volume_ul: Option<f64>,

    /// Supplementary well metadata CSV.
    pub supplementary: Option<PathBuf>,

    /// Output format (`csv` or `parquet`).
    pub format: Option<OutputFormat>,

    /// Parquet compression codec (`zstd`, `snappy` or `none`).
    pub compression: Option<CompressionArg>,

    /// ZSTD compression level for Parquet output.
    pub compression_level: Option<i32>,

    /// Rows per Parquet row group.
    pub row_group_size: Option<usize>,
}

/// Configuration for the transform commands.
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisSection {
    /// Extra grouping columns beyond (Channel, Gain, Well).
    #[serde(default)]
    pub group_by: Vec<String>,

    /// Spline smoothing budget.
    pub smoothing: Option<f64>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load the file when one was given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
