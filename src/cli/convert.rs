use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use tidyplate::converter::{default_output_path, ConversionConfig, ConversionStats, TidyConverter};
use tidyplate::writer::{OutputFormat, WriterConfig};

use super::config::Config;
use super::CompressionArg;

/// Command-line options for `convert`, before merging with the config file
pub struct ConvertOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub volume: Option<f64>,
    pub supplementary: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub config: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub compression: Option<CompressionArg>,
    pub compression_level: Option<i32>,
    pub row_group_size: Option<usize>,
}

/// Convert a plate-reader export to a tidy table
pub fn run(opts: ConvertOptions) -> Result<()> {
    if !opts.input.exists() {
        anyhow::bail!("Input file does not exist: {}", opts.input.display());
    }

    let file_config = Config::load_optional(opts.config.as_deref())?.conversion;

    // Flag, then output extension, then config file, then CSV
    let format = opts
        .format
        .or_else(|| opts.output.as_deref().and_then(OutputFormat::from_path))
        .or(file_config.format)
        .unwrap_or_default();
    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&opts.input, format));

    let mut writer = WriterConfig::for_format(format);
    let codec = opts.compression.or(file_config.compression);
    let level = opts.compression_level.or(file_config.compression_level);
    if codec.is_some() || level.is_some() {
        writer.compression = codec.unwrap_or(CompressionArg::Zstd).with_level(level);
    }
    if let Some(size) = opts.row_group_size.or(file_config.row_group_size) {
        writer.row_group_size = size;
    }

    let config = ConversionConfig {
        volume_ul: opts.volume.or(file_config.volume_ul),
        supplementary_path: opts.supplementary.clone().or(file_config.supplementary),
        writer,
    };

    info!("tidyplate - plate-reader export to tidy table");
    info!("=============================================");
    info!("Input:  {}", opts.input.display());
    info!("Output: {}", output.display());
    info!("Format: {}", format);
    if let Some(path) = &config.supplementary_path {
        info!("Supplementary metadata: {}", path.display());
    }

    let converter = TidyConverter::with_config(config);
    let stats = converter
        .convert(&opts.input, &output)
        .with_context(|| format!("Failed to convert {}", opts.input.display()))?;

    print_summary(&stats, &output);

    if let Some(report) = &opts.report {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialize report")?;
        std::fs::write(report, json)
            .with_context(|| format!("Failed to write report: {}", report.display()))?;
        info!("Report written to {}", report.display());
    }

    Ok(())
}

fn print_summary(stats: &ConversionStats, output: &Path) {
    info!("Conversion complete!");
    info!(
        "  Instrument: {}",
        stats
            .instrument
            .map(|i| i.code().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    info!("  Volume: {} uL", stats.volume_ul);
    info!("  Blocks read: {}", stats.blocks_read);
    info!("  Rows written: {}", stats.rows_written);
    if stats.rows_dropped > 0 {
        info!("  Rows dropped (no metadata): {}", stats.rows_dropped);
    }
    info!("  {}", stats.writer);

    let file_size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    info!(
        "  Output file size: {} bytes ({:.2} MB)",
        file_size,
        file_size as f64 / 1024.0 / 1024.0
    );

    if !stats.diagnostics.is_empty() {
        eprint!("{}", stats.diagnostics.format_colored());
    }

    println!("{}", output.display());
}
