use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tidyplate::table::Gain;
use tidyplate::transforms::{TimeUnit, DEFAULT_ENDPOINT_WINDOW, DEFAULT_NORM_CHANNEL};
use tidyplate::writer::{CompressionType, OutputFormat, DEFAULT_ZSTD_LEVEL};

mod calibration;
mod config;
mod convert;
mod transform;

/// tidyplate - Tidy tables from plate-reader exports
#[derive(Parser)]
#[command(name = "tidyplate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Tidy output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// Comma-separated tidy table
    Csv,
    /// ZSTD-compressed Parquet
    Parquet,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Parquet => OutputFormat::Parquet,
        }
    }
}

/// Parquet compression codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionArg {
    /// ZSTD, tuned by the compression level
    Zstd,
    /// Snappy
    Snappy,
    /// Uncompressed pages
    None,
}

impl CompressionArg {
    /// Writer compression; the level only applies to ZSTD
    pub fn with_level(self, level: Option<i32>) -> CompressionType {
        match self {
            CompressionArg::Zstd => CompressionType::Zstd(level.unwrap_or(DEFAULT_ZSTD_LEVEL)),
            CompressionArg::Snappy => CompressionType::Snappy,
            CompressionArg::None => CompressionType::Uncompressed,
        }
    }
}

/// How window bounds are read.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum UnitArg {
    /// Bounds on Time (sec)
    #[default]
    Seconds,
    /// Bounds on Time (hr)
    Hours,
    /// Bounds on the time-point rank, starting at 0
    Index,
}

impl From<UnitArg> for TimeUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Seconds => TimeUnit::Seconds,
            UnitArg::Hours => TimeUnit::Hours,
            UnitArg::Index => TimeUnit::Index,
        }
    }
}

/// Arguments shared by every transform command.
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Input tidy CSV
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output CSV (defaults to <input stem>_<command>.csv)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Extra grouping column beyond Channel, Gain and Well (repeatable)
    #[arg(short = 'g', long = "group-by", value_name = "COLUMN")]
    pub group_by: Vec<String>,

    /// Load analysis settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl TableArgs {
    /// Output path, derived from the input when not given
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, suffix))
    }
}

/// `<dir>/<stem>_<suffix>.csv` next to `input`
fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{}_{}.csv", stem, suffix))
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a plate-reader export to a tidy table
    Convert {
        /// Input export CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output tidy table (defaults to <input stem>_tidy.<format>)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Reaction volume in microliters (assumes 10 uL when omitted)
        #[arg(long)]
        volume: Option<f64>,

        /// Supplementary per-well metadata CSV
        #[arg(short = 's', long, value_name = "FILE")]
        supplementary: Option<PathBuf>,

        /// Output format (guessed from the output extension when omitted)
        #[arg(short = 'f', long, value_enum)]
        format: Option<FormatArg>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write conversion statistics and warnings as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Parquet compression codec (default: zstd)
        #[arg(long, value_enum)]
        compression: Option<CompressionArg>,

        // === Advanced tuning flags (hidden from --help) ===
        /// Compression level for ZSTD (1-22, default: 3)
        #[arg(short = 'c', long, hide = true)]
        compression_level: Option<i32>,

        /// Row group size (rows per Parquet row group)
        #[arg(short = 'r', long, hide = true)]
        row_group_size: Option<usize>,
    },

    /// Reshape to one row per (well, time) with one column per channel
    Trajectories {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Subtract the mean of control wells from every series
    Background {
        #[command(flatten)]
        table: TableArgs,

        /// Control well id (repeatable)
        #[arg(short = 'w', long = "control", value_name = "WELL", required = true)]
        controls: Vec<String>,
    },

    /// Average each series over a time window
    Window {
        #[command(flatten)]
        table: TableArgs,

        /// Window start (inclusive)
        #[arg(long)]
        start: f64,

        /// Window end (inclusive)
        #[arg(long)]
        end: f64,

        /// Unit of the window bounds
        #[arg(short = 'u', long, default_value = "seconds", value_enum)]
        unit: UnitArg,
    },

    /// Average the last time points of each series
    Endpoint {
        #[command(flatten)]
        table: TableArgs,

        /// Number of trailing time points to average
        #[arg(short = 'n', long, default_value_t = DEFAULT_ENDPOINT_WINDOW)]
        window_size: usize,
    },

    /// Add a smoothing-spline fit of a column
    Spline {
        #[command(flatten)]
        table: TableArgs,

        /// Column to fit
        #[arg(long, default_value = "Measurement")]
        column: String,

        /// Smoothing budget (defaults to the number of points per series)
        #[arg(long)]
        smoothing: Option<f64>,
    },

    /// Add the time derivative of a smoothing-spline fit
    Derivative {
        #[command(flatten)]
        table: TableArgs,

        /// Column to differentiate
        #[arg(long, default_value = "Measurement")]
        column: String,

        /// Smoothing budget (defaults to the number of points per series)
        #[arg(long)]
        smoothing: Option<f64>,
    },

    /// Divide every series by a reference channel of the same well
    Normalize {
        #[command(flatten)]
        table: TableArgs,

        /// Normalization channel
        #[arg(long, default_value = DEFAULT_NORM_CHANNEL)]
        channel: String,

        /// Gain of the normalization channel (-1 for absorbance)
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        gain: Gain,
    },

    /// Print the fluorophore calibration table
    Calibration,
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            volume,
            supplementary,
            format,
            config,
            report,
            compression,
            compression_level,
            row_group_size,
        } => convert::run(convert::ConvertOptions {
            input,
            output,
            volume,
            supplementary,
            format: format.map(OutputFormat::from),
            config,
            report,
            compression,
            compression_level,
            row_group_size,
        }),
        Commands::Trajectories { table } => transform::trajectories(table),
        Commands::Background { table, controls } => transform::background(table, controls),
        Commands::Window {
            table,
            start,
            end,
            unit,
        } => transform::window(table, start, end, TimeUnit::from(unit)),
        Commands::Endpoint { table, window_size } => transform::endpoint(table, window_size),
        Commands::Spline {
            table,
            column,
            smoothing,
        } => transform::spline(table, column, smoothing),
        Commands::Derivative {
            table,
            column,
            smoothing,
        } => transform::derivative(table, column, smoothing),
        Commands::Normalize {
            table,
            channel,
            gain,
        } => transform::normalize(table, channel, gain),
        Commands::Calibration => calibration::run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_normalize_gain() {
        let cli = Cli::try_parse_from(["tidyplate", "normalize", "in.csv", "--gain", "-1"]).unwrap();
        match cli.command {
            Commands::Normalize { channel, gain, .. } => {
                assert_eq!(channel, "OD600");
                assert_eq!(gain, Gain::ABSORBANCE);
            }
            _ => panic!("expected normalize"),
        }
    }

    #[test]
    fn test_background_requires_control() {
        assert!(Cli::try_parse_from(["tidyplate", "background", "in.csv"]).is_err());
        let cli = Cli::try_parse_from([
            "tidyplate", "-vv", "background", "in.csv", "-w", "H11", "-w", "H12", "-g", "Plate",
        ])
        .unwrap();
        assert_eq!(cli.verbosity(), 2);
        match cli.command {
            Commands::Background { table, controls } => {
                assert_eq!(controls, vec!["H11", "H12"]);
                assert_eq!(table.group_by, vec!["Plate"]);
                assert_eq!(table.output_path("background"), PathBuf::from("in_background.csv"));
            }
            _ => panic!("expected background"),
        }
    }

    #[test]
    fn test_parse_compression() {
        let cli = Cli::try_parse_from([
            "tidyplate", "convert", "in.csv", "out.parquet", "--compression", "snappy", "-c", "9",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                compression,
                compression_level,
                ..
            } => {
                assert_eq!(compression, Some(CompressionArg::Snappy));
                let codec = compression.map(|c| c.with_level(compression_level));
                assert_eq!(codec, Some(CompressionType::Snappy));
            }
            _ => panic!("expected convert"),
        }

        assert_eq!(CompressionArg::Zstd.with_level(Some(9)), CompressionType::Zstd(9));
        assert_eq!(CompressionArg::Zstd.with_level(None), CompressionType::default());
        assert_eq!(CompressionArg::None.with_level(Some(9)), CompressionType::Uncompressed);
    }

    #[test]
    fn test_derived_path_keeps_directory() {
        assert_eq!(
            derived_path(Path::new("runs/plate1_tidy.csv"), "endpoint"),
            PathBuf::from("runs/plate1_tidy_endpoint.csv")
        );
    }
}
