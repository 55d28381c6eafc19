//! # tidyplate - Tidy Tables from Plate-Reader Exports
//!
//! `tidyplate` turns the human-oriented CSV exports of BioTek plate readers
//! into tidy, calibrated tables with one row per (channel, gain, time, well)
//! measurement, and runs time-series transforms over those tables.
//!
//! ## Key Features
//!
//! - **Streaming Parser**: The export is read line by line and rows are
//!   written as they are produced, so memory stays bounded by one data block.
//!
//! - **Instrument Settings Recovery**: Excitation, emission and gain are
//!   reconstructed from the procedure header and attached to every reading.
//!
//! - **Calibrated Units**: Fluorescence readings on a known instrument and gain
//!   are converted to micromolar; everything else stays in raw AFU.
//!
//! - **Metadata Join**: An optional per-well CSV (strain, inducer, replicate)
//!   is joined onto every row.
//!
//! - **CSV or Parquet**: Tidy output as plain CSV or ZSTD-compressed Parquet.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tidyplate::converter::{ConversionConfig, TidyConverter};
//!
//! let config = ConversionConfig::default()
//!     .with_volume(10.0)
//!     .with_supplementary("plate_map.csv");
//! let converter = TidyConverter::with_config(config);
//!
//! let stats = converter.convert("export.csv", "export_tidy.csv")?;
//! println!("Wrote {} rows", stats.rows_written);
//! # Ok::<(), tidyplate::converter::ConversionError>(())
//! ```
//!
//! ## Transforms
//!
//! ```rust,no_run
//! use tidyplate::table::{Gain, TidyTable};
//! use tidyplate::transforms::{background_subtract, normalize};
//!
//! let table = TidyTable::read_csv("export_tidy.csv")?;
//! let blanked = background_subtract(&table, &["H12".to_string()], &[])?;
//! let per_od = normalize(&blanked, "OD600", Gain::ABSORBANCE, &[])?;
//! per_od.write_csv("export_per_od.csv")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`biotek`]: streaming export parser
//! - [`calibration`]: instrument lookup and fluorophore calibration factors
//! - [`channel`]: channel-name resolution for fluorescence blocks
//! - [`metadata`]: supplementary per-well metadata
//! - [`table`]: tidy rows and tables, tidy CSV I/O
//! - [`writer`]: streaming CSV and Parquet sinks
//! - [`converter`]: export-to-tidy-table conversion
//! - [`transforms`]: series transforms over tidy tables
//! - [`diagnostics`]: recoverable warnings raised along the way
//!
//! ## Tidy Columns
//!
//! | Column | Type | Description |
//! |--------|------|-------------|
//! | Channel | text | Channel name (e.g. `GFP`, `OD600`) |
//! | Gain | text | Detector gain, `-1` for absorbance, `AutoScale` |
//! | Time (sec) | float | Seconds since the kinetic read started |
//! | Time (hr) | float | Hours since the kinetic read started |
//! | Well | text | Well id (e.g. `A1`) |
//! | Measurement | float | Reading, `inf` on detector overflow |
//! | Units | text | `uM`, `AFU` or `absorbance` |
//! | Excitation (nm) | int | Excitation wavelength |
//! | Emission (nm) | int | Emission wavelength, `-1` when not applicable |

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod biotek;
pub mod calibration;
pub mod channel;
pub mod converter;
pub mod diagnostics;
pub mod metadata;
pub mod schema;
pub mod table;
pub mod transforms;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::biotek::{ParseError, PlateReaderStreamer, RowIterator};
    pub use crate::calibration::{dna_ng_per_ul_to_nm, CalibrationTable, PlateReader};
    pub use crate::converter::{ConversionConfig, ConversionError, ConversionStats, TidyConverter};
    pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
    pub use crate::metadata::SupplementaryMetadata;
    pub use crate::schema::create_tidy_schema;
    pub use crate::table::{CellValue, Gain, TidyRow, TidyTable, TrajectoryTable};
    pub use crate::transforms::{
        background_subtract, endpoint_average, extract_trajectories, normalize,
        smoothed_derivative, spline_fit, window_average, TimeUnit, TransformError,
    };
    pub use crate::writer::{
        CsvTidyWriter, OutputFormat, ParquetTidyWriter, TidySink, WriterConfig, WriterStats,
    };
}
