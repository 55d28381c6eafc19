//! # Tidy Table
//!
//! In-memory representation of the tidy long-format table: one row per
//! (channel, gain, well, time) measurement. The parser streams [`TidyRow`]s
//! without collecting them; the series transforms operate on a fully
//! materialized [`TidyTable`].
//!
//! Supplementary metadata and columns added by transforms (`spline fit`,
//! derivatives) live in each row's `extra` map, while the table keeps their
//! column order.

mod csv_io;
mod error;


use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema;

pub use error::TableError;

/// Token the reader prints for a saturated detector
pub const OVERFLOW_TOKEN: &str = "OVRFLW";

/// Token the reader prints for auto-scaled gain
pub const AUTOSCALE_TOKEN: &str = "AutoScale";

/// Detector gain of a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gain {
    /// Fixed gain; absorbance reads use -1
    Value(i32),
    /// Gain chosen by the reader at run time
    AutoScale,
}

impl Gain {
    /// Gain recorded for absorbance reads
    pub const ABSORBANCE: Gain = Gain::Value(-1);
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gain::Value(g) => write!(f, "{}", g),
            Gain::AutoScale => f.write_str(AUTOSCALE_TOKEN),
        }
    }
}

impl FromStr for Gain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(AUTOSCALE_TOKEN) {
            return Ok(Gain::AutoScale);
        }
        if let Ok(g) = s.parse::<i32>() {
            return Ok(Gain::Value(g));
        }
        // Tables round-tripped through dataframe tools may carry "61.0"
        match s.parse::<f64>() {
            Ok(g) if g.fract() == 0.0 => Ok(Gain::Value(g as i32)),
            _ => Err(format!("Invalid gain '{}'", s)),
        }
    }
}

/// Unit a measurement was emitted in by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Units {
    /// Optical density read
    Absorbance,
    /// Calibrated fluorescence in micromolar
    Micromolar,
    /// Arbitrary fluorescence units
    Afu,
}

impl Units {
    /// Unit string as written to the tidy table
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Absorbance => "absorbance",
            Units::Micromolar => "uM",
            Units::Afu => "AFU",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell value, typed once when it is read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    /// Numeric cell; detector overflow is `+inf`
    Number(f64),
    /// Numeric cell whose source text differs from how `value` prints,
    /// such as `0007`, `1.50` or `OVRFLW`. The text is written back as read.
    Formatted {
        /// Parsed value
        value: f64,
        /// Cell text as read
        text: String,
    },
    /// Any non-numeric text
    Text(String),
    /// Empty cell
    Missing,
}

impl CellValue {
    /// Resolve a raw CSV cell
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Missing;
        }
        let value = if trimmed.eq_ignore_ascii_case(OVERFLOW_TOKEN) {
            f64::INFINITY
        } else {
            match trimmed.parse::<f64>() {
                Ok(v) => v,
                Err(_) => return CellValue::Text(raw.to_string()),
            }
        };
        if value.to_string() == raw {
            CellValue::Number(value)
        } else {
            CellValue::Formatted {
                value,
                text: raw.to_string(),
            }
        }
    }

    /// Numeric value, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Formatted { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{}", v),
            CellValue::Formatted { text, .. } => f.write_str(text),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Missing => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

/// One tidy measurement
#[derive(Debug, Clone, PartialEq)]
pub struct TidyRow {
    /// Read name
    pub channel: String,
    /// Detector gain
    pub gain: Gain,
    /// Seconds since the start of the read (whole seconds from the parser)
    pub time_sec: f64,
    /// Hours since the start of the read
    pub time_hr: f64,
    /// Well identifier
    pub well: String,
    /// Measured value
    pub measurement: f64,
    /// Unit string
    pub units: String,
    /// Excitation wavelength in nm
    pub excitation: i32,
    /// Emission wavelength in nm, -1 for absorbance
    pub emission: i32,
    /// Metadata and derived columns
    pub extra: HashMap<String, CellValue>,
}

impl TidyRow {
    /// Value of any column by name, core or extra
    pub fn value(&self, column: &str) -> Option<CellValue> {
        let value = match column {
            schema::CHANNEL => CellValue::Text(self.channel.clone()),
            schema::GAIN => match self.gain {
                Gain::Value(g) => CellValue::Number(g as f64),
                Gain::AutoScale => CellValue::Text(AUTOSCALE_TOKEN.to_string()),
            },
            schema::TIME_SEC => CellValue::Number(self.time_sec),
            schema::TIME_HR => CellValue::Number(self.time_hr),
            schema::WELL => CellValue::Text(self.well.clone()),
            schema::MEASUREMENT => CellValue::Number(self.measurement),
            schema::UNITS => CellValue::Text(self.units.clone()),
            schema::EXCITATION => CellValue::Number(self.excitation as f64),
            schema::EMISSION => CellValue::Number(self.emission as f64),
            other => return self.extra.get(other).cloned(),
        };
        Some(value)
    }

    /// Numeric value of a column, `None` when absent or non-numeric
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            schema::TIME_SEC => Some(self.time_sec),
            schema::TIME_HR => Some(self.time_hr),
            schema::MEASUREMENT => Some(self.measurement),
            _ => self.value(column).and_then(|v| v.as_f64()),
        }
    }

    /// Cells in output order for the given extra columns
    pub fn to_record(&self, extra_columns: &[String]) -> Vec<String> {
        let mut record = vec![
            self.channel.clone(),
            self.gain.to_string(),
            self.time_sec.to_string(),
            self.time_hr.to_string(),
            self.well.clone(),
            self.measurement.to_string(),
            self.units.clone(),
            self.excitation.to_string(),
            self.emission.to_string(),
        ];
        for name in extra_columns {
            record.push(self.extra.get(name).map(|v| v.to_string()).unwrap_or_default());
        }
        record
    }
}

/// A materialized tidy table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TidyTable {
    extra_columns: Vec<String>,
    rows: Vec<TidyRow>,
}

impl TidyTable {
    /// Create an empty table with the given extra columns
    pub fn new(extra_columns: Vec<String>) -> Self {
        Self {
            extra_columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows
    pub fn from_rows(extra_columns: Vec<String>, rows: Vec<TidyRow>) -> Self {
        Self { extra_columns, rows }
    }

    /// Extra column names in output order
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// All column names in output order
    pub fn columns(&self) -> Vec<String> {
        schema::CORE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }

    /// True when `name` is a core or extra column of this table
    pub fn has_column(&self, name: &str) -> bool {
        schema::is_core_column(name) || self.extra_columns.iter().any(|c| c == name)
    }

    /// Register an extra column if it is not present yet
    pub fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.extra_columns.push(name.to_string());
        }
    }

    /// Append a row
    pub fn push(&mut self, row: TidyRow) {
        self.rows.push(row);
    }

    /// Rows in table order
    pub fn rows(&self) -> &[TidyRow] {
        &self.rows
    }

    /// Consume the table, returning its rows
    pub fn into_rows(self) -> Vec<TidyRow> {
        self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct channel names in order of first appearance
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = Vec::new();
        for row in &self.rows {
            if !channels.contains(&row.channel) {
                channels.push(row.channel.clone());
            }
        }
        channels
    }

    /// Distinct wells in order of first appearance
    pub fn wells(&self) -> Vec<String> {
        let mut wells: Vec<String> = Vec::new();
        for row in &self.rows {
            if !wells.contains(&row.well) {
                wells.push(row.well.clone());
            }
        }
        wells
    }
}

/// Wide table with one row per (well, time) and one column per channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectoryTable {
    /// Channel columns in order
    pub channels: Vec<String>,
    /// Rows grouped by well
    pub rows: Vec<TrajectoryRow>,
}

/// One (well, time) point of a trajectory table
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryRow {
    /// Time in hours
    pub time_hr: f64,
    /// Well identifier
    pub well: String,
    /// One measurement per channel, aligned with [`TrajectoryTable::channels`]
    pub values: Vec<f64>,
}
