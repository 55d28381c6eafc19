//! # Tidy Table Schema
//!
//! Column names for the tidy long-format table and the Arrow schema used when
//! the table is written to Parquet.
//!
//! | Column | Arrow type | Description |
//! |--------|------------|-------------|
//! | Channel | Utf8 | Read name as it appears in the export (`GFP`, `OD600`, ...) |
//! | Gain | Utf8 | Detector gain, `-1` for absorbance, `AutoScale` when auto-gained |
//! | Time (sec) | Float64 | Seconds since the start of the kinetic read |
//! | Time (hr) | Float64 | `Time (sec) / 3600` |
//! | Well | Utf8 | Well identifier (`A1`, `H12`, ...) |
//! | Measurement | Float64 | Calibrated or raw value, `inf` for detector overflow |
//! | Units | Utf8 | `absorbance`, `uM` or `AFU` |
//! | Excitation | Int32 | Excitation wavelength in nm |
//! | Emission | Int32 | Emission wavelength in nm, `-1` for absorbance |
//!
//! Supplementary metadata columns follow the core columns in load order and are
//! stored as nullable Utf8.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaBuilder};

/// Read name of the channel
pub const CHANNEL: &str = "Channel";
/// Detector gain
pub const GAIN: &str = "Gain";
/// Time in whole seconds
pub const TIME_SEC: &str = "Time (sec)";
/// Time in fractional hours
pub const TIME_HR: &str = "Time (hr)";
/// Well identifier
pub const WELL: &str = "Well";
/// Measured value
pub const MEASUREMENT: &str = "Measurement";
/// Unit string of the measurement
pub const UNITS: &str = "Units";
/// Excitation wavelength
pub const EXCITATION: &str = "Excitation";
/// Emission wavelength
pub const EMISSION: &str = "Emission";

/// Column appended by the spline transform
pub const SPLINE_FIT: &str = "spline fit";

/// Trajectory table time column
pub const TRAJECTORY_TIME: &str = "Time";

/// Core columns in output order
pub const CORE_COLUMNS: [&str; 9] = [
    CHANNEL,
    GAIN,
    TIME_SEC,
    TIME_HR,
    WELL,
    MEASUREMENT,
    UNITS,
    EXCITATION,
    EMISSION,
];

/// Footer key holding the resolved instrument code
pub const KEY_INSTRUMENT: &str = "tidyplate:instrument";
/// Footer key holding the reaction volume in microliters
pub const KEY_VOLUME_UL: &str = "tidyplate:volume_ul";
/// Footer key holding the source export file name
pub const KEY_SOURCE_FILE: &str = "tidyplate:source_file";

/// Returns true when `name` is one of the nine core tidy columns.
pub fn is_core_column(name: &str) -> bool {
    CORE_COLUMNS.contains(&name)
}

fn field_with_unit(name: &str, data_type: DataType, nullable: bool, unit: &str) -> Field {
    let mut metadata = HashMap::new();
    metadata.insert("unit".to_string(), unit.to_string());
    Field::new(name, data_type, nullable).with_metadata(metadata)
}

/// Creates the Arrow schema for a tidy table with the given metadata columns.
///
/// ```
/// use tidyplate::schema::create_tidy_schema;
///
/// let schema = create_tidy_schema(&["Strain".to_string()]);
/// assert_eq!(schema.fields().len(), 10);
/// ```
pub fn create_tidy_schema(metadata_columns: &[String]) -> Schema {
    let mut builder = SchemaBuilder::new();

    builder.push(Field::new(CHANNEL, DataType::Utf8, false));
    // Gain mixes integers with the AutoScale token
    builder.push(Field::new(GAIN, DataType::Utf8, false));
    builder.push(field_with_unit(TIME_SEC, DataType::Float64, false, "s"));
    builder.push(field_with_unit(TIME_HR, DataType::Float64, false, "h"));
    builder.push(Field::new(WELL, DataType::Utf8, false));
    builder.push(Field::new(MEASUREMENT, DataType::Float64, false));
    builder.push(Field::new(UNITS, DataType::Utf8, false));
    builder.push(field_with_unit(EXCITATION, DataType::Int32, false, "nm"));
    builder.push(field_with_unit(EMISSION, DataType::Int32, false, "nm"));

    for name in metadata_columns {
        builder.push(Field::new(name, DataType::Utf8, true));
    }

    builder.finish()
}

/// Creates the tidy schema wrapped in an Arc for sharing with writers.
pub fn create_tidy_schema_arc(metadata_columns: &[String]) -> Arc<Schema> {
    Arc::new(create_tidy_schema(metadata_columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_schema_order() {
        let schema = create_tidy_schema(&[]);
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, CORE_COLUMNS.to_vec());
    }

    #[test]
    fn test_metadata_columns_nullable() {
        let schema = create_tidy_schema(&["Inducer".to_string(), "Strain".to_string()]);
        assert_eq!(schema.fields().len(), 11);
        let field = schema.field_with_name("Strain").unwrap();
        assert!(field.is_nullable());
        assert_eq!(field.data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_is_core_column() {
        assert!(is_core_column("Time (hr)"));
        assert!(!is_core_column("spline fit"));
    }
}
