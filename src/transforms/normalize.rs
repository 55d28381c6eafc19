use super::grouping::{extra_values, group_rows};
use super::TransformError;
use crate::table::{Gain, TidyRow, TidyTable};

/// Units token used when normalizing by an optical-density channel
const OD_UNITS: &str = "OD";

/// Divide every series by the normalization channel of the same well.
///
/// Points are paired by position within the series (table order), so each
/// series must have exactly as many rows as the normalization series of its
/// well. Units become `"<units>/<normalization units>"`, with `OD` standing in
/// for any channel whose name starts with `OD`. The normalization channel is
/// normalized by itself as well.
pub fn normalize(
    table: &TidyTable,
    norm_channel: &str,
    norm_gain: Gain,
    extra_group_cols: &[String],
) -> Result<TidyTable, TransformError> {
    if !table.rows().iter().any(|r| r.channel == norm_channel) {
        return Err(TransformError::MissingNormalizationChannel(norm_channel.to_string()));
    }
    if !table
        .rows()
        .iter()
        .any(|r| r.channel == norm_channel && r.gain == norm_gain)
    {
        return Err(TransformError::MissingNormalizationGain {
            channel: norm_channel.to_string(),
            gain: norm_gain,
        });
    }

    let groups = group_rows(table, extra_group_cols)?;

    let mut result = TidyTable::new(table.extra_columns().to_vec());
    for (key, rows) in groups {
        let norm_rows: Vec<&TidyRow> = table
            .rows()
            .iter()
            .filter(|r| {
                r.channel == norm_channel
                    && r.gain == norm_gain
                    && r.well == key.well
                    && extra_values(r, extra_group_cols) == key.extras
            })
            .collect();

        if norm_rows.len() != rows.len() {
            return Err(TransformError::NormalizationLengthMismatch {
                channel: key.channel.clone(),
                gain: key.gain,
                well: key.well.clone(),
                expected: norm_rows.len(),
                found: rows.len(),
            });
        }

        let orig_units = rows.first().map(|r| r.units.clone()).unwrap_or_default();
        let norm_units = if norm_channel.starts_with("OD") {
            OD_UNITS.to_string()
        } else {
            norm_rows.first().map(|r| r.units.clone()).unwrap_or_default()
        };
        let units = format!("{}/{}", orig_units, norm_units);

        for (row, norm) in rows.into_iter().zip(norm_rows) {
            let mut out = row.clone();
            out.measurement = row.measurement / norm.measurement;
            out.units = units.clone();
            result.push(out);
        }
    }

    log::debug!(
        "Normalized {} rows by {} (gain {})",
        result.len(),
        norm_channel,
        norm_gain
    );
    Ok(result)
}
