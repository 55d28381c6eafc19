use std::collections::HashMap;

use super::grouping::{extra_values, group_rows, sort_by_time};
use super::TransformError;
use crate::table::{Gain, TidyTable};

/// (channel, gain, extra grouping values)
type Condition = (String, Gain, Vec<String>);

/// Subtract the time-aligned mean of the control wells from every well.
///
/// Controls are averaged per (channel, gain) condition and timestamp; every
/// well of a condition must have been read at timestamps the controls cover,
/// otherwise `MissingBackground` is returned. Controls are themselves
/// subtracted, so a single control well ends at zero.
pub fn background_subtract(
    table: &TidyTable,
    control_wells: &[String],
    extra_group_cols: &[String],
) -> Result<TidyTable, TransformError> {
    let groups = group_rows(table, extra_group_cols)?;

    // Control sums keyed by condition, then by the bit pattern of the timestamp
    let mut controls: HashMap<Condition, HashMap<u64, (f64, usize)>> = HashMap::new();
    for row in table.rows().iter().filter(|r| control_wells.contains(&r.well)) {
        let condition = (row.channel.clone(), row.gain, extra_values(row, extra_group_cols));
        let entry = controls
            .entry(condition)
            .or_default()
            .entry(row.time_sec.to_bits())
            .or_insert((0.0, 0));
        entry.0 += row.measurement;
        entry.1 += 1;
    }

    let mut result = TidyTable::new(table.extra_columns().to_vec());
    for (key, mut rows) in groups {
        sort_by_time(&mut rows)?;
        let condition = (key.channel.clone(), key.gain, key.extras.clone());
        let background = controls.get(&condition);

        for row in rows {
            let mean = background
                .and_then(|times| times.get(&row.time_sec.to_bits()))
                .map(|(sum, n)| sum / *n as f64)
                .ok_or_else(|| TransformError::MissingBackground {
                    channel: key.channel.clone(),
                    gain: key.gain,
                    time_sec: row.time_sec,
                })?;

            let mut out = row.clone();
            out.measurement -= mean;
            result.push(out);
        }
    }

    log::debug!(
        "Subtracted background from {} rows using {} control wells",
        result.len(),
        control_wells.len()
    );
    Ok(result)
}
