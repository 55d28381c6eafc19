//! Grouping of tidy rows into measurement series.

use std::collections::BTreeMap;

use super::TransformError;
use crate::table::{Gain, TidyRow, TidyTable};

/// Identity of one measurement series.
///
/// Ordering follows the fields in declaration order, so grouped output is
/// sorted by channel, gain, well and then the extra grouping values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    /// Channel name
    pub channel: String,
    /// Detector gain
    pub gain: Gain,
    /// Well identifier
    pub well: String,
    /// Values of the caller-supplied grouping columns, as text
    pub extras: Vec<String>,
}

impl GroupKey {
    /// Key of `row` under the given extra grouping columns
    pub fn of(row: &TidyRow, extra_group_cols: &[String]) -> Self {
        Self {
            channel: row.channel.clone(),
            gain: row.gain,
            well: row.well.clone(),
            extras: extra_values(row, extra_group_cols),
        }
    }
}

/// Text values of the extra grouping columns; missing values are empty
pub(crate) fn extra_values(row: &TidyRow, extra_group_cols: &[String]) -> Vec<String> {
    extra_group_cols
        .iter()
        .map(|c| row.value(c).map(|v| v.to_string()).unwrap_or_default())
        .collect()
}

/// Fail with `UnknownColumn` for any column the table lacks
pub(crate) fn require_columns(table: &TidyTable, columns: &[String]) -> Result<(), TransformError> {
    match columns.iter().find(|c| !table.has_column(c)) {
        Some(missing) => Err(TransformError::UnknownColumn(missing.clone())),
        None => Ok(()),
    }
}

/// Split a table into series keyed by (channel, gain, well, extras...).
///
/// Rows keep their table order within each series.
pub(crate) fn group_rows<'a>(
    table: &'a TidyTable,
    extra_group_cols: &[String],
) -> Result<BTreeMap<GroupKey, Vec<&'a TidyRow>>, TransformError> {
    require_columns(table, extra_group_cols)?;

    let mut groups: BTreeMap<GroupKey, Vec<&TidyRow>> = BTreeMap::new();
    for row in table.rows() {
        groups.entry(GroupKey::of(row, extra_group_cols)).or_default().push(row);
    }
    Ok(groups)
}

/// Sort a series by time, rejecting repeated timestamps
pub(crate) fn sort_by_time(rows: &mut [&TidyRow]) -> Result<(), TransformError> {
    rows.sort_by(|a, b| a.time_sec.total_cmp(&b.time_sec));
    for pair in rows.windows(2) {
        if pair[1].time_sec <= pair[0].time_sec {
            return Err(TransformError::NonIncreasingTime {
                channel: pair[1].channel.clone(),
                well: pair[1].well.clone(),
                time_sec: pair[1].time_sec,
            });
        }
    }
    Ok(())
}
