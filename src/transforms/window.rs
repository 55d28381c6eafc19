//! Windowed and endpoint averaging.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::grouping::{group_rows, GroupKey};
use super::TransformError;
use crate::table::{CellValue, TidyRow, TidyTable};

/// How window bounds are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    /// Bounds on `Time (sec)`
    #[default]
    Seconds,
    /// Bounds on `Time (hr)`
    Hours,
    /// Bounds on the rank of each distinct time point, first time is 0
    Index,
}

impl FromStr for TimeUnit {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "seconds" => Ok(TimeUnit::Seconds),
            "hours" => Ok(TimeUnit::Hours),
            "index" => Ok(TimeUnit::Index),
            _ => Err(TransformError::InvalidUnit(s.to_string())),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Hours => "hours",
            TimeUnit::Index => "index",
        };
        f.write_str(name)
    }
}

/// Distinct times of a series in ascending order
fn unique_times(rows: &[&TidyRow]) -> Vec<f64> {
    let mut times: Vec<f64> = rows.iter().map(|r| r.time_sec).collect();
    times.sort_by(|a, b| a.total_cmp(b));
    times.dedup();
    times
}

fn select_window<'a>(rows: &[&'a TidyRow], start: f64, end: f64, unit: TimeUnit) -> Vec<&'a TidyRow> {
    match unit {
        TimeUnit::Index => {
            let times = unique_times(rows);
            let selected: Vec<f64> = times
                .into_iter()
                .enumerate()
                .filter(|(i, _)| (*i as f64) >= start && (*i as f64) <= end)
                .map(|(_, t)| t)
                .collect();
            rows.iter().copied().filter(|r| selected.contains(&r.time_sec)).collect()
        }
        TimeUnit::Seconds => rows
            .iter()
            .copied()
            .filter(|r| r.time_sec >= start && r.time_sec <= end)
            .collect(),
        TimeUnit::Hours => rows
            .iter()
            .copied()
            .filter(|r| r.time_hr >= start && r.time_hr <= end)
            .collect(),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Average each series over an inclusive window.
///
/// Numeric columns are averaged (wavelengths rounded back to whole nm) and
/// text columns keep the last value in the window. An extra column counts as
/// numeric when every present value in the windowed table is a number.
/// Series with no points in the window are left out.
pub fn window_average(
    table: &TidyTable,
    start: f64,
    end: f64,
    unit: TimeUnit,
    extra_group_cols: &[String],
) -> Result<TidyTable, TransformError> {
    let groups = group_rows(table, extra_group_cols)?;

    let windows: Vec<(GroupKey, Vec<&TidyRow>)> = groups
        .into_iter()
        .map(|(key, rows)| (key, select_window(&rows, start, end, unit)))
        .filter(|(_, rows)| !rows.is_empty())
        .collect();

    // A column is text as soon as one windowed value is text
    let text_columns: HashSet<&String> = table
        .extra_columns()
        .iter()
        .filter(|col| {
            windows
                .iter()
                .flat_map(|(_, rows)| rows.iter())
                .any(|r| matches!(r.extra.get(*col), Some(CellValue::Text(_))))
        })
        .collect();

    let mut result = TidyTable::new(table.extra_columns().to_vec());
    for (key, rows) in &windows {
        let last = match rows.last() {
            Some(last) => *last,
            None => continue,
        };

        let mut extra = last.extra.clone();
        for col in table.extra_columns() {
            if extra_group_cols.contains(col) || text_columns.contains(col) {
                continue;
            }
            let value = mean(rows.iter().filter_map(|r| r.extra.get(col).and_then(|v| v.as_f64())))
                .map(CellValue::Number)
                .unwrap_or(CellValue::Missing);
            extra.insert(col.clone(), value);
        }

        result.push(TidyRow {
            channel: key.channel.clone(),
            gain: key.gain,
            time_sec: mean(rows.iter().map(|r| r.time_sec)).unwrap_or(last.time_sec),
            time_hr: mean(rows.iter().map(|r| r.time_hr)).unwrap_or(last.time_hr),
            well: key.well.clone(),
            measurement: mean(rows.iter().map(|r| r.measurement)).unwrap_or(last.measurement),
            units: last.units.clone(),
            excitation: mean(rows.iter().map(|r| r.excitation as f64))
                .map(|v| v.round() as i32)
                .unwrap_or(last.excitation),
            emission: mean(rows.iter().map(|r| r.emission as f64))
                .map(|v| v.round() as i32)
                .unwrap_or(last.emission),
            extra,
        });
    }

    log::debug!(
        "Averaged {} series over {} {}..{}",
        result.len(),
        unit,
        start,
        end
    );
    Ok(result)
}

/// Average the last `window_size` distinct time points of each series.
///
/// Series shorter than the window are averaged over all of their points.
pub fn endpoint_average(
    table: &TidyTable,
    window_size: usize,
    extra_group_cols: &[String],
) -> Result<TidyTable, TransformError> {
    let groups = group_rows(table, extra_group_cols)?;

    let mut endpoints = TidyTable::new(table.extra_columns().to_vec());
    if window_size == 0 {
        return Ok(endpoints);
    }
    for rows in groups.values() {
        let times = unique_times(rows);
        let first_kept = times[times.len().saturating_sub(window_size)];
        for row in rows.iter().filter(|r| r.time_sec >= first_kept) {
            endpoints.push((*row).clone());
        }
    }

    window_average(
        &endpoints,
        0.0,
        window_size as f64,
        TimeUnit::Index,
        extra_group_cols,
    )
}
