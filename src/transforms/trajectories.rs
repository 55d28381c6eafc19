use super::TransformError;
use crate::table::{TidyRow, TidyTable, TrajectoryRow, TrajectoryTable};

/// Reshape a tidy table into one row per (well, time) with one column per
/// channel.
///
/// Channels and wells keep their order of first appearance. Times come from
/// the first channel; every channel must have the same number of points in
/// each well, and points are paired by position.
pub fn extract_trajectories(table: &TidyTable) -> Result<TrajectoryTable, TransformError> {
    let channels = table.channels();
    let mut rows = Vec::new();

    for well in table.wells() {
        let well_rows: Vec<&TidyRow> = table.rows().iter().filter(|r| r.well == well).collect();

        let series: Vec<Vec<&TidyRow>> = channels
            .iter()
            .map(|channel| well_rows.iter().copied().filter(|r| &r.channel == channel).collect())
            .collect();

        let times = match series.first() {
            Some(first) => first,
            None => continue,
        };
        for (channel, points) in channels.iter().zip(series.iter()) {
            if points.len() != times.len() {
                return Err(TransformError::SeriesLengthMismatch {
                    well: well.clone(),
                    channel: channel.clone(),
                    expected: times.len(),
                    found: points.len(),
                });
            }
        }

        for (i, point) in times.iter().enumerate() {
            rows.push(TrajectoryRow {
                time_hr: point.time_hr,
                well: well.clone(),
                values: series.iter().map(|points| points[i].measurement).collect(),
            });
        }
    }

    log::debug!(
        "Extracted {} trajectory points across {} channels",
        rows.len(),
        channels.len()
    );
    Ok(TrajectoryTable { channels, rows })
}
