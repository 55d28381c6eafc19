use std::collections::HashMap;

use super::*;
use crate::schema;
use crate::table::{CellValue, Gain, TidyRow, TidyTable};

fn row(channel: &str, gain: i32, well: &str, time_sec: f64, measurement: f64) -> TidyRow {
    let (units, excitation, emission) = if channel.starts_with("OD") {
        ("absorbance", 600, -1)
    } else {
        ("uM", 485, 528)
    };
    TidyRow {
        channel: channel.to_string(),
        gain: Gain::Value(gain),
        time_sec,
        time_hr: time_sec / 3600.0,
        well: well.to_string(),
        measurement,
        units: units.to_string(),
        excitation,
        emission,
        extra: HashMap::new(),
    }
}

/// GFP and OD600 for wells A1 (control) and A2 at three time points
fn plate() -> TidyTable {
    let mut rows = Vec::new();
    for (i, t) in [0.0, 600.0, 1200.0].iter().enumerate() {
        let i = i as f64;
        rows.push(row("GFP", 61, "A1", *t, 1.0 + i));
        rows.push(row("GFP", 61, "A2", *t, 10.0 + 2.0 * i));
    }
    for (i, t) in [0.0, 600.0, 1200.0].iter().enumerate() {
        let i = i as f64;
        rows.push(row("OD600", -1, "A1", *t, 0.1));
        rows.push(row("OD600", -1, "A2", *t, 0.2 + 0.1 * i));
    }
    TidyTable::from_rows(Vec::new(), rows)
}

fn find<'a>(table: &'a TidyTable, channel: &str, well: &str, time_sec: f64) -> &'a TidyRow {
    table
        .rows()
        .iter()
        .find(|r| r.channel == channel && r.well == well && r.time_sec == time_sec)
        .unwrap()
}

#[test]
fn test_extract_trajectories() {
    let trajectories = extract_trajectories(&plate()).unwrap();

    assert_eq!(trajectories.channels, vec!["GFP".to_string(), "OD600".to_string()]);
    assert_eq!(trajectories.rows.len(), 6);
    let first = &trajectories.rows[0];
    assert_eq!(first.well, "A1");
    assert_eq!(first.time_hr, 0.0);
    assert_eq!(first.values, vec![1.0, 0.1]);
    let a2_last = &trajectories.rows[5];
    assert_eq!(a2_last.well, "A2");
    assert_eq!(a2_last.values, vec![14.0, 0.4]);
}

#[test]
fn test_extract_trajectories_length_mismatch() {
    let mut rows = plate().into_rows();
    rows.retain(|r| !(r.channel == "OD600" && r.well == "A2" && r.time_sec == 1200.0));
    let err = extract_trajectories(&TidyTable::from_rows(Vec::new(), rows)).unwrap_err();
    assert_eq!(
        err,
        TransformError::SeriesLengthMismatch {
            well: "A2".to_string(),
            channel: "OD600".to_string(),
            expected: 3,
            found: 2,
        }
    );
}

#[test]
fn test_background_single_control() {
    let result = background_subtract(&plate(), &["A1".to_string()], &[]).unwrap();

    assert_eq!(result.len(), 12);
    for r in result.rows().iter().filter(|r| r.well == "A1") {
        assert_eq!(r.measurement, 0.0);
    }
    assert_eq!(find(&result, "GFP", "A2", 1200.0).measurement, 14.0 - 3.0);
    assert!((find(&result, "OD600", "A2", 600.0).measurement - 0.2).abs() < 1e-12);
}

#[test]
fn test_background_averages_controls() {
    let controls = ["A1".to_string(), "A2".to_string()];
    let result = background_subtract(&plate(), &controls, &[]).unwrap();
    // Mean of 1 and 10 at t=0
    assert_eq!(find(&result, "GFP", "A1", 0.0).measurement, 1.0 - 5.5);
    assert_eq!(find(&result, "GFP", "A2", 0.0).measurement, 10.0 - 5.5);
}

#[test]
fn test_background_missing_timestamp() {
    let mut rows = plate().into_rows();
    rows.retain(|r| !(r.well == "A1" && r.channel == "GFP" && r.time_sec == 600.0));
    let err = background_subtract(&TidyTable::from_rows(Vec::new(), rows), &["A1".to_string()], &[])
        .unwrap_err();
    assert!(matches!(err, TransformError::MissingBackground { time_sec, .. } if time_sec == 600.0));
}

#[test]
fn test_window_average_seconds_and_hours() {
    let by_seconds = window_average(&plate(), 600.0, 1200.0, TimeUnit::Seconds, &[]).unwrap();
    assert_eq!(by_seconds.len(), 4);
    let gfp_a2 = find(&by_seconds, "GFP", "A2", 900.0);
    assert_eq!(gfp_a2.measurement, 13.0);
    assert_eq!(gfp_a2.time_hr, 0.25);
    assert_eq!(gfp_a2.units, "uM");
    assert_eq!((gfp_a2.excitation, gfp_a2.emission), (485, 528));

    let by_hours = window_average(&plate(), 0.0, 0.2, TimeUnit::Hours, &[]).unwrap();
    assert_eq!(find(&by_hours, "GFP", "A1", 300.0).measurement, 1.5);
}

#[test]
fn test_window_average_index() {
    let result = window_average(&plate(), 2.0, 2.0, TimeUnit::Index, &[]).unwrap();
    assert_eq!(find(&result, "GFP", "A2", 1200.0).measurement, 14.0);
}

#[test]
fn test_window_average_drops_empty_windows() {
    let result = window_average(&plate(), 5000.0, 6000.0, TimeUnit::Seconds, &[]).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_window_average_output_sorted_by_series() {
    let result = window_average(&plate(), 0.0, 1200.0, TimeUnit::Seconds, &[]).unwrap();
    let keys: Vec<(String, String)> = result
        .rows()
        .iter()
        .map(|r| (r.channel.clone(), r.well.clone()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("GFP".to_string(), "A1".to_string()),
            ("GFP".to_string(), "A2".to_string()),
            ("OD600".to_string(), "A1".to_string()),
            ("OD600".to_string(), "A2".to_string()),
        ]
    );
}

#[test]
fn test_window_average_extra_columns() {
    let mut rows = plate().into_rows();
    for r in rows.iter_mut() {
        let (strain, iptg) = match (r.well.as_str(), r.time_sec as i64) {
            ("A1", _) => ("MG1655", CellValue::Number(0.0)),
            (_, 1200) => ("DH5a-late", CellValue::Number(200.0)),
            _ => ("DH5a", CellValue::Number(100.0)),
        };
        r.extra.insert("Strain".to_string(), CellValue::Text(strain.to_string()));
        r.extra.insert("IPTG".to_string(), iptg);
    }
    let table = TidyTable::from_rows(vec!["Strain".to_string(), "IPTG".to_string()], rows);

    let result = window_average(&table, 0.0, 1200.0, TimeUnit::Seconds, &[]).unwrap();
    let a2 = find(&result, "GFP", "A2", 600.0);
    assert_eq!(a2.extra.get("Strain"), Some(&CellValue::Text("DH5a-late".to_string())));
    let iptg = a2.extra.get("IPTG").and_then(|v| v.as_f64()).unwrap();
    assert!((iptg - 400.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_time_unit_parsing() {
    assert_eq!("Seconds".parse::<TimeUnit>(), Ok(TimeUnit::Seconds));
    assert_eq!("HOURS".parse::<TimeUnit>(), Ok(TimeUnit::Hours));
    assert_eq!("index".parse::<TimeUnit>(), Ok(TimeUnit::Index));
    assert_eq!(
        "minutes".parse::<TimeUnit>(),
        Err(TransformError::InvalidUnit("minutes".to_string()))
    );
}

#[test]
fn test_endpoint_matches_index_window() {
    let endpoint = endpoint_average(&plate(), 2, &[]).unwrap();
    let window = window_average(&plate(), 1.0, 2.0, TimeUnit::Index, &[]).unwrap();
    assert_eq!(endpoint, window);
    assert_eq!(find(&endpoint, "GFP", "A2", 900.0).measurement, 13.0);
}

#[test]
fn test_endpoint_short_series_uses_all_points() {
    let endpoint = endpoint_average(&plate(), DEFAULT_ENDPOINT_WINDOW, &[]).unwrap();
    assert_eq!(find(&endpoint, "GFP", "A1", 600.0).measurement, 2.0);
}

#[test]
fn test_extra_grouping_separates_plates() {
    let mut rows = plate().into_rows();
    let mut second = plate().into_rows();
    for r in rows.iter_mut() {
        r.extra.insert("Plate".to_string(), CellValue::Text("p1".to_string()));
    }
    for r in second.iter_mut() {
        r.measurement *= 2.0;
        r.extra.insert("Plate".to_string(), CellValue::Text("p2".to_string()));
    }
    rows.extend(second);
    let table = TidyTable::from_rows(vec!["Plate".to_string()], rows);
    let group = vec!["Plate".to_string()];

    let result = endpoint_average(&table, 1, &group).unwrap();
    assert_eq!(result.len(), 8);

    let err = endpoint_average(&table, 1, &["Plate number".to_string()]).unwrap_err();
    assert_eq!(err, TransformError::UnknownColumn("Plate number".to_string()));
}

#[test]
fn test_spline_fit_column() {
    let result = spline_fit(&plate(), schema::MEASUREMENT, Some(0.0), &[]).unwrap();
    assert_eq!(result.extra_columns(), &[schema::SPLINE_FIT.to_string()]);
    for r in result.rows() {
        assert_eq!(r.numeric(schema::SPLINE_FIT), Some(r.measurement));
    }
}

#[test]
fn test_spline_fit_errors() {
    let err = spline_fit(&plate(), "Fluorescence", None, &[]).unwrap_err();
    assert_eq!(err, TransformError::UnknownColumn("Fluorescence".to_string()));

    let mut rows = plate().into_rows();
    rows.push(row("GFP", 61, "A1", 600.0, 9.0));
    let err = spline_fit(&TidyTable::from_rows(Vec::new(), rows), schema::MEASUREMENT, None, &[])
        .unwrap_err();
    assert!(matches!(err, TransformError::NonIncreasingTime { ref well, .. } if well == "A1"));
}

#[test]
fn test_smoothed_derivative() {
    let result = smoothed_derivative(&plate(), schema::MEASUREMENT, None, &[]).unwrap();

    let gfp_name = derivative_column_name(schema::MEASUREMENT, "uM");
    let od_name = derivative_column_name(schema::MEASUREMENT, "absorbance");
    assert_eq!(gfp_name, "Measurement (uM/sec)");
    assert!(result.has_column(schema::SPLINE_FIT));
    assert!(result.has_column(&gfp_name));
    assert!(result.has_column(&od_name));

    // A2 GFP is a straight line (10, 12, 14): the spline reproduces it
    let a2 = find(&result, "GFP", "A2", 600.0);
    let slope = a2.numeric(&gfp_name).unwrap();
    assert!((slope - 2.0).abs() < 1e-9);
    assert!(a2.extra.get(&od_name).is_none());
}

#[test]
fn test_gradient() {
    assert_eq!(gradient(&[]), Vec::<f64>::new());
    assert_eq!(gradient(&[3.0]), vec![0.0]);
    assert_eq!(gradient(&[1.0, 2.0, 4.0, 7.0]), vec![1.0, 1.5, 2.5, 3.0]);
}

#[test]
fn test_normalize_by_od() {
    let result = normalize(&plate(), DEFAULT_NORM_CHANNEL, Gain::ABSORBANCE, &[]).unwrap();

    let gfp = find(&result, "GFP", "A2", 1200.0);
    assert!((gfp.measurement - 14.0 / 0.4).abs() < 1e-9);
    assert_eq!(gfp.units, "uM/OD");
    let od = find(&result, "OD600", "A1", 0.0);
    assert_eq!(od.measurement, 1.0);
    assert_eq!(od.units, "absorbance/OD");
}

#[test]
fn test_normalize_by_fluorescence_channel() {
    let result = normalize(&plate(), "GFP", Gain::Value(61), &[]).unwrap();
    assert_eq!(find(&result, "OD600", "A2", 0.0).units, "absorbance/uM");
}

#[test]
fn test_normalize_validation() {
    assert_eq!(
        normalize(&plate(), "RFP", Gain::Value(61), &[]).unwrap_err(),
        TransformError::MissingNormalizationChannel("RFP".to_string())
    );
    assert_eq!(
        normalize(&plate(), "OD600", Gain::Value(61), &[]).unwrap_err(),
        TransformError::MissingNormalizationGain {
            channel: "OD600".to_string(),
            gain: Gain::Value(61),
        }
    );

    let mut rows = plate().into_rows();
    rows.retain(|r| !(r.channel == "OD600" && r.well == "A2" && r.time_sec == 0.0));
    let err = normalize(&TidyTable::from_rows(Vec::new(), rows), "OD600", Gain::ABSORBANCE, &[])
        .unwrap_err();
    assert!(matches!(
        err,
        TransformError::NormalizationLengthMismatch { expected: 2, found: 3, .. }
    ));
}

#[test]
fn test_transforms_leave_input_untouched() {
    let table = plate();
    let before = table.clone();
    let _ = background_subtract(&table, &["A1".to_string()], &[]).unwrap();
    let _ = smoothed_derivative(&table, schema::MEASUREMENT, None, &[]).unwrap();
    let _ = normalize(&table, "OD600", Gain::ABSORBANCE, &[]).unwrap();
    assert_eq!(table, before);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A single control well subtracted from itself is zero everywhere
        #[test]
        fn test_background_self_subtraction(
            values in prop::collection::vec(-1e6f64..1e6, 1..40),
            well in "[A-H](1[0-2]|[1-9])",
        ) {
            let rows: Vec<TidyRow> = values
                .iter()
                .enumerate()
                .map(|(i, v)| row("GFP", 61, &well, i as f64 * 60.0, *v))
                .collect();
            let table = TidyTable::from_rows(Vec::new(), rows);

            let result = background_subtract(&table, &[well.clone()], &[]).unwrap();
            prop_assert_eq!(result.len(), values.len());
            for r in result.rows() {
                prop_assert_eq!(r.measurement, 0.0);
            }
        }

        /// Gradient of a straight line is its slope everywhere
        #[test]
        fn test_gradient_of_line(slope in -100.0f64..100.0, n in 2usize..50) {
            let values: Vec<f64> = (0..n).map(|i| slope * i as f64).collect();
            for g in gradient(&values) {
                prop_assert!((g - slope).abs() < 1e-6);
            }
        }
    }
}
