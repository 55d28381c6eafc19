use std::io::Write;

use super::*;
use crate::diagnostics::DiagnosticKind;
use crate::table::TidyTable;

const EXPORT: &str = "\
Reader Serial Number:,268449
Read,GFP
,Filter Set 1
,\"Excitation: 485/20,  Emission: 528/20\"
,\"Optics: Top,  Gain: 61\"
Layout
GFP:485,528

,Time,\"T° GFP:485,528\",A1,A2
,0:00:00,37,1517,OVRFLW
,0:10:00,37,3034,1517
";

#[test]
fn test_default_output_path() {
    assert_eq!(
        default_output_path("runs/plate1.csv", OutputFormat::Csv),
        PathBuf::from("runs/plate1_tidy.csv")
    );
    assert_eq!(
        default_output_path("plate1.txt", OutputFormat::Parquet),
        PathBuf::from("plate1_tidy.parquet")
    );
}

#[test]
fn test_default_volume_is_reported() {
    let converter = TidyConverter::new();
    let (table, stats) = converter.convert_reader(EXPORT.as_bytes()).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(stats.volume_ul, 10.0);
    assert_eq!(stats.instrument, Some(PlateReader::B1));
    assert_eq!(stats.diagnostics.count(DiagnosticKind::DefaultVolume), 1);
    assert_eq!(stats.rows_written, 4);
    assert_eq!(stats.writer.rows_written, 4);
}

#[test]
fn test_explicit_volume_is_silent() {
    let converter = TidyConverter::with_config(ConversionConfig::default().with_volume(20.0));
    let (table, stats) = converter.convert_reader(EXPORT.as_bytes()).unwrap();

    assert!(stats.diagnostics.is_empty());
    assert!((table.rows()[0].measurement - 0.5).abs() < 1e-12);
}

#[test]
fn test_invalid_volume_rejected() {
    let converter = TidyConverter::with_config(ConversionConfig::default().with_volume(0.0));
    let result = converter.convert_reader(EXPORT.as_bytes());
    assert!(matches!(result, Err(ConversionError::InvalidVolume(_))));
}

#[test]
fn test_convert_file_to_csv_with_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("plate.csv");
    let supplementary = dir.path().join("wells.csv");
    let output = dir.path().join("plate_tidy.csv");

    std::fs::write(&input, EXPORT).unwrap();
    let mut file = std::fs::File::create(&supplementary).unwrap();
    writeln!(file, "Well,Strain").unwrap();
    writeln!(file, "A1,MG1655").unwrap();
    drop(file);

    let config = ConversionConfig::default()
        .with_volume(10.0)
        .with_supplementary(&supplementary);
    let stats = TidyConverter::with_config(config).convert(&input, &output).unwrap();

    assert_eq!(stats.rows_written, 2);
    assert_eq!(stats.rows_dropped, 2);
    assert_eq!(stats.source_file.as_deref(), Some("plate.csv"));
    assert_eq!(stats.diagnostics.count(DiagnosticKind::MissingMetadata), 1);

    let table = TidyTable::read_csv(&output).unwrap();
    assert_eq!(table.extra_columns(), &["Strain".to_string()]);
    assert_eq!(table.wells(), vec!["A1".to_string()]);
    assert_eq!(table.rows()[1].time_sec, 600.0);
}

#[test]
fn test_convert_file_to_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("plate.csv");
    let output = dir.path().join("plate_tidy.parquet");
    std::fs::write(&input, EXPORT).unwrap();

    let stats = TidyConverter::with_config(ConversionConfig::parquet().with_volume(10.0))
        .convert(&input, &output)
        .unwrap();

    assert_eq!(stats.writer.rows_written, 4);
    assert!(stats.writer.row_groups_written >= 1);
    assert!(output.exists());
}

#[test]
fn test_structural_error_propagates() {
    let broken = EXPORT.replace("0:10:00", "ten minutes");
    let result = TidyConverter::new().convert_reader(broken.as_bytes());
    match result {
        Err(ConversionError::ParseError(err)) => assert!(err.to_string().contains("ten minutes")),
        other => panic!("expected parse error, got {:?}", other.map(|(t, _)| t.len())),
    }
}
