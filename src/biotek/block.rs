//! Data block headers, timestamps and raw readings.

use csv::StringRecord;

use super::error::ParseError;
use super::header::{line_content, line_number, ReadSettings};
use crate::table::{Gain, OVERFLOW_TOKEN};

/// First data column; column 1 is the time, column 2 the temperature
pub(crate) const FIRST_WELL_COLUMN: usize = 3;

/// What a data block measures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// Optical density read
    Absorbance,
    /// Fluorescence read of a declared filter set
    Fluorescence,
}

/// Settings shared by every cell of one data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Read name, written as the tidy `Channel`
    pub channel: String,
    /// Absorbance or fluorescence
    pub kind: BlockKind,
    /// Detector gain (-1 for absorbance)
    pub gain: Gain,
    /// Excitation wavelength in nm
    pub excitation: i32,
    /// Emission wavelength in nm (-1 for absorbance)
    pub emission: i32,
}

/// One raw cell of a data row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawReading {
    /// Plain numeric reading
    Value(f64),
    /// Detector saturated
    Overflow,
}

impl RawReading {
    /// Parse a non-empty cell; `None` when it is not numeric
    pub fn parse(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.eq_ignore_ascii_case(OVERFLOW_TOKEN) {
            return Some(RawReading::Overflow);
        }
        cell.parse::<f64>().ok().map(RawReading::Value)
    }

    /// Numeric value, overflow as +inf
    pub fn as_f64(&self) -> f64 {
        match self {
            RawReading::Value(v) => *v,
            RawReading::Overflow => f64::INFINITY,
        }
    }
}

/// Full block label with trailing empty cells removed.
///
/// Block headers such as `GFP:485,528[2]` are split by the CSV layer, so the
/// label is reassembled before the name and occurrence index are read.
fn block_label(record: &StringRecord) -> String {
    let cells: Vec<&str> = record.iter().collect();
    let last = cells.iter().rposition(|c| !c.trim().is_empty()).map(|i| i + 1).unwrap_or(0);
    cells[..last].join(",").trim().to_string()
}

/// 0-based occurrence index from a trailing `[n]`, 0 when absent
fn occurrence_index(label: &str, record: &StringRecord) -> Result<usize, ParseError> {
    if !label.ends_with(']') {
        return Ok(0);
    }
    let open = label
        .rfind('[')
        .ok_or_else(|| ParseError::structural(record, "unbalanced occurrence index"))?;
    match label[open + 1..label.len() - 1].trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ParseError::structural(record, "occurrence index must be a positive integer")),
    }
}

/// Interpret a block header line against the declared read settings.
pub(crate) fn parse_block_header(
    record: &StringRecord,
    settings: &ReadSettings,
) -> Result<BlockHeader, ParseError> {
    let label = block_label(record);
    let name = label.split(':').next().unwrap_or("").trim();

    if name.to_uppercase().starts_with("OD") {
        let excitation = name
            .get(2..)
            .and_then(|digits| digits.trim().parse::<i32>().ok())
            .ok_or_else(|| ParseError::structural(record, "absorbance read without a wavelength"))?;
        return Ok(BlockHeader {
            channel: name.to_string(),
            kind: BlockKind::Absorbance,
            gain: Gain::ABSORBANCE,
            excitation,
            emission: -1,
        });
    }

    let index = occurrence_index(&label, record)?;
    let setting = settings.get(name, index).ok_or_else(|| ParseError::UnknownRead {
        name: name.to_string(),
        index: index + 1,
        line: line_number(record),
        content: line_content(record),
    })?;

    Ok(BlockHeader {
        channel: name.to_string(),
        kind: BlockKind::Fluorescence,
        gain: setting.gain,
        excitation: setting.excitation,
        emission: setting.emission,
    })
}

/// Convert an `HH:MM:SS` timestamp to whole seconds.
pub(crate) fn parse_timestamp(raw: &str) -> Option<u32> {
    let mut parts = raw.trim().split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    let seconds: u32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biotek::header::ReadSetting;

    fn record(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    fn settings() -> ReadSettings {
        let mut settings = ReadSettings::default();
        for gain in [61, 100] {
            settings.push(ReadSetting {
                name: "GFP".to_string(),
                excitation: 485,
                emission: 528,
                gain: Gain::Value(gain),
            });
        }
        settings
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(parse_timestamp("0:00:00"), Some(0));
        assert_eq!(parse_timestamp("01:02:03"), Some(3723));
        assert_eq!(parse_timestamp("26:00:30"), Some(93630));
        assert_eq!(parse_timestamp("1:00"), None);
        assert_eq!(parse_timestamp("a:b:c"), None);
    }

    #[test]
    fn test_timestamp_overflow_rejected() {
        assert_eq!(parse_timestamp("2000000:00:00"), None);
        assert_eq!(parse_timestamp("0:4294967295:00"), None);
        assert_eq!(parse_timestamp("1193046:28:15"), Some(u32::MAX));
    }

    #[test]
    fn test_raw_reading() {
        assert_eq!(RawReading::parse("1517"), Some(RawReading::Value(1517.0)));
        assert_eq!(RawReading::parse("ovrflw"), Some(RawReading::Overflow));
        assert_eq!(RawReading::parse("OVRFLW").unwrap().as_f64(), f64::INFINITY);
        assert_eq!(RawReading::parse("?????"), None);
    }

    #[test]
    fn test_absorbance_header() {
        let header = parse_block_header(&record(&["OD600:600", ""]), &settings()).unwrap();
        assert_eq!(header.kind, BlockKind::Absorbance);
        assert_eq!(header.channel, "OD600");
        assert_eq!(header.excitation, 600);
        assert_eq!(header.emission, -1);
        assert_eq!(header.gain, Gain::Value(-1));
    }

    #[test]
    fn test_fluorescence_header_default_index() {
        let header = parse_block_header(&record(&["GFP:485", "528"]), &settings()).unwrap();
        assert_eq!(header.kind, BlockKind::Fluorescence);
        assert_eq!(header.channel, "GFP");
        assert_eq!(header.gain, Gain::Value(61));
    }

    #[test]
    fn test_fluorescence_header_occurrence_index() {
        let header = parse_block_header(&record(&["GFP:485", "528[2]", ""]), &settings()).unwrap();
        assert_eq!(header.gain, Gain::Value(100));

        let quoted = parse_block_header(&record(&["GFP:485,528[2]"]), &settings()).unwrap();
        assert_eq!(quoted.gain, Gain::Value(100));
    }

    #[test]
    fn test_unknown_read() {
        let err = parse_block_header(&record(&["RFP:580", "610"]), &settings()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownRead { index: 1, .. }));

        let err = parse_block_header(&record(&["GFP:485", "528[3]"]), &settings()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownRead { index: 3, .. }));
    }
}
