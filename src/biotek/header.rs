//! Reconstruction of per-read filter settings from the export header.
//!
//! Each `Filter Set` declaration is followed by exactly two lines: the
//! excitation/emission pair and the optics/gain line, e.g.
//!
//! ```text
//! Read,GFP
//! ,Filter Set 1
//! ,"    Excitation: 485/20,  Emission: 528/20"
//! ,"    Optics: Top,  Gain: 61"
//! ```
//!
//! Older exports split the pair across two cells:
//! `,Excitation: 485/20,Emission: 528/20`.

use std::collections::HashMap;

use csv::StringRecord;
use serde::Serialize;

use super::error::ParseError;
use crate::table::{Gain, AUTOSCALE_TOKEN};

/// Read name the reader prints for its synthetic endpoint read
pub const ENDPOINT_READ_NAME: &str = "Fluorescence Endpoint";

/// Filter configuration of one fluorescence channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadSetting {
    /// Read name (empty for the endpoint read)
    pub name: String,
    /// Excitation wavelength in nm
    pub excitation: i32,
    /// Emission wavelength in nm
    pub emission: i32,
    /// Detector gain
    pub gain: Gain,
}

/// Read settings keyed by read name, in declaration order per name
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadSettings {
    by_name: HashMap<String, Vec<ReadSetting>>,
}

impl ReadSettings {
    /// Append a setting under its read name
    pub fn push(&mut self, setting: ReadSetting) {
        self.by_name.entry(setting.name.clone()).or_default().push(setting);
    }

    /// Setting for `name` at 0-based occurrence `index`
    pub fn get(&self, name: &str, index: usize) -> Option<&ReadSetting> {
        self.by_name.get(name).and_then(|settings| settings.get(index))
    }

    /// Number of filter sets declared for `name`
    pub fn count(&self, name: &str) -> usize {
        self.by_name.get(name).map(|s| s.len()).unwrap_or(0)
    }

    /// Total number of settings
    pub fn len(&self) -> usize {
        self.by_name.values().map(|s| s.len()).sum()
    }

    /// True when no filter set has been declared
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Raw line content for error messages
pub(crate) fn line_content(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",")
}

pub(crate) fn line_number(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Read name from the second cell of a `Read` line
pub(crate) fn read_name(cell: &str) -> String {
    let cell = cell.trim();
    if cell == ENDPOINT_READ_NAME {
        String::new()
    } else {
        cell.to_string()
    }
}

/// Wavelength from a `Label: 485/20` fragment
fn wavelength(fragment: &str) -> Option<i32> {
    fragment
        .rsplit(':')
        .next()?
        .split('/')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Parse the excitation/emission line that follows a `Filter Set` declaration.
pub(crate) fn parse_wavelengths(record: &StringRecord) -> Result<(i32, i32), ParseError> {
    let structural = |reason: &str| ParseError::structural(record, reason);

    let cell = record.get(1).unwrap_or("");
    let parts: Vec<&str> = cell.split(',').collect();

    let excitation = wavelength(parts[0]).ok_or_else(|| structural("unreadable excitation wavelength"))?;
    let emission_fragment = if parts.len() == 1 {
        record.get(2).unwrap_or("")
    } else {
        parts[1]
    };
    let emission = wavelength(emission_fragment).ok_or_else(|| structural("unreadable emission wavelength"))?;

    Ok((excitation, emission))
}

/// Parse the optics/gain line that follows the wavelength line.
pub(crate) fn parse_gain(record: &StringRecord) -> Result<Gain, ParseError> {
    let cell = record.get(1).unwrap_or("");
    let token = cell
        .rsplit(',')
        .next()
        .and_then(|fragment| fragment.rsplit(':').next())
        .unwrap_or("")
        .trim();

    if token == AUTOSCALE_TOKEN {
        return Ok(Gain::AutoScale);
    }
    token
        .parse::<i32>()
        .map(Gain::Value)
        .map_err(|_| ParseError::structural(record, "unreadable gain"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn test_wavelengths_single_cell() {
        let r = record(&["", "    Excitation: 485/20,  Emission: 528/20", ""]);
        assert_eq!(parse_wavelengths(&r).unwrap(), (485, 528));
    }

    #[test]
    fn test_wavelengths_split_cells() {
        let r = record(&["", "Excitation: 580/9", "Emission: 610/20"]);
        assert_eq!(parse_wavelengths(&r).unwrap(), (580, 610));
    }

    #[test]
    fn test_wavelengths_malformed() {
        let r = record(&["", "Excitation: ???", "Emission: 610/20"]);
        let err = parse_wavelengths(&r).unwrap_err();
        assert!(err.to_string().contains("Excitation: ???"));
    }

    #[test]
    fn test_gain_forms() {
        assert_eq!(parse_gain(&record(&["", "    Optics: Top,  Gain: 61"])).unwrap(), Gain::Value(61));
        assert_eq!(parse_gain(&record(&["", "Gain: 100"])).unwrap(), Gain::Value(100));
        assert_eq!(parse_gain(&record(&["", "Optics: Top,  Gain: AutoScale"])).unwrap(), Gain::AutoScale);
        assert!(parse_gain(&record(&["", "Optics: Top"])).is_err());
    }

    #[test]
    fn test_endpoint_read_name() {
        assert_eq!(read_name("Fluorescence Endpoint"), "");
        assert_eq!(read_name(" GFP "), "GFP");
    }

    #[test]
    fn test_read_settings_occurrences() {
        let mut settings = ReadSettings::default();
        for gain in [61, 100] {
            settings.push(ReadSetting {
                name: "GFP".to_string(),
                excitation: 485,
                emission: 528,
                gain: Gain::Value(gain),
            });
        }
        assert_eq!(settings.count("GFP"), 2);
        assert_eq!(settings.get("GFP", 1).unwrap().gain, Gain::Value(100));
        assert!(settings.get("GFP", 2).is_none());
        assert!(settings.get("RFP", 0).is_none());
        assert_eq!(settings.len(), 2);
    }
}
