//! # Calibration Data
//!
//! Static conversion factors from raw fluorescence to molar concentration,
//! keyed by fluorophore, plate reader and gain. Factors were measured with
//! purified protein standards on each reader; a missing entry simply means the
//! reading stays in arbitrary fluorescence units.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::table::Gain;

/// Plate readers with known calibration data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlateReader {
    /// Serial 268449
    B1,
    /// Serial 271275
    B2,
    /// Serial 1402031D
    B3,
}

/// Reader serial numbers as printed in the export preamble.
const PLATE_READER_SERIALS: [(&str, PlateReader); 3] = [
    ("268449", PlateReader::B1),
    ("271275", PlateReader::B2),
    ("1402031D", PlateReader::B3),
];

impl PlateReader {
    /// Resolve a reader from its serial number.
    pub fn from_serial(serial: &str) -> Option<Self> {
        let serial = serial.trim();
        PLATE_READER_SERIALS
            .iter()
            .find(|(s, _)| *s == serial)
            .map(|(_, reader)| *reader)
    }

    /// Internal short code (`b1`, `b2`, `b3`).
    pub fn code(&self) -> &'static str {
        match self {
            PlateReader::B1 => "b1",
            PlateReader::B2 => "b2",
            PlateReader::B3 => "b3",
        }
    }
}

impl fmt::Display for PlateReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for PlateReader {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "b1" => Ok(PlateReader::B1),
            "b2" => Ok(PlateReader::B2),
            "b3" => Ok(PlateReader::B3),
            _ => Err(format!("Unknown plate reader code '{}'", s)),
        }
    }
}

/// One calibration factor: raw units per micromolar-in-10uL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationEntry {
    /// Canonical fluorophore name
    pub fluorophore: &'static str,
    /// Reader the factor was measured on
    pub reader: PlateReader,
    /// Gain the factor was measured at
    pub gain: i32,
    /// Conversion factor
    pub factor: f64,
}

const fn entry(fluorophore: &'static str, reader: PlateReader, gain: i32, factor: f64) -> CalibrationEntry {
    CalibrationEntry {
        fluorophore,
        reader,
        gain,
        factor,
    }
}

use PlateReader::{B1, B2, B3};

static CALIBRATION_DATA: [CalibrationEntry; 36] = [
    entry("GFP", B3, 61, 2261.0),
    entry("GFP", B3, 100, 80850.0),
    entry("GFP", B2, 61, 1762.0),
    entry("GFP", B2, 100, 62732.0),
    entry("GFP", B1, 61, 1517.0),
    entry("GFP", B1, 100, 53258.0),
    entry("Citrine", B3, 61, 2379.0),
    entry("Citrine", B3, 100, 82680.0),
    entry("Citrine", B2, 61, 1849.0),
    entry("Citrine", B2, 100, 64985.0),
    entry("Citrine", B1, 61, 1487.0),
    entry("Citrine", B1, 100, 51725.0),
    entry("RFP", B3, 61, 70.38),
    entry("RFP", B3, 100, 2541.0),
    entry("RFP", B2, 61, 67.64),
    entry("RFP", B2, 100, 2392.0),
    entry("RFP", B1, 61, 47.96),
    entry("RFP", B1, 100, 1689.0),
    entry("CFP", B3, 61, 578.0),
    entry("CFP", B3, 100, 20722.0),
    entry("CFP", B2, 61, 513.0),
    entry("CFP", B2, 100, 18136.0),
    entry("CFP", B1, 61, 387.0),
    entry("CFP", B1, 100, 13809.0),
    entry("Venus", B3, 61, 2246.0),
    entry("Venus", B3, 100, 79955.0),
    entry("Venus", B2, 61, 1742.0),
    entry("Venus", B2, 100, 61130.0),
    entry("Venus", B1, 61, 1455.0),
    entry("Venus", B1, 100, 50405.0),
    entry("Cherry", B3, 61, 79.39),
    entry("Cherry", B3, 100, 2850.0),
    entry("Cherry", B2, 61, 80.84),
    entry("Cherry", B2, 100, 2822.0),
    entry("Cherry", B1, 61, 51.07),
    entry("Cherry", B1, 100, 1782.0),
];

/// Process-wide, read-only calibration table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibrationTable;

impl CalibrationTable {
    /// All known calibration entries.
    pub fn entries(&self) -> &'static [CalibrationEntry] {
        &CALIBRATION_DATA
    }

    /// Look up the conversion factor for a fluorophore/reader/gain triple.
    ///
    /// Auto-scaled reads never have a factor.
    pub fn lookup(&self, fluorophore: &str, reader: PlateReader, gain: Gain) -> Option<f64> {
        let gain = match gain {
            Gain::Value(g) => g,
            Gain::AutoScale => return None,
        };
        CALIBRATION_DATA
            .iter()
            .find(|e| e.fluorophore == fluorophore && e.reader == reader && e.gain == gain)
            .map(|e| e.factor)
    }

    /// Convert a raw reading to micromolar.
    ///
    /// `raw` should already be `f64::INFINITY` for overflowed wells; infinity
    /// propagates through the division. `volume_ul` must be positive.
    pub fn convert(
        &self,
        raw: f64,
        fluorophore: &str,
        reader: Option<PlateReader>,
        gain: Gain,
        volume_ul: f64,
    ) -> Option<f64> {
        let factor = self.lookup(fluorophore, reader?, gain)?;
        Some(raw * 10.0 / factor / volume_ul)
    }
}

/// Convert a double-stranded DNA concentration from ng/uL to nM.
///
/// Uses 660 g/mol per base pair.
pub fn dna_ng_per_ul_to_nm(concentration_ng_ul: f64, length_bp: f64) -> f64 {
    concentration_ng_ul * 1e6 / (660.0 * length_bp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_lookup() {
        assert_eq!(PlateReader::from_serial("268449"), Some(PlateReader::B1));
        assert_eq!(PlateReader::from_serial(" 1402031D "), Some(PlateReader::B3));
        assert_eq!(PlateReader::from_serial("999999"), None);
        assert_eq!(PlateReader::B2.to_string(), "b2");
    }

    #[test]
    fn test_lookup() {
        let table = CalibrationTable;
        assert_eq!(table.lookup("GFP", PlateReader::B1, Gain::Value(61)), Some(1517.0));
        assert_eq!(table.lookup("RFP", PlateReader::B3, Gain::Value(61)), Some(70.38));
        assert_eq!(table.lookup("GFP", PlateReader::B1, Gain::Value(75)), None);
        assert_eq!(table.lookup("GFP", PlateReader::B1, Gain::AutoScale), None);
        assert_eq!(table.lookup("mScarlet", PlateReader::B1, Gain::Value(61)), None);
    }

    #[test]
    fn test_convert_unit_factor() {
        let table = CalibrationTable;
        let um = table
            .convert(1517.0, "GFP", Some(PlateReader::B1), Gain::Value(61), 10.0)
            .unwrap();
        assert!((um - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_convert_overflow_and_unknown_reader() {
        let table = CalibrationTable;
        let um = table
            .convert(f64::INFINITY, "GFP", Some(PlateReader::B1), Gain::Value(61), 10.0)
            .unwrap();
        assert!(um.is_infinite() && um > 0.0);
        assert_eq!(table.convert(100.0, "GFP", None, Gain::Value(61), 10.0), None);
    }

    #[test]
    fn test_every_fluorophore_has_six_entries() {
        for name in ["GFP", "Citrine", "RFP", "CFP", "Venus", "Cherry"] {
            let count = CalibrationTable.entries().iter().filter(|e| e.fluorophore == name).count();
            assert_eq!(count, 6, "{}", name);
        }
    }

    #[test]
    fn test_dna_conversion() {
        let nm = dna_ng_per_ul_to_nm(100.0, 1000.0);
        assert!((nm - 151.5152).abs() < 1e-4);
    }
}
