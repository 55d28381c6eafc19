use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::{CellValue, Gain, TableError, TidyRow, TidyTable, TrajectoryTable};
use crate::schema;

fn invalid(column: &str, value: &str, line: u64) -> TableError {
    TableError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
        line,
    }
}

fn parse_number(column: &str, value: &str, line: u64) -> Result<f64, TableError> {
    match CellValue::parse(value) {
        CellValue::Missing => Ok(f64::NAN),
        cell => cell.as_f64().ok_or_else(|| invalid(column, value, line)),
    }
}

fn parse_wavelength(column: &str, value: &str, line: u64) -> Result<i32, TableError> {
    match CellValue::parse(value).as_f64() {
        Some(v) if v.is_finite() => Ok(v.round() as i32),
        _ => Err(invalid(column, value, line)),
    }
}

impl TidyTable {
    /// Read a tidy table from a CSV file
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a tidy table from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();
        let core_matches = header.len() >= schema::CORE_COLUMNS.len()
            && schema::CORE_COLUMNS
                .iter()
                .zip(header.iter())
                .all(|(expected, found)| found.trim() == *expected);
        if !core_matches {
            return Err(TableError::BadHeader {
                expected: schema::CORE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: header,
            });
        }

        let extra_columns: Vec<String> = header[schema::CORE_COLUMNS.len()..].to_vec();
        let mut table = TidyTable::new(extra_columns.clone());

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let cell = |i: usize| record.get(i).unwrap_or("");

            let gain = cell(1)
                .parse::<Gain>()
                .map_err(|_| invalid(schema::GAIN, cell(1), line))?;

            let mut extra = HashMap::with_capacity(extra_columns.len());
            for (offset, name) in extra_columns.iter().enumerate() {
                extra.insert(name.clone(), CellValue::parse(cell(schema::CORE_COLUMNS.len() + offset)));
            }

            table.push(TidyRow {
                channel: cell(0).to_string(),
                gain,
                time_sec: parse_number(schema::TIME_SEC, cell(2), line)?,
                time_hr: parse_number(schema::TIME_HR, cell(3), line)?,
                well: cell(4).to_string(),
                measurement: parse_number(schema::MEASUREMENT, cell(5), line)?,
                units: cell(6).to_string(),
                excitation: parse_wavelength(schema::EXCITATION, cell(7), line)?,
                emission: parse_wavelength(schema::EMISSION, cell(8), line)?,
                extra,
            });
        }

        Ok(table)
    }

    /// Write the table to a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let file = File::create(path)?;
        self.to_writer(BufWriter::new(file))
    }

    /// Write the table as CSV to any writer
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.columns())?;
        for row in self.rows() {
            csv_writer.write_record(row.to_record(self.extra_columns()))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl TrajectoryTable {
    /// Write the trajectories to a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let file = File::create(path)?;
        self.to_writer(BufWriter::new(file))
    }

    /// Write the trajectories as CSV (`Time, Well, <channels>...`)
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut header = vec![schema::TRAJECTORY_TIME.to_string(), schema::WELL.to_string()];
        header.extend(self.channels.iter().cloned());
        csv_writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.time_hr.to_string(), row.well.clone()];
            record.extend(row.values.iter().map(|v| v.to_string()));
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
