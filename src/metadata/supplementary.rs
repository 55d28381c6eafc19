use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::MetadataError;
use crate::schema;
use crate::table::CellValue;

/// Per-well metadata joined onto every tidy row.
///
/// The file is a CSV whose header is `[ignored, col1, col2, ...]` and whose
/// rows are `[well, val1, val2, ...]`. Values are typed once on load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplementaryMetadata {
    columns: Vec<String>,
    values: HashMap<String, HashMap<String, CellValue>>,
}

impl SupplementaryMetadata {
    /// Load supplementary metadata from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse supplementary metadata from a reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, MetadataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = csv_reader.records();
        let header = match records.next() {
            Some(record) => record?,
            None => return Err(MetadataError::MissingHeader),
        };

        let columns: Vec<String> = header.iter().skip(1).map(|c| c.trim().to_string()).collect();
        for (i, name) in columns.iter().enumerate() {
            if schema::is_core_column(name) {
                return Err(MetadataError::InvalidFormat(format!(
                    "column '{}' collides with a tidy table column",
                    name
                )));
            }
            if columns[..i].contains(name) {
                return Err(MetadataError::InvalidFormat(format!(
                    "duplicate column '{}'",
                    name
                )));
            }
        }

        let mut values: HashMap<String, HashMap<String, CellValue>> = columns
            .iter()
            .map(|name| (name.clone(), HashMap::new()))
            .collect();

        for record in records {
            let record = record?;
            let well = record.get(0).unwrap_or("").trim();
            if well.is_empty() {
                continue;
            }
            for (i, name) in columns.iter().enumerate() {
                // Short rows leave trailing columns empty
                let raw = record.get(i + 1).unwrap_or("");
                if let Some(column) = values.get_mut(name) {
                    column.insert(well.to_string(), CellValue::parse(raw));
                }
            }
        }

        log::info!(
            "Loaded supplementary metadata: {} columns, {} wells",
            columns.len(),
            values.values().next().map(|c| c.len()).unwrap_or(0)
        );

        Ok(Self { columns, values })
    }

    /// Metadata column names in load order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value of one column for one well
    pub fn get(&self, column: &str, well: &str) -> Option<&CellValue> {
        self.values.get(column).and_then(|c| c.get(well))
    }

    /// True when every metadata column has an entry for the well.
    ///
    /// A file with no metadata columns covers every well.
    pub fn covers(&self, well: &str) -> bool {
        self.values.values().all(|column| column.contains_key(well))
    }

    /// All metadata for one well, if every column covers it
    pub fn for_well(&self, well: &str) -> Option<HashMap<String, CellValue>> {
        if !self.covers(well) {
            return None;
        }
        let mut row = HashMap::with_capacity(self.columns.len());
        for name in &self.columns {
            if let Some(value) = self.get(name, well) {
                row.insert(name.clone(), value.clone());
            }
        }
        Some(row)
    }
}
