//! Reference dataset loading
//!
//! The reference file is read fully into memory once at setup.
//! Supported formats: `.csv` (header row + delimited records) and
//! `.json` (array of objects). Anything else fails setup synchronously.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::DriftError;
use crate::logic::features::FeatureValue;

/// Column-oriented view of the reference file
pub struct ReferenceDataset {
    columns: HashMap<String, Vec<FeatureValue>>,
    rows: usize,
}

impl ReferenceDataset {
    pub fn load(path: &Path) -> Result<Self, DriftError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let dataset = match ext.as_str() {
            "csv" => Self::load_csv(path)?,
            "json" => Self::load_json(path)?,
            other => return Err(DriftError::UnsupportedReferenceFormat(other.to_string())),
        };

        if dataset.rows == 0 {
            return Err(DriftError::EmptyReference);
        }
        log::info!(
            "Loaded reference dataset {:?}: {} rows, {} columns",
            path,
            dataset.rows,
            dataset.columns.len()
        );
        Ok(dataset)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&[FeatureValue]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    /// Cells are split on every comma; quoted fields are not supported.
    fn load_csv(path: &Path) -> Result<Self, DriftError> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();

        let header_line = match lines.next() {
            Some(line) => line?,
            None => return Err(DriftError::EmptyReference),
        };
        let header: Vec<String> = header_line.split(',').map(|s| s.trim().to_string()).collect();

        let mut columns: HashMap<String, Vec<FeatureValue>> =
            header.iter().map(|name| (name.clone(), Vec::new())).collect();
        let mut rows = 0usize;

        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split(',').collect();
            if cells.len() != header.len() {
                return Err(DriftError::Other(format!(
                    "CSV row {} has {} cells, header has {}",
                    rows + 1,
                    cells.len(),
                    header.len()
                )));
            }
            for (name, cell) in header.iter().zip(cells) {
                let cell = cell.trim();
                let value = match cell.parse::<f64>() {
                    Ok(num) => FeatureValue::Scalar(num),
                    Err(_) => FeatureValue::Categorical(cell.to_string()),
                };
                if let Some(col) = columns.get_mut(name) {
                    col.push(value);
                }
            }
            rows += 1;
        }

        Ok(Self { columns, rows })
    }

    fn load_json(path: &Path) -> Result<Self, DriftError> {
        let file = File::open(path)?;
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_reader(BufReader::new(file))?;

        let mut columns: HashMap<String, Vec<FeatureValue>> = HashMap::new();
        for (row, record) in records.iter().enumerate() {
            for (name, raw) in record {
                let value = json_to_value(raw).ok_or_else(|| {
                    DriftError::Other(format!(
                        "Unsupported JSON value for column '{}' at row {}",
                        name, row
                    ))
                })?;
                let column = columns.entry(name.clone()).or_default();
                if column.len() != row {
                    return Err(DriftError::MissingColumn(name.clone()));
                }
                column.push(value);
            }
        }

        let rows = records.len();
        for (name, column) in &columns {
            if column.len() != rows {
                return Err(DriftError::MissingColumn(name.clone()));
            }
        }
        Ok(Self { columns, rows })
    }
}

fn json_to_value(raw: &serde_json::Value) -> Option<FeatureValue> {
    match raw {
        serde_json::Value::Number(n) => n.as_f64().map(FeatureValue::Scalar),
        serde_json::Value::String(s) => Some(FeatureValue::Categorical(s.clone())),
        serde_json::Value::Array(items) => {
            let mut vector = Vec::with_capacity(items.len());
            for item in items {
                vector.push(item.as_f64()?);
            }
            Some(FeatureValue::Vector(vector))
        }
        _ => None,
    }
}
