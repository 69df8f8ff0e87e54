//! Weather rows parsed from a provider file and the per-station message built from them.

use crate::types::station::StationId;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A single parsed cell of a provider table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// A numeric cell, decimal commas already normalized (`"12,5"` => `12.5`).
    Number(f64),
    /// Any non-numeric cell, kept verbatim.
    Text(String),
    /// A blank cell. Serialized as `null`.
    Missing,
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

/// One row of station data keyed by the table header, in header order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherRow {
    cells: Vec<(String, CellValue)>,
}

impl WeatherRow {
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for WeatherRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The unit published downstream: every row retrieved for one station in a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRecords {
    pub station_id: StationId,
    pub rows: Vec<WeatherRow>,
}
