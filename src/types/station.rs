//! Defines the station identifiers and batch groupings that make up a daily cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a climatological weather station (e.g., "20004002").
///
/// Station ids are supplied by the batch partition and never interpreted by the
/// pipeline beyond being passed to the remote API and used as the record key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An ordered group of stations processed together before the next batch starts.
///
/// Batches are always processed strictly one after another, so the size of a
/// batch bounds how many commands can be outstanding against the quota at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Batch {
    stations: Vec<StationId>,
}

impl Batch {
    pub fn new(stations: Vec<StationId>) -> Self {
        Self { stations }
    }

    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl FromIterator<StationId> for Batch {
    fn from_iter<T: IntoIterator<Item = StationId>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
