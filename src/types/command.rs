//! Provider command handles and the result of polling one.

use crate::types::record::WeatherRow;
use serde::Deserialize;
use std::fmt;

/// Provider-issued handle for an accepted "prepare a file" request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct CommandId(String);

impl CommandId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one poll of an outstanding command. Consumed immediately, never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// The file was produced; one row per data line.
    Ready(Vec<WeatherRow>),
    /// Not produced yet, poll again in a later pass.
    Pending,
    /// Permanently failed, the command is abandoned.
    Failed,
}
