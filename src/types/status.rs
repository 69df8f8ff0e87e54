//! Busy/free messages shared with the sibling observation producer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// This producer owns the quota window; the sibling must defer.
    Busy,
    /// Quota window released.
    Free,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Busy => f.write_str("busy"),
            Status::Free => f.write_str("free"),
        }
    }
}

/// A status message as published on the coordination topic.
///
/// Consumers treat the most recent message as the current lock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSignal {
    pub status: Status,
    #[serde(serialize_with = "serialize_utc")]
    pub timestamp: DateTime<Utc>,
}

impl StatusSignal {
    pub fn now(status: Status) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
        }
    }
}

fn serialize_utc<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
}
