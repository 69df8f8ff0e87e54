//! Outbound events: station records and busy/free status signals.
//!
//! Delivery guarantees belong to the messaging system behind [`EventPublisher`];
//! the pipeline publishes and moves on.

pub mod json_lines;

use async_trait::async_trait;
use thiserror::Error;

pub use json_lines::JsonLinesPublisher;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to encode event for topic '{0}'")]
    Encode(String, #[source] serde_json::Error),

    #[error("Failed to write event for topic '{0}'")]
    Write(String, #[source] std::io::Error),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Appends one message to `topic`, optionally keyed.
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: serde_json::Value,
    ) -> Result<(), PublishError>;
}

/// Topic names the pipeline publishes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// One message per station with its verified rows.
    pub records: String,
    /// Busy/free lock shared with the sibling observation producer.
    pub status: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            records: "weather-verified".to_string(),
            status: "climatologique-status".to_string(),
        }
    }
}
