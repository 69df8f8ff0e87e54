pub mod api;
pub mod config;
pub mod error;
pub mod parsing;
pub mod pipeline;
pub mod producer;
pub mod publish;
pub mod quota;
pub mod retrieval;
pub mod stations;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::ProducerError;
pub use producer::ClimatologicalProducer;

pub use api::error::ApiError;
pub use api::http_client::ClimatologyClient;
pub use api::{ApiResponse, RetrievalApi};

pub use config::{api_token_from_env, ConfigError, PipelineSettings, ProducerConfig};

pub use pipeline::report::{BatchReport, CycleReport};
pub use publish::{EventPublisher, JsonLinesPublisher, PublishError, Topics};
pub use quota::{FixedSpacingGovernor, LimiterKind, QuotaGovernor, QuotaPolicy, SlidingWindowGovernor};
pub use retrieval::error::RetrievalError;
pub use retrieval::RetryPolicy;

pub use stations::error::PartitionError;
pub use stations::partition::BatchPartition;

pub use types::command::{CommandId, RetrievalOutcome};
pub use types::record::{CellValue, StationRecords, WeatherRow};
pub use types::station::{Batch, StationId};
pub use types::status::{Status, StatusSignal};
pub use types::window::{RetrievalWindow, WindowSpan};
