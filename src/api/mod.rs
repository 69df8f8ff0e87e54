//! The remote climatological retrieval API, consumed through two operations:
//! creating a command for a station/window, and fetching the file a command produced.

pub mod error;
pub mod http_client;

use crate::types::command::CommandId;
use crate::types::station::StationId;
use crate::types::window::RetrievalWindow;
use async_trait::async_trait;
use error::ApiError;

/// Raw status and body of a provider response. Classification of the status is
/// left to the caller, since the same code means different things per endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait RetrievalApi: Send + Sync {
    /// Asks the provider to prepare the hourly file of `station` over `window`.
    async fn create_command(
        &self,
        station: &StationId,
        window: &RetrievalWindow,
    ) -> Result<ApiResponse, ApiError>;

    /// Fetches the file prepared for `command`, if it is ready.
    async fn fetch_file(&self, command: &CommandId) -> Result<ApiResponse, ApiError>;
}
