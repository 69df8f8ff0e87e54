use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Request to {0} timed out")]
    Timeout(String),
}

impl ApiError {
    /// Whether a retry of the same request may succeed (network errors and timeouts).
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::NetworkRequest(..) | ApiError::Timeout(_))
    }
}
