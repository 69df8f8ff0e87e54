use crate::api::error::ApiError;
use thiserror::Error;

/// Why a station or command was given up on. Always terminal for this cycle.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Provider rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Unexpected status {status} from provider: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Command accepted but no command id in response: {body}")]
    MalformedAcceptance {
        body: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Request still failing after {attempts} attempts")]
    TransportExhausted {
        attempts: u32,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Api(ApiError),
}
