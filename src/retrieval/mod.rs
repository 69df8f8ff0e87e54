//! The two-phase retrieval protocol: create a command per station, then poll the
//! command until the provider has produced the file.
//!
//! Both phases share the same failure handling:
//! - quota exhaustion (429) waits out the governor's penalty and re-sends, without
//!   consuming an attempt;
//! - transport failures are retried with a linear backoff, up to a fixed number
//!   of attempts;
//! - every other status is classified by the phase itself.

pub mod command;
pub mod error;
pub mod file_poller;
pub mod gate;

use crate::api::error::ApiError;
use crate::api::{ApiResponse, RetrievalApi};
use error::RetrievalError;
use gate::RequestGate;
use log::{error, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Status the provider answers with on both endpoints once the quota is spent.
pub const QUOTA_EXCEEDED: u16 = 429;

const BODY_EXCERPT_CHARS: usize = 200;

/// Retry behaviour for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before a transport failure becomes terminal.
    pub max_attempts: u32,
    /// Backoff unit; the wait after attempt `n` is `n * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// Issues paced requests against the retrieval API on behalf of the pipeline.
pub struct Retriever {
    api: Arc<dyn RetrievalApi>,
    gate: Arc<RequestGate>,
    retry: RetryPolicy,
    delimiter: u8,
}

impl Retriever {
    pub fn new(
        api: Arc<dyn RetrievalApi>,
        gate: Arc<RequestGate>,
        retry: RetryPolicy,
        delimiter: u8,
    ) -> Self {
        Self {
            api,
            gate,
            retry,
            delimiter,
        }
    }

    /// Sends a request until it yields a non-quota response, or transport failures
    /// run out of attempts. `context` prefixes every log line (e.g. `[station 42]`).
    async fn send_with_retry<F, Fut>(
        &self,
        context: &str,
        request: F,
    ) -> Result<ApiResponse, RetrievalError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<ApiResponse, ApiError>>,
    {
        let mut attempt = 0;
        loop {
            match self.gate.send(&request).await {
                Ok(response) if response.status == QUOTA_EXCEEDED => {
                    warn!("{} 429 => quota exceeded, backing off before retrying", context);
                    self.gate.penalize().await;
                }
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() => {
                    attempt += 1;
                    error!(
                        "{} Network error (attempt {}/{}): {}",
                        context, attempt, self.retry.max_attempts, e
                    );
                    if attempt >= self.retry.max_attempts {
                        return Err(RetrievalError::TransportExhausted {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                }
                Err(e) => return Err(RetrievalError::Api(e)),
            }
        }
    }
}

/// Shortens a response body for logs and error messages.
pub(crate) fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
