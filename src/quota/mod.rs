//! Request pacing against the provider's global quota.
//!
//! The provider enforces roughly 50 requests per minute, shared with the sibling
//! observation producer. Nothing counts requests here: a governor spaces requests
//! out ([`QuotaGovernor::pace`]) and backs off hard when the provider reports the
//! quota as exhausted ([`QuotaGovernor::penalize`]).

pub mod fixed;
pub mod sliding_window;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub use fixed::FixedSpacingGovernor;
pub use sliding_window::SlidingWindowGovernor;

#[async_trait]
pub trait QuotaGovernor: Send + Sync {
    /// Waits until the next request may be sent. Called once before every request.
    async fn pace(&self);

    /// Waits out the quota-exhaustion cooldown. Requests paced by other callers
    /// are held back until the cooldown has elapsed as well.
    async fn penalize(&self);
}

/// Which governor implementation a pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterKind {
    /// Fixed minimum spacing between requests.
    #[default]
    Fixed,
    /// Token-bucket limiter over a rolling minute.
    SlidingWindow,
}

/// Parameters for building a [`QuotaGovernor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaPolicy {
    pub kind: LimiterKind,
    pub request_spacing: Duration,
    pub requests_per_minute: u32,
    pub penalty: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            kind: LimiterKind::Fixed,
            request_spacing: Duration::from_millis(2500),
            requests_per_minute: 50,
            penalty: Duration::from_secs(90),
        }
    }
}

impl QuotaPolicy {
    pub fn build(&self) -> Arc<dyn QuotaGovernor> {
        match self.kind {
            LimiterKind::Fixed => Arc::new(FixedSpacingGovernor::new(
                self.request_spacing,
                self.penalty,
            )),
            LimiterKind::SlidingWindow => Arc::new(SlidingWindowGovernor::new(
                self.requests_per_minute,
                self.penalty,
            )),
        }
    }
}
