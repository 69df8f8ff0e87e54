use crate::quota::QuotaGovernor;
use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces requests by a fixed interval (2.5s keeps us under 50 requests/minute).
///
/// Each caller reserves the next free slot and sleeps until it, so concurrent
/// callers are serialized onto the same timeline. A penalty pushes that timeline
/// forward for everybody.
pub struct FixedSpacingGovernor {
    spacing: Duration,
    penalty: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl FixedSpacingGovernor {
    pub fn new(spacing: Duration, penalty: Duration) -> Self {
        Self {
            spacing,
            penalty,
            next_slot: Mutex::new(None),
        }
    }

    async fn reserve(&self) -> Instant {
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = next_slot.map_or(now, |next| next.max(now));
        *next_slot = Some(slot + self.spacing);
        slot
    }
}

#[async_trait]
impl QuotaGovernor for FixedSpacingGovernor {
    async fn pace(&self) {
        let slot = self.reserve().await;
        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!("Pacing request by {:?}", wait);
        }
        sleep_until(slot).await;
    }

    async fn penalize(&self) {
        let resume_at = {
            let mut next_slot = self.next_slot.lock().await;
            let penalty_end = Instant::now() + self.penalty;
            let resume_at = next_slot.map_or(penalty_end, |next| next.max(penalty_end));
            *next_slot = Some(resume_at);
            resume_at
        };
        warn!("Quota exhausted, holding requests for {:?}", self.penalty);
        sleep_until(resume_at).await;
    }
}
