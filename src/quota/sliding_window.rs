use crate::quota::QuotaGovernor;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use log::warn;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Allows up to `requests_per_minute` requests in any rolling minute (GCRA), instead
/// of a fixed gap between every two requests.
pub struct SlidingWindowGovernor {
    limiter: DefaultDirectRateLimiter,
    penalty: Duration,
    blocked_until: Mutex<Option<Instant>>,
}

impl SlidingWindowGovernor {
    pub fn new(requests_per_minute: u32, penalty: Duration) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
            penalty,
            blocked_until: Mutex::new(None),
        }
    }

    async fn wait_out_penalty(&self) {
        let blocked_until = *self.blocked_until.lock().await;
        if let Some(until) = blocked_until {
            sleep_until(until).await;
        }
    }
}

#[async_trait]
impl QuotaGovernor for SlidingWindowGovernor {
    async fn pace(&self) {
        self.wait_out_penalty().await;
        self.limiter.until_ready().await;
    }

    async fn penalize(&self) {
        {
            let mut blocked_until = self.blocked_until.lock().await;
            let penalty_end = Instant::now() + self.penalty;
            *blocked_until = Some(blocked_until.map_or(penalty_end, |b| b.max(penalty_end)));
        }
        warn!("Quota exhausted, holding requests for {:?}", self.penalty);
        self.wait_out_penalty().await;
    }
}
