use crate::quota::QuotaGovernor;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// The single entry point for outbound requests: caps how many are in flight at once
/// and paces each one through the quota governor.
///
/// Station operations may run concurrently, but only their waits overlap; with the
/// default of one permit, requests themselves are strictly sequential.
pub struct RequestGate {
    permits: Semaphore,
    governor: Arc<dyn QuotaGovernor>,
}

impl RequestGate {
    pub fn new(governor: Arc<dyn QuotaGovernor>, max_in_flight: usize) -> Self {
        Self {
            permits: Semaphore::new(max_in_flight.max(1)),
            governor,
        }
    }

    /// Paces and sends one request while holding an in-flight permit.
    pub async fn send<F, Fut, T>(&self, request: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        // The semaphore is never closed, so acquiring only fails in theory.
        let _permit = self.permits.acquire().await.ok();
        self.governor.pace().await;
        request().await
    }

    /// Waits out a quota-exhaustion cooldown. No permit is held meanwhile.
    pub async fn penalize(&self) {
        self.governor.penalize().await;
    }
}
