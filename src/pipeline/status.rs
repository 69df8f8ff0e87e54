use crate::publish::EventPublisher;
use crate::types::status::{Status, StatusSignal};
use log::{error, info};
use std::sync::Arc;

/// Publishes the busy/free lock shared with the sibling observation producer.
///
/// Signals are fire-and-forget: a failed publish is logged, never retried, and does
/// not stop the cycle.
pub struct StatusCoordinator {
    publisher: Arc<dyn EventPublisher>,
    topic: String,
}

impl StatusCoordinator {
    pub fn new(publisher: Arc<dyn EventPublisher>, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }

    pub async fn signal_busy(&self) {
        self.signal(Status::Busy).await;
    }

    pub async fn signal_free(&self) {
        self.signal(Status::Free).await;
    }

    async fn signal(&self, status: Status) {
        let payload = match serde_json::to_value(StatusSignal::now(status)) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode '{}' signal: {}", status, e);
                return;
            }
        };
        match self.publisher.publish(&self.topic, None, payload).await {
            Ok(()) => info!("Signal '{}' published on topic '{}'", status, self.topic),
            Err(e) => error!("Failed to publish '{}' signal: {}", status, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingPublisher;

    #[tokio::test]
    async fn publishes_unkeyed_status_messages() {
        let publisher = Arc::new(RecordingPublisher::default());
        let coordinator = StatusCoordinator::new(publisher.clone(), "climatologique-status");

        coordinator.signal_busy().await;
        coordinator.signal_free().await;

        let events = publisher.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].topic, "climatologique-status");
        assert_eq!(events[0].key, None);
        assert_eq!(events[0].payload["status"], "busy");
        assert_eq!(events[1].payload["status"], "free");
        assert!(events[1].payload["timestamp"]
            .as_str()
            .is_some_and(|t| t.ends_with('Z')));
    }

    #[tokio::test]
    async fn publish_failure_does_not_panic() {
        let publisher = Arc::new(RecordingPublisher::failing());
        let coordinator = StatusCoordinator::new(publisher.clone(), "status");
        coordinator.signal_busy().await;
        assert!(publisher.events().is_empty());
    }
}
