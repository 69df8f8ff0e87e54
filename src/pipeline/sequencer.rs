use crate::pipeline::convergence::BatchProcessor;
use crate::pipeline::report::BatchReport;
use crate::types::station::Batch;
use crate::types::window::RetrievalWindow;
use log::info;
use std::time::Duration;

/// Runs batches strictly one after another with a cooldown in between, so that no
/// two batches ever draw on the quota at the same time.
pub struct BatchSequencer {
    processor: BatchProcessor,
    batch_cooldown: Duration,
}

impl BatchSequencer {
    pub fn new(processor: BatchProcessor, batch_cooldown: Duration) -> Self {
        Self {
            processor,
            batch_cooldown,
        }
    }

    pub async fn run(&self, batches: &[Batch], window: &RetrievalWindow) -> Vec<BatchReport> {
        let mut reports = Vec::with_capacity(batches.len());
        for (index, batch) in batches.iter().enumerate() {
            info!("=== Batch {}/{} started ===", index + 1, batches.len());
            let report = self.processor.process(batch, window).await;
            info!("=== Batch {}/{} done: {} ===", index + 1, batches.len(), report);
            reports.push(report);

            if index + 1 < batches.len() {
                info!(
                    "Pausing {:?} before batch {}",
                    self.batch_cooldown,
                    index + 2
                );
                tokio::time::sleep(self.batch_cooldown).await;
            }
        }
        reports
    }
}
