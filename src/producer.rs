//! The daily cycle: load the partition, take the quota lock, drain every batch and
//! release the lock.

use crate::api::RetrievalApi;
use crate::config::PipelineSettings;
use crate::error::ProducerError;
use crate::pipeline::convergence::BatchProcessor;
use crate::pipeline::report::CycleReport;
use crate::pipeline::sequencer::BatchSequencer;
use crate::pipeline::status::StatusCoordinator;
use crate::publish::EventPublisher;
use crate::retrieval::gate::RequestGate;
use crate::retrieval::Retriever;
use crate::stations::partition::BatchPartition;
use crate::types::window::RetrievalWindow;
use bon::bon;
use chrono::{DateTime, Utc};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

/// Retrieves yesterday's certified hourly records for every station of the batch
/// file and publishes them, one station per message.
///
/// # Examples
///
/// ```no_run
/// use climato_producer::api::http_client::ClimatologyClient;
/// use climato_producer::publish::JsonLinesPublisher;
/// use climato_producer::producer::ClimatologicalProducer;
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), climato_producer::error::ProducerError> {
/// let client = ClimatologyClient::builder()
///     .base_url("https://public-api.meteofrance.fr/public/DPClim/v1")
///     .api_key("secret")
///     .build()?;
/// let producer = ClimatologicalProducer::builder()
///     .api(Arc::new(client))
///     .publisher(Arc::new(JsonLinesPublisher::stdout()))
///     .batch_file("utils/batches.json")
///     .build();
/// let report = producer.run_cycle().await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub struct ClimatologicalProducer {
    batch_file: PathBuf,
    settings: PipelineSettings,
    sequencer: BatchSequencer,
    status: StatusCoordinator,
}

#[bon]
impl ClimatologicalProducer {
    /// Wires the pipeline around `api` and `publisher`. Every request of the cycle
    /// goes through one shared governor, so the quota is accounted for globally.
    #[builder]
    pub fn new(
        api: Arc<dyn RetrievalApi>,
        publisher: Arc<dyn EventPublisher>,
        #[builder(into)] batch_file: PathBuf,
        settings: Option<PipelineSettings>,
    ) -> Self {
        let settings = settings.unwrap_or_default();
        let gate = Arc::new(RequestGate::new(
            settings.quota.build(),
            settings.max_in_flight,
        ));
        let retriever = Arc::new(Retriever::new(
            api,
            gate,
            settings.retry,
            settings.delimiter,
        ));
        let processor = BatchProcessor::new(
            retriever,
            publisher.clone(),
            settings.topics.records.clone(),
            settings.max_passes,
            settings.pass_cooldown,
        );
        let sequencer = BatchSequencer::new(processor, settings.batch_cooldown);
        let status = StatusCoordinator::new(publisher, settings.topics.status.clone());

        Self {
            batch_file,
            settings,
            sequencer,
            status,
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, ProducerError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Runs one cycle as if started at `now`, which fixes the retrieval window.
    ///
    /// The partition is loaded before the lock is taken: if it cannot be read, no
    /// status signal is sent at all.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport, ProducerError> {
        let partition = match BatchPartition::load(&self.batch_file).await {
            Ok(partition) => partition,
            Err(e) => {
                error!("Cannot start cycle: {}", e);
                return Err(e.into());
            }
        };
        let window = RetrievalWindow::for_cycle(now, self.settings.cutoff);
        Ok(self.run_batches(&partition, &window).await)
    }

    /// Drains `partition` over `window` between a busy and a free signal.
    pub async fn run_batches(
        &self,
        partition: &BatchPartition,
        window: &RetrievalWindow,
    ) -> CycleReport {
        info!(
            "Climatological cycle over {} ({} batches, {} stations)",
            window,
            partition.batches().len(),
            partition.station_count()
        );

        self.status.signal_busy().await;
        info!("Letting the quota refill for {:?}", self.settings.quota_refresh);
        tokio::time::sleep(self.settings.quota_refresh).await;

        let report = CycleReport {
            batches: self.sequencer.run(partition.batches(), window).await,
        };

        info!("Letting the quota refill for {:?}", self.settings.quota_refresh);
        tokio::time::sleep(self.settings.quota_refresh).await;
        self.status.signal_free().await;

        info!("Cycle done: {}", report);
        report
    }
}
