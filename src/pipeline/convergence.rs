//! Drains one batch: create a command per station, then poll the outstanding
//! commands in passes until every station is resolved or the pass budget is spent.

use crate::pipeline::report::BatchReport;
use crate::publish::EventPublisher;
use crate::retrieval::Retriever;
use crate::types::command::{CommandId, RetrievalOutcome};
use crate::types::record::{StationRecords, WeatherRow};
use crate::types::station::{Batch, StationId};
use crate::types::window::RetrievalWindow;
use futures_util::future::join_all;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Retrieval state of one station within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandState {
    Outstanding(CommandId),
    Published,
    Failed,
}

/// Station => command state for the batch being processed. Rebuilt for every batch,
/// holds at most one entry (so at most one outstanding command) per station.
#[derive(Debug, Default)]
pub struct CommandBook {
    entries: Vec<(StationId, CommandState)>,
    attempted: usize,
}

impl CommandBook {
    fn insert(&mut self, station: StationId, command: CommandId) {
        self.entries
            .push((station, CommandState::Outstanding(command)));
    }

    fn outstanding(&self) -> Vec<(usize, StationId, CommandId)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, (station, state))| match state {
                CommandState::Outstanding(command) => {
                    Some((index, station.clone(), command.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn outstanding_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, state)| matches!(state, CommandState::Outstanding(_)))
            .count()
    }

    pub fn state(&self, station: &StationId) -> Option<&CommandState> {
        self.entries
            .iter()
            .find(|(s, _)| s == station)
            .map(|(_, state)| state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct stations a command was requested for, accepted or not.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs the command-then-poll protocol for a batch.
pub struct BatchProcessor {
    retriever: Arc<Retriever>,
    publisher: Arc<dyn EventPublisher>,
    records_topic: String,
    max_passes: u32,
    pass_cooldown: Duration,
}

impl BatchProcessor {
    pub fn new(
        retriever: Arc<Retriever>,
        publisher: Arc<dyn EventPublisher>,
        records_topic: impl Into<String>,
        max_passes: u32,
        pass_cooldown: Duration,
    ) -> Self {
        Self {
            retriever,
            publisher,
            records_topic: records_topic.into(),
            max_passes,
            pass_cooldown,
        }
    }

    /// Processes `batch` to completion. Failures are isolated per station and only
    /// show up in the returned report.
    pub async fn process(&self, batch: &Batch, window: &RetrievalWindow) -> BatchReport {
        let mut report = BatchReport {
            stations: batch.len(),
            ..BatchReport::default()
        };

        let mut book = self.create_commands(batch, window).await;
        report.commands = book.len();
        report.rejected = book.attempted() - book.len();

        self.converge(&mut book, &mut report).await;
        report
    }

    /// Issues a command for every station. Creation fully completes before any poll.
    pub async fn create_commands(&self, batch: &Batch, window: &RetrievalWindow) -> CommandBook {
        let mut stations: Vec<&StationId> = Vec::with_capacity(batch.len());
        for station in batch.stations() {
            if stations.contains(&station) {
                warn!("[station {}] Listed twice in batch, ignoring duplicate", station);
            } else {
                stations.push(station);
            }
        }

        let attempted = stations.len();
        let results = join_all(stations.into_iter().map(|station| async move {
            (station, self.retriever.create_command(station, window).await)
        }))
        .await;

        let mut book = CommandBook {
            attempted,
            ..CommandBook::default()
        };
        for (station, result) in results {
            match result {
                Ok(command) => book.insert(station.clone(), command),
                Err(_) => info!("[station {}] No command => not polled this cycle", station),
            }
        }
        book
    }

    /// Polls outstanding commands pass after pass. Always ends within `max_passes`.
    pub async fn converge(&self, book: &mut CommandBook, report: &mut BatchReport) {
        for pass in 1..=self.max_passes {
            let outstanding = book.outstanding();
            if outstanding.is_empty() {
                break;
            }
            info!(
                "=== Retrieval pass {}/{} ({} commands) ===",
                pass,
                self.max_passes,
                outstanding.len()
            );
            report.passes = pass;

            let resolved = join_all(outstanding.into_iter().map(|(index, station, command)| {
                async move {
                    let state = self.poll_station(&station, &command).await;
                    (index, state)
                }
            }))
            .await;

            for (index, state) in resolved {
                match state {
                    CommandState::Published => report.published += 1,
                    CommandState::Failed => report.failed += 1,
                    CommandState::Outstanding(_) => continue,
                }
                book.entries[index].1 = state;
            }

            let remaining = book.outstanding_count();
            if remaining == 0 {
                break;
            }
            if pass < self.max_passes {
                info!(
                    "{} commands still pending => waiting {:?}",
                    remaining, self.pass_cooldown
                );
                tokio::time::sleep(self.pass_cooldown).await;
            }
        }

        for (_, station, command) in book.outstanding() {
            warn!(
                "[station {}] Command {} still pending after {} passes, abandoned",
                station, command, self.max_passes
            );
            report.abandoned += 1;
        }
    }

    async fn poll_station(&self, station: &StationId, command: &CommandId) -> CommandState {
        match self.retriever.fetch_file(command).await {
            RetrievalOutcome::Ready(rows) => self.publish(station, command, rows).await,
            RetrievalOutcome::Pending => CommandState::Outstanding(command.clone()),
            RetrievalOutcome::Failed => {
                info!("[station {}] Command {} abandoned", station, command);
                CommandState::Failed
            }
        }
    }

    async fn publish(
        &self,
        station: &StationId,
        command: &CommandId,
        rows: Vec<WeatherRow>,
    ) -> CommandState {
        let row_count = rows.len();
        let records = StationRecords {
            station_id: station.clone(),
            rows,
        };
        let payload = match serde_json::to_value(&records) {
            Ok(payload) => payload,
            Err(e) => {
                error!("[station {}] Failed to encode records: {}", station, e);
                return CommandState::Failed;
            }
        };

        match self
            .publisher
            .publish(&self.records_topic, Some(station.as_str()), payload)
            .await
        {
            Ok(()) => {
                info!(
                    "[station {}] {} rows published => command={}",
                    station, row_count, command
                );
                CommandState::Published
            }
            Err(e) => {
                error!("[station {}] Failed to publish records: {}", station, e);
                CommandState::Failed
            }
        }
    }
}
