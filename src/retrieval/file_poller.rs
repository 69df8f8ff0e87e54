use crate::parsing::table::parse_table;
use crate::retrieval::{excerpt, Retriever};
use crate::types::command::{CommandId, RetrievalOutcome};
use log::{error, info};

/// How the file endpoint's statuses are handled (429 is dealt with upstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileStatus {
    Ready,
    NotReady,
    Failed,
    Unexpected,
}

fn classify(status: u16) -> FileStatus {
    match status {
        201 => FileStatus::Ready,
        // 404 here means "not produced yet", not "unknown command"
        204 | 404 => FileStatus::NotReady,
        401 | 410 | 500 | 507 => FileStatus::Failed,
        _ => FileStatus::Unexpected,
    }
}

impl Retriever {
    /// Polls the file prepared for `command` once (plus quota and transport retries).
    pub async fn fetch_file(&self, command: &CommandId) -> RetrievalOutcome {
        let context = format!("[command {}]", command);
        let response = match self
            .send_with_retry(&context, || self.api.fetch_file(command))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("{} Giving up: {}", context, e);
                return RetrievalOutcome::Failed;
            }
        };

        match classify(response.status) {
            FileStatus::Ready => match parse_table(&response.body, self.delimiter) {
                Ok(rows) => {
                    info!("{} File ready => {} rows", context, rows.len());
                    RetrievalOutcome::Ready(rows)
                }
                Err(e) => {
                    error!(
                        "{} File ready but unreadable: {} => {}",
                        context,
                        e,
                        excerpt(&response.body)
                    );
                    RetrievalOutcome::Failed
                }
            },
            FileStatus::NotReady => {
                info!(
                    "{} {} => not produced yet, retrying next pass",
                    context, response.status
                );
                RetrievalOutcome::Pending
            }
            FileStatus::Failed => {
                error!(
                    "{} Error {} => {}",
                    context,
                    response.status,
                    excerpt(&response.body)
                );
                RetrievalOutcome::Failed
            }
            FileStatus::Unexpected => {
                error!(
                    "{} Unexpected status {} => {}",
                    context,
                    response.status,
                    excerpt(&response.body)
                );
                RetrievalOutcome::Failed
            }
        }
    }
}
