use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("Failed to read batch file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode batch file '{0}'")]
    Decode(PathBuf, #[source] serde_json::Error),

    #[error("Batch file '{0}' contains no batches")]
    Empty(PathBuf),

    #[error("Batch {batch} position {position} in '{path}' has an empty station id")]
    BlankStationId {
        path: PathBuf,
        batch: usize,
        position: usize,
    },

    // the batch file is decoded on a blocking thread
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
