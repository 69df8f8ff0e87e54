use crate::api::error::ApiError;
use crate::config::ConfigError;
use crate::stations::error::PartitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
