//! Error types for the create and update phases

use thiserror::Error;

use crate::store::StoreError;
use crate::update::Partition;

pub type ChurnResult<T> = std::result::Result<T, ChurnError>;

/// Every variant is fatal for the run; nothing here is retried.
#[derive(Debug, Error)]
pub enum ChurnError {
    /// A create failed; objects created before it are left in the store
    #[error("creating object #{index} failed: {source}")]
    Creation {
        index: usize,
        #[source]
        source: StoreError,
    },

    #[error("listing objects failed: {0}")]
    Listing(#[source] StoreError),

    /// First update failure of the run, reported by the task owning `partition`
    #[error("updating objects in {partition} failed: {source}")]
    Mutation {
        partition: Partition,
        #[source]
        source: StoreError,
    },

    #[error("worker count must be greater than 0")]
    InvalidWorkers,

    #[error("worker task panicked: {0}")]
    TaskPanicked(String),
}

impl ChurnError {
    /// Underlying store failure, if this error came from the store
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            ChurnError::Creation { source, .. } => Some(source),
            ChurnError::Listing(source) => Some(source),
            ChurnError::Mutation { source, .. } => Some(source),
            ChurnError::InvalidWorkers | ChurnError::TaskPanicked(_) => None,
        }
    }
}
