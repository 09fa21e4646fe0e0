use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Storage for a new work item could not be reserved.
    #[error("failed to allocate storage for a work item: {0}")]
    Alloc(#[from] TryReserveError),
}

pub type Result<T> = std::result::Result<T, QueueError>;
