use thiserror::Error;
use tokio::task::JoinError;
use trunner_core::QueueError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("producer task failed: {0}")]
    Producer(#[from] JoinError),
}
