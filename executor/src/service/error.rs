use executor_chain_client_interface::ChainClientError;
use thiserror::Error;

use crate::core::client::queue::QueueError;

#[derive(Error, Debug)]
pub enum ExecutionServiceError {
    #[error("{0}")]
    InvalidPrivateKey(#[from] ChainClientError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Terminal item of a subscription to a failed job, carries the job's failure reason
    #[error("{0}")]
    JobFailed(String),

    #[error("Job {0} completed without a result")]
    MissingResult(String),
}
