use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlError;
use omniqueue::QueueError as OmniQueueError;
use thiserror::Error;

use super::BrokerStatus;
use crate::core::client::database::DatabaseError;
use crate::types::jobs::JobStatus;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Job // A job with the provided id could not be found!")]
    JobNotFound { id: String },

    #[error("Queue // Broker is not available (status: {0})")]
    BrokerNotAvailable(BrokerStatus),

    #[error("Job {id} progress cannot go from {current} back to {requested}")]
    ProgressRegression { id: String, current: u8, requested: u8 },

    #[error("Job {id} already finished with status {status}")]
    JobAlreadyFinished { id: String, status: JobStatus },

    #[error("Job {id} is not leased by a worker (status: {status})")]
    JobNotActive { id: String, status: JobStatus },

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Failed to get queue url: {0}")]
    GetQueueUrlError(#[from] SdkError<GetQueueUrlError>),

    #[error("Queue backend error: {0}")]
    ErrorFromQueueError(#[from] OmniQueueError),

    #[error("Failed to get queue url for queue name : {0}")]
    FailedToGetQueueUrl(String),

    #[error("Failed to serialize queue message: {0}")]
    SerdeError(#[from] serde_json::Error),
}
