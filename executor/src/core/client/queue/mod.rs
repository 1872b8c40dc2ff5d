pub mod error;
pub mod event;
pub mod memory;
pub mod sqs;

use async_trait::async_trait;
pub use error::QueueError;
pub use event::{JobEventBus, JobEventListener};
use executor_chain_client_interface::ExecutionReceipt;
use tracing::{info, warn};

use crate::types::jobs::{EnqueuedJob, Job, JobData, JobProgress, ListenerId};
use crate::types::params::BrokerHealthCheck;

/// Connection status of the queue broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BrokerStatus {
    Connecting,
    Reconnecting,
    Ready,
    End,
}

/// Durable at-least-once job queue. A leased job is delivered to one consumer at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn status(&self) -> BrokerStatus;

    /// Persists a new waiting job. Succeeds without any consumer running.
    async fn enqueue(&self, data: JobData) -> Result<EnqueuedJob, QueueError>;

    /// Looks the job up in the primary index only.
    async fn find_job(&self, id: &str) -> Result<Option<Job>, QueueError>;

    async fn list_failed(&self) -> Result<Vec<Job>, QueueError>;

    /// Looks the job up in the primary index, then in the failed set.
    async fn fetch_by_id(&self, id: &str) -> Result<Job, QueueError> {
        if let Some(job) = self.find_job(id).await? {
            return Ok(job);
        }
        self.list_failed()
            .await?
            .into_iter()
            .find(|job| job.id == id)
            .ok_or_else(|| QueueError::JobNotFound { id: id.to_string() })
    }

    /// Leases the next waiting job, marking it active. Returns `None` when nothing arrived
    /// within the backend's wait time.
    async fn next_job(&self) -> Result<Option<Job>, QueueError>;

    /// Raises the progress of an active job. Reporting the current value again is a no-op.
    async fn report_progress(&self, id: &str, progress: JobProgress) -> Result<(), QueueError>;

    async fn complete(&self, id: &str, result: ExecutionReceipt) -> Result<(), QueueError>;

    async fn fail(&self, id: &str, reason: &str) -> Result<(), QueueError>;

    /// Registers a listener called for every event of every job.
    fn on_event(&self, listener: JobEventListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// Waits for the broker to become ready, re-checking at most `check.retries` times while it is
/// still connecting.
pub async fn verify_broker_availability(queue: &dyn JobQueue, check: BrokerHealthCheck) -> Result<(), QueueError> {
    let mut status = queue.status().await;
    let mut retries = 0;

    loop {
        match status {
            BrokerStatus::Ready => {
                info!("✅ Queue broker is ready");
                return Ok(());
            }
            BrokerStatus::Connecting | BrokerStatus::Reconnecting if retries < check.retries => {
                retries += 1;
                warn!(status = %status, retry = retries, max_retries = check.retries, "Queue broker not ready yet");
                tokio::time::sleep(check.interval).await;
                status = queue.status().await;
            }
            status => return Err(QueueError::BrokerNotAvailable(status)),
        }
    }
}
