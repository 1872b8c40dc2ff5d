pub mod error;
pub mod subscription;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use error::ExecutionServiceError;
use executor_chain_client_interface::parse_private_key;
pub use subscription::{JobSubscription, SubscriptionItem};
use tracing::info;

use crate::core::client::queue::{verify_broker_availability, JobQueue};
use crate::core::config::Config;
use crate::types::jobs::{EnqueuedJob, Job, JobData, TracingOptions};
use crate::types::request::ExecutionRequest;
use crate::utils::metrics::ExecutorMetrics;

/// Entry point of the public API: turns execution requests into jobs and exposes their state.
pub struct ExecutionService {
    queue: Arc<dyn JobQueue>,
    metrics: Arc<ExecutorMetrics>,
    subscription_refresh: Duration,
}

impl fmt::Debug for ExecutionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionService")
            .field("subscription_refresh", &self.subscription_refresh)
            .finish_non_exhaustive()
    }
}

impl ExecutionService {
    /// Fails when the configured private key is malformed or when the queue broker does not
    /// become ready within the health check bound.
    pub async fn new(config: &Config) -> Result<Self, ExecutionServiceError> {
        parse_private_key(&config.chain().private_key)?;
        verify_broker_availability(config.queue().as_ref(), config.health_check()).await?;
        Ok(Self {
            queue: config.queue(),
            metrics: config.metrics(),
            subscription_refresh: config.server_config().subscription_refresh,
        })
    }

    pub async fn execute(
        &self,
        request: ExecutionRequest,
        tracing_options: TracingOptions,
    ) -> Result<EnqueuedJob, ExecutionServiceError> {
        let enqueued = self.queue.enqueue(JobData::new(request, tracing_options)).await?;
        self.metrics.jobs_enqueued.add(1, &[]);
        info!(job_id = %enqueued.id, "📤 Execution job enqueued");
        Ok(enqueued)
    }

    pub async fn get_job_by_id(&self, id: &str) -> Result<Job, ExecutionServiceError> {
        Ok(self.queue.fetch_by_id(id).await?)
    }

    /// Fails right away when the job does not exist.
    pub async fn subscribe_to_job_by_id(&self, id: &str) -> Result<JobSubscription, ExecutionServiceError> {
        Ok(JobSubscription::open(self.queue.clone(), id, self.subscription_refresh).await?)
    }
}
