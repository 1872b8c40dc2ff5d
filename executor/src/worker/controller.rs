use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Fuse, FusedFuture, FutureExt};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument, Span};

use crate::core::client::queue::{JobQueue, QueueError};
use crate::types::jobs::Job;
use crate::utils::instrument::link_remote_parent;
use crate::worker::processor::ExecutionProcessor;
use crate::{ExecutorError, ExecutorResult};

/// Pause after the queue failed to hand out a job
const QUEUE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Runs up to `concurrency` jobs at a time until cancelled.
pub struct WorkerController {
    cancellation_token: CancellationToken,
    task_handle: JoinHandle<()>,
}

impl WorkerController {
    pub fn start(
        processor: Arc<ExecutionProcessor>,
        queue: Arc<dyn JobQueue>,
        concurrency: usize,
        cancellation_token: CancellationToken,
    ) -> Self {
        let token = cancellation_token.clone();
        let task_handle = tokio::spawn(
            async move { run(processor, queue, concurrency.max(1), token).await }.instrument(info_span!("worker")),
        );
        Self { cancellation_token, task_handle }
    }

    /// Stops leasing new jobs and waits for the running ones to settle.
    pub async fn shutdown(self) -> ExecutorResult<()> {
        info!("Initiating worker graceful shutdown");
        self.cancellation_token.cancel();
        self.task_handle.await.map_err(|e| ExecutorError::WorkerError(e.to_string()))
    }
}

fn job_span(job: &Job) -> Span {
    let span = info_span!("execute_job", job_id = %job.id, subnet_id = %job.data.request.subnet_id);
    if let Some(options) = &job.data.tracing_options {
        link_remote_parent(&span, options);
    }
    span
}

fn handle_task_result(result: Result<Result<(), QueueError>, JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Failed to settle job"),
        Err(e) => error!(error = %e, "Job task aborted"),
    }
}

async fn lease_job(queue: Arc<dyn JobQueue>) -> Result<Option<Job>, QueueError> {
    queue.next_job().await
}

fn spawn_job(tasks: &mut JoinSet<Result<(), QueueError>>, processor: &Arc<ExecutionProcessor>, job: Job) {
    debug!(job_id = %job.id, active = tasks.len() + 1, "Received job from queue");
    let processor = processor.clone();
    let span = job_span(&job);
    tasks.spawn(async move { processor.process(&job).await }.instrument(span));
}

/// A lease in flight may already hold a delivery or have marked its job active, so it is kept
/// across loop iterations and awaited on shutdown instead of being dropped.
async fn run(
    processor: Arc<ExecutionProcessor>,
    queue: Arc<dyn JobQueue>,
    concurrency: usize,
    cancellation_token: CancellationToken,
) {
    let mut tasks = JoinSet::new();
    let mut lease: Fuse<BoxFuture<'static, Result<Option<Job>, QueueError>>> = Fuse::terminated();
    info!(concurrency, "Starting execution worker");

    loop {
        if lease.is_terminated() && tasks.len() < concurrency {
            lease = lease_job(queue.clone()).boxed().fuse();
        }

        tokio::select! {
            biased;

            Some(result) = tasks.join_next(), if !tasks.is_empty() => handle_task_result(result),

            _ = cancellation_token.cancelled() => {
                info!("Shutdown signal received, breaking from main loop");
                break;
            }

            next = &mut lease, if !lease.is_terminated() => match next {
                Ok(Some(job)) => spawn_job(&mut tasks, &processor, job),
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Error receiving job");
                    tokio::time::sleep(QUEUE_ERROR_BACKOFF).await;
                }
            },
        }
    }

    if !lease.is_terminated() {
        debug!("Waiting for the lease in flight");
        match (&mut lease).await {
            Ok(Some(job)) => spawn_job(&mut tasks, &processor, job),
            Ok(None) => {}
            Err(e) => error!(error = %e, "Error receiving job"),
        }
    }

    info!(remaining = tasks.len(), "Waiting for remaining jobs to settle");
    while let Some(result) = tasks.join_next().await {
        handle_task_result(result);
    }
    info!("All jobs settled, worker shutdown complete");
}
