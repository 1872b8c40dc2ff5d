use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use executor_chain_client_interface::ExecutionReceipt;
use rstest::*;
use tokio_util::sync::CancellationToken;

use crate::core::client::queue::memory::InMemoryJobQueue;
use crate::core::client::queue::{BrokerStatus, JobEventListener, JobQueue, QueueError};
use crate::tests::common::{connector_for, executing_chain_client, job_data};
use crate::tests::config::TestConfigBuilder;
use crate::types::jobs::{EnqueuedJob, Job, JobData, JobProgress, JobStatus, ListenerId};
use crate::types::params::WorkerParams;
use crate::worker::initialize_worker;

/// Takes `delay` to return a job after leasing it, like a lease written to a remote store.
struct SlowLeaseQueue {
    inner: Arc<InMemoryJobQueue>,
    delay: Duration,
}

#[async_trait]
impl JobQueue for SlowLeaseQueue {
    async fn status(&self) -> BrokerStatus {
        self.inner.status().await
    }

    async fn enqueue(&self, data: JobData) -> Result<EnqueuedJob, QueueError> {
        self.inner.enqueue(data).await
    }

    async fn find_job(&self, id: &str) -> Result<Option<Job>, QueueError> {
        self.inner.find_job(id).await
    }

    async fn list_failed(&self) -> Result<Vec<Job>, QueueError> {
        self.inner.list_failed().await
    }

    async fn next_job(&self) -> Result<Option<Job>, QueueError> {
        let job = self.inner.next_job().await?;
        if job.is_some() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(job)
    }

    async fn report_progress(&self, id: &str, progress: JobProgress) -> Result<(), QueueError> {
        self.inner.report_progress(id, progress).await
    }

    async fn complete(&self, id: &str, result: ExecutionReceipt) -> Result<(), QueueError> {
        self.inner.complete(id, result).await
    }

    async fn fail(&self, id: &str, reason: &str) -> Result<(), QueueError> {
        self.inner.fail(id, reason).await
    }

    fn on_event(&self, listener: JobEventListener) -> ListenerId {
        self.inner.on_event(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.inner.remove_listener(id)
    }
}

async fn wait_until_completed(queue: &dyn JobQueue, ids: &[String]) {
    loop {
        let mut settled = 0;
        for id in ids {
            if queue.fetch_by_id(id).await.unwrap().status == JobStatus::Completed {
                settled += 1;
            }
        }
        if settled == ids.len() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[rstest]
#[tokio::test]
async fn worker_settles_every_enqueued_job(job_data: JobData) {
    let services = TestConfigBuilder::new()
        .configure_chain_connector(connector_for(executing_chain_client()))
        .configure_worker(WorkerParams { concurrency: 2, ..WorkerParams::default() })
        .build();
    let queue = services.memory_queue.clone();

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(queue.enqueue(job_data.clone()).await.unwrap().id);
    }

    let controller = initialize_worker(services.config.clone(), CancellationToken::new());

    tokio::time::timeout(Duration::from_secs(10), wait_until_completed(queue.as_ref(), &ids))
        .await
        .expect("jobs should complete");

    controller.shutdown().await.unwrap();
}

#[rstest]
#[tokio::test]
async fn worker_stops_on_cancellation() {
    let services = TestConfigBuilder::new().build();
    let token = CancellationToken::new();
    let controller = initialize_worker(services.config.clone(), token.clone());

    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), controller.shutdown())
        .await
        .expect("worker should stop")
        .unwrap();
}

#[rstest]
#[tokio::test]
async fn jobs_leased_while_others_finish_are_processed(job_data: JobData) {
    let memory_queue = Arc::new(InMemoryJobQueue::new(Duration::from_millis(20)));
    let queue = Arc::new(SlowLeaseQueue { inner: memory_queue.clone(), delay: Duration::from_millis(50) });
    let services = TestConfigBuilder::new()
        .configure_queue(queue)
        .configure_chain_connector(connector_for(executing_chain_client()))
        .configure_worker(WorkerParams { concurrency: 2, ..WorkerParams::default() })
        .build();

    let mut ids = Vec::new();
    for _ in 0..6 {
        ids.push(memory_queue.enqueue(job_data.clone()).await.unwrap().id);
    }

    let controller = initialize_worker(services.config.clone(), CancellationToken::new());

    tokio::time::timeout(Duration::from_secs(10), wait_until_completed(memory_queue.as_ref(), &ids))
        .await
        .expect("no leased job should be left active");

    controller.shutdown().await.unwrap();
}

#[rstest]
#[tokio::test]
async fn shutdown_processes_the_job_leased_in_flight(job_data: JobData) {
    let memory_queue = Arc::new(InMemoryJobQueue::new(Duration::from_millis(20)));
    let queue = Arc::new(SlowLeaseQueue { inner: memory_queue.clone(), delay: Duration::from_millis(200) });
    let services = TestConfigBuilder::new()
        .configure_queue(queue)
        .configure_chain_connector(connector_for(executing_chain_client()))
        .build();
    let id = memory_queue.enqueue(job_data).await.unwrap().id;

    let controller = initialize_worker(services.config.clone(), CancellationToken::new());
    // the job is leased but not handed to the worker yet
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(memory_queue.fetch_by_id(&id).await.unwrap().status, JobStatus::Active);

    tokio::time::timeout(Duration::from_secs(5), controller.shutdown()).await.expect("worker should stop").unwrap();

    assert_eq!(memory_queue.fetch_by_id(&id).await.unwrap().status, JobStatus::Completed);
}
