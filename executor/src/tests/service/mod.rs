use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use executor_chain_client_interface::ChainClientError;
use futures::StreamExt;
use rstest::*;

use crate::core::client::queue::memory::InMemoryJobQueue;
use crate::core::client::queue::{BrokerStatus, JobQueue, MockJobQueue, QueueError};
use crate::service::{ExecutionService, ExecutionServiceError};
use crate::tests::common::{execution_request, job_data, receipt};
use crate::tests::config::{TestConfigBuilder, TestServices};
use crate::types::jobs::{Job, JobData, JobProgress, JobStatus, JobStreamEvent, ListenerId, TracingOptions};
use crate::types::request::ExecutionRequest;

#[fixture]
async fn service() -> (Arc<ExecutionService>, Arc<InMemoryJobQueue>) {
    let TestServices { config, memory_queue } = TestConfigBuilder::new().build();
    let service = ExecutionService::new(&config).await.expect("service should start");
    (Arc::new(service), memory_queue)
}

async fn leased_job(queue: &InMemoryJobQueue, data: JobData) -> String {
    let id = queue.enqueue(data).await.unwrap().id;
    queue.next_job().await.unwrap().expect("job was just enqueued");
    id
}

#[rstest]
#[case::not_hex("0xz6cbd7d76bc5baca530c875663711b947efa6a86a900a9e8645ce32e5821484e")]
#[case::missing_prefix("c6cbd7d76bc5baca530c875663711b947efa6a86a900a9e8645ce32e5821484e")]
#[case::too_short("0x1234")]
#[tokio::test]
async fn refuses_to_start_with_an_invalid_private_key(#[case] private_key: &str) {
    let services = TestConfigBuilder::new().configure_private_key(private_key).build();

    let result = ExecutionService::new(&services.config).await;
    assert_matches!(result, Err(ExecutionServiceError::InvalidPrivateKey(ChainClientError::WalletInvalidPrivateKey)));
}

#[rstest]
#[tokio::test]
async fn refuses_to_start_without_a_broker() {
    let mut queue = MockJobQueue::new();
    queue.expect_status().times(4).returning(|| BrokerStatus::Reconnecting);
    let services = TestConfigBuilder::new().configure_queue(Arc::new(queue)).build();

    let result = ExecutionService::new(&services.config).await;
    assert_matches!(
        result,
        Err(ExecutionServiceError::Queue(QueueError::BrokerNotAvailable(BrokerStatus::Reconnecting)))
    );
}

#[rstest]
#[tokio::test]
async fn execute_enqueues_a_waiting_job(
    #[future] service: (Arc<ExecutionService>, Arc<InMemoryJobQueue>),
    execution_request: ExecutionRequest,
) {
    let (service, _) = service.await;
    let tracing_options = TracingOptions {
        traceparent: Some("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".to_string()),
        tracestate: None,
    };

    let enqueued = service.execute(execution_request.clone(), tracing_options.clone()).await.unwrap();

    let job = service.get_job_by_id(&enqueued.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Waiting);
    assert_eq!(job.data.request, execution_request);
    assert_eq!(job.data.tracing_options, Some(tracing_options));
}

#[rstest]
#[tokio::test]
async fn get_job_by_id_reports_unknown_jobs(#[future] service: (Arc<ExecutionService>, Arc<InMemoryJobQueue>)) {
    let (service, _) = service.await;
    assert_matches!(
        service.get_job_by_id("unknown").await,
        Err(ExecutionServiceError::Queue(QueueError::JobNotFound { .. }))
    );
}

#[rstest]
#[tokio::test]
async fn subscription_streams_progress_then_completion(
    #[future] service: (Arc<ExecutionService>, Arc<InMemoryJobQueue>),
    job_data: JobData,
) {
    let (service, queue) = service.await;
    let id = leased_job(&queue, job_data).await;

    let mut subscription = service.subscribe_to_job_by_id(&id).await.unwrap();
    assert_eq!(queue.listener_count(), 1);

    queue.report_progress(&id, JobProgress::CertificateFound).await.unwrap();
    queue.report_progress(&id, JobProgress::Confirmed).await.unwrap();
    queue.complete(&id, receipt(true)).await.unwrap();

    assert_matches!(subscription.next().await, Some(Ok(JobStreamEvent::Progress(50))));
    assert_matches!(subscription.next().await, Some(Ok(JobStreamEvent::Progress(100))));
    assert_matches!(subscription.next().await, Some(Ok(JobStreamEvent::Completed(result))) if result == receipt(true));
    assert_matches!(subscription.next().await, None);
    assert_eq!(queue.listener_count(), 0);
}

#[rstest]
#[tokio::test]
async fn subscription_ends_with_the_failure_reason(
    #[future] service: (Arc<ExecutionService>, Arc<InMemoryJobQueue>),
    job_data: JobData,
) {
    let (service, queue) = service.await;
    let id = leased_job(&queue, job_data).await;

    let mut subscription = service.subscribe_to_job_by_id(&id).await.unwrap();
    queue.fail(&id, "Contract // Invalid contract!").await.unwrap();

    assert_matches!(
        subscription.next().await,
        Some(Err(ExecutionServiceError::JobFailed(reason))) if reason == "Contract // Invalid contract!"
    );
    assert_matches!(subscription.next().await, None);
    assert_eq!(queue.listener_count(), 0);
}

#[rstest]
#[tokio::test]
async fn subscription_ignores_other_jobs(
    #[future] service: (Arc<ExecutionService>, Arc<InMemoryJobQueue>),
    job_data: JobData,
) {
    let (service, queue) = service.await;
    let watched = leased_job(&queue, job_data.clone()).await;
    let other = leased_job(&queue, job_data).await;

    let mut subscription = service.subscribe_to_job_by_id(&watched).await.unwrap();
    queue.report_progress(&other, JobProgress::CertificateFound).await.unwrap();
    queue.complete(&other, receipt(true)).await.unwrap();

    let next = tokio::time::timeout(Duration::from_millis(50), subscription.next()).await;
    assert!(next.is_err(), "no event of the watched job was emitted");
}

#[rstest]
#[tokio::test]
async fn subscribing_to_a_settled_job_yields_only_the_terminal_item(
    #[future] service: (Arc<ExecutionService>, Arc<InMemoryJobQueue>),
    job_data: JobData,
) {
    let (service, queue) = service.await;
    let completed = leased_job(&queue, job_data.clone()).await;
    queue.complete(&completed, receipt(true)).await.unwrap();
    let failed = leased_job(&queue, job_data).await;
    queue.fail(&failed, "boom").await.unwrap();

    let items = service.subscribe_to_job_by_id(&completed).await.unwrap().collect::<Vec<_>>().await;
    assert_matches!(items.as_slice(), [Ok(JobStreamEvent::Completed(_))]);

    let items = service.subscribe_to_job_by_id(&failed).await.unwrap().collect::<Vec<_>>().await;
    assert_matches!(items.as_slice(), [Err(ExecutionServiceError::JobFailed(reason))] if reason == "boom");

    assert_eq!(queue.listener_count(), 0);
}

#[rstest]
#[tokio::test]
async fn dropping_a_subscription_removes_its_listener(
    #[future] service: (Arc<ExecutionService>, Arc<InMemoryJobQueue>),
    job_data: JobData,
) {
    let (service, queue) = service.await;
    let id = leased_job(&queue, job_data).await;

    let subscription = service.subscribe_to_job_by_id(&id).await.unwrap();
    assert_eq!(queue.listener_count(), 1);

    drop(subscription);
    assert_eq!(queue.listener_count(), 0);

    // events after the consumer left reach nobody
    queue.complete(&id, receipt(true)).await.unwrap();
}

#[rstest]
#[tokio::test]
async fn subscribing_to_an_unknown_job_fails_immediately(
    #[future] service: (Arc<ExecutionService>, Arc<InMemoryJobQueue>),
) {
    let (service, queue) = service.await;

    let result = service.subscribe_to_job_by_id("unknown").await;
    assert_matches!(result, Err(ExecutionServiceError::Queue(QueueError::JobNotFound { .. })));
    assert_eq!(queue.listener_count(), 0);
}

/// Stored records of a job processed by another executor instance, one per read. The last one
/// is returned for every further read.
fn records_of_remote_job(job_data: JobData) -> VecDeque<Job> {
    let waiting = Job::new("remote".to_string(), job_data);
    let active = Job { status: JobStatus::Active, attempts_made: 1, ..waiting.clone() };
    let certified = Job { progress: JobProgress::CertificateFound.value(), ..active.clone() };
    let completed = Job {
        status: JobStatus::Completed,
        progress: JobProgress::Confirmed.value(),
        return_value: Some(receipt(true)),
        ..certified.clone()
    };
    VecDeque::from([waiting, active.clone(), active, certified.clone(), certified, completed])
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn subscription_settles_from_stored_records_without_queue_events(job_data: JobData) {
    let records = Arc::new(Mutex::new(records_of_remote_job(job_data)));
    let mut queue = MockJobQueue::new();
    queue.expect_status().returning(|| BrokerStatus::Ready);
    queue.expect_fetch_by_id().returning(move |_| {
        let mut records = records.lock().unwrap();
        let record = if records.len() > 1 { records.pop_front() } else { records.front().cloned() };
        Ok(record.expect("records are never empty"))
    });
    // the listener is registered but the job runs elsewhere, so it never fires
    queue.expect_on_event().times(1).returning(|_| ListenerId(1));
    queue.expect_remove_listener().times(1).return_const(());

    let services = TestConfigBuilder::new()
        .configure_queue(Arc::new(queue))
        .configure_subscription_refresh(Duration::from_millis(100))
        .build();
    let service = ExecutionService::new(&services.config).await.unwrap();

    let subscription = service.subscribe_to_job_by_id("remote").await.unwrap();
    let items = tokio::time::timeout(Duration::from_secs(5), subscription.collect::<Vec<_>>())
        .await
        .expect("subscription should settle");

    assert_matches!(
        items.as_slice(),
        [Ok(JobStreamEvent::Progress(50)), Ok(JobStreamEvent::Completed(result))] if *result == receipt(true)
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn subscription_does_not_repeat_progress_seen_by_both_sources(
    #[future] service: (Arc<ExecutionService>, Arc<InMemoryJobQueue>),
    job_data: JobData,
) {
    let (service, queue) = service.await;
    let id = leased_job(&queue, job_data).await;

    let mut subscription = service.subscribe_to_job_by_id(&id).await.unwrap();
    queue.report_progress(&id, JobProgress::CertificateFound).await.unwrap();
    assert_matches!(subscription.next().await, Some(Ok(JobStreamEvent::Progress(50))));

    // several refresh periods pass while the stored progress stays at 50
    let next = tokio::time::timeout(Duration::from_secs(5), subscription.next()).await;
    assert!(next.is_err(), "progress 50 was yielded once");

    queue.complete(&id, receipt(true)).await.unwrap();
    assert_matches!(subscription.next().await, Some(Ok(JobStreamEvent::Completed(_))));
    assert_matches!(subscription.next().await, None);
}
