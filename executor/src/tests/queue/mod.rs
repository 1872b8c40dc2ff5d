
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use rstest::*;

use crate::core::client::queue::memory::InMemoryJobQueue;
use crate::core::client::queue::{verify_broker_availability, BrokerStatus, JobQueue, MockJobQueue, QueueError};
use crate::tests::common::{job_data, receipt};
use crate::types::jobs::{JobData, JobEvent, JobProgress, JobStatus};
use crate::types::params::BrokerHealthCheck;

#[fixture]
fn queue() -> InMemoryJobQueue {
    InMemoryJobQueue::new(Duration::from_millis(20))
}

fn record_events(queue: &InMemoryJobQueue) -> Arc<Mutex<Vec<JobEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    queue.on_event(Box::new(move |event| sink.lock().expect("events lock").push(event.clone())));
    events
}

#[rstest]
#[tokio::test]
async fn enqueue_persists_a_waiting_job(queue: InMemoryJobQueue, job_data: JobData) {
    let enqueued = queue.enqueue(job_data.clone()).await.unwrap();

    let job = queue.fetch_by_id(&enqueued.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Waiting);
    assert_eq!(job.progress, 0);
    assert_eq!(job.attempts_made, 0);
    assert_eq!(job.timestamp, enqueued.timestamp);
    assert_eq!(job.data, job_data);
}

#[rstest]
#[tokio::test]
async fn job_ids_are_unique(queue: InMemoryJobQueue, job_data: JobData) {
    let first = queue.enqueue(job_data.clone()).await.unwrap();
    let second = queue.enqueue(job_data).await.unwrap();
    assert_ne!(first.id, second.id);
}

#[rstest]
#[tokio::test]
async fn next_job_leases_jobs_in_submission_order(queue: InMemoryJobQueue, job_data: JobData) {
    let first = queue.enqueue(job_data.clone()).await.unwrap();
    let second = queue.enqueue(job_data).await.unwrap();

    let leased = queue.next_job().await.unwrap().expect("a waiting job");
    assert_eq!(leased.id, first.id);
    assert_eq!(leased.status, JobStatus::Active);
    assert_eq!(leased.attempts_made, 1);
    assert!(leased.processed_on.is_some());

    assert_eq!(queue.next_job().await.unwrap().map(|job| job.id), Some(second.id));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn next_job_returns_none_when_nothing_arrives(queue: InMemoryJobQueue) {
    assert_matches!(queue.next_job().await, Ok(None));
}

#[rstest]
#[tokio::test]
async fn next_job_wakes_up_on_enqueue(job_data: JobData) {
    let queue = Arc::new(InMemoryJobQueue::new(Duration::from_secs(30)));
    let consumer = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.next_job().await })
    };
    tokio::task::yield_now().await;

    let enqueued = queue.enqueue(job_data).await.unwrap();
    let leased = tokio::time::timeout(Duration::from_secs(5), consumer).await.unwrap().unwrap().unwrap();
    assert_eq!(leased.map(|job| job.id), Some(enqueued.id));
}

#[rstest]
#[tokio::test]
async fn progress_is_monotonic(queue: InMemoryJobQueue, job_data: JobData) {
    let id = queue.enqueue(job_data).await.unwrap().id;
    queue.next_job().await.unwrap();
    let events = record_events(&queue);

    queue.report_progress(&id, JobProgress::CertificateFound).await.unwrap();
    // same value again is a no-op
    queue.report_progress(&id, JobProgress::CertificateFound).await.unwrap();
    assert_matches!(
        queue.report_progress(&id, JobProgress::Queued).await,
        Err(QueueError::ProgressRegression { current: 50, requested: 0, .. })
    );
    queue.report_progress(&id, JobProgress::Confirmed).await.unwrap();

    assert_eq!(queue.fetch_by_id(&id).await.unwrap().progress, 100);
    let progress = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            JobEvent::Progress { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(progress, vec![50, 100]);
}

#[rstest]
#[tokio::test]
async fn progress_requires_an_active_job(queue: InMemoryJobQueue, job_data: JobData) {
    let id = queue.enqueue(job_data).await.unwrap().id;

    assert_matches!(
        queue.report_progress(&id, JobProgress::CertificateFound).await,
        Err(QueueError::JobNotActive { status: JobStatus::Waiting, .. })
    );
    assert_matches!(
        queue.report_progress("unknown", JobProgress::CertificateFound).await,
        Err(QueueError::JobNotFound { .. })
    );
}

#[rstest]
#[tokio::test]
async fn completion_is_applied_once(queue: InMemoryJobQueue, job_data: JobData) {
    let id = queue.enqueue(job_data).await.unwrap().id;
    queue.next_job().await.unwrap();
    let events = record_events(&queue);

    queue.complete(&id, receipt(true)).await.unwrap();
    assert_matches!(
        queue.complete(&id, receipt(true)).await,
        Err(QueueError::JobAlreadyFinished { status: JobStatus::Completed, .. })
    );
    assert_matches!(
        queue.fail(&id, "too late").await,
        Err(QueueError::JobAlreadyFinished { status: JobStatus::Completed, .. })
    );

    let job = queue.fetch_by_id(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.return_value, Some(receipt(true)));
    assert!(job.finished_on.is_some());
    assert_eq!(*events.lock().unwrap(), vec![JobEvent::Completed { job_id: id, result: receipt(true) }]);
}

#[rstest]
#[tokio::test]
async fn failed_jobs_move_to_the_failed_set(queue: InMemoryJobQueue, job_data: JobData) {
    let id = queue.enqueue(job_data).await.unwrap().id;
    queue.next_job().await.unwrap();
    let events = record_events(&queue);

    queue.fail(&id, "Contract // Invalid contract!").await.unwrap();

    assert_matches!(queue.find_job(&id).await, Ok(None));
    let failed = queue.list_failed().await.unwrap();
    assert_eq!(failed.len(), 1);

    let job = queue.fetch_by_id(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.failed_reason.as_deref(), Some("Contract // Invalid contract!"));
    assert_eq!(
        *events.lock().unwrap(),
        vec![JobEvent::Failed { job_id: id.clone(), reason: "Contract // Invalid contract!".to_string() }]
    );

    assert_matches!(queue.fail(&id, "again").await, Err(QueueError::JobAlreadyFinished { .. }));
}

#[rstest]
#[tokio::test]
async fn fetch_by_id_reports_unknown_jobs(queue: InMemoryJobQueue) {
    let error = queue.fetch_by_id("42").await.unwrap_err();
    assert_matches!(error, QueueError::JobNotFound { ref id } if id == "42");
    assert_eq!(error.to_string(), "Job // A job with the provided id could not be found!");
}

#[rstest]
#[tokio::test]
async fn enqueue_fails_once_the_broker_ended(queue: InMemoryJobQueue, job_data: JobData) {
    queue.set_status(BrokerStatus::End);
    assert_matches!(queue.enqueue(job_data).await, Err(QueueError::BrokerNotAvailable(BrokerStatus::End)));
}

#[rstest]
#[tokio::test]
async fn removed_listeners_stop_receiving_events(queue: InMemoryJobQueue, job_data: JobData) {
    let id = queue.enqueue(job_data).await.unwrap().id;
    queue.next_job().await.unwrap();

    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let listener = queue.on_event(Box::new(move |_| *counter.lock().unwrap() += 1));
    queue.report_progress(&id, JobProgress::CertificateFound).await.unwrap();

    queue.remove_listener(listener);
    assert_eq!(queue.listener_count(), 0);
    queue.report_progress(&id, JobProgress::Confirmed).await.unwrap();

    assert_eq!(*calls.lock().unwrap(), 1);
}

fn health_check() -> BrokerHealthCheck {
    BrokerHealthCheck { retries: 3, interval: Duration::from_secs(1) }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn broker_check_gives_up_after_three_retries() {
    let mut queue = MockJobQueue::new();
    queue.expect_status().times(4).returning(|| BrokerStatus::Connecting);

    let started = tokio::time::Instant::now();
    let result = verify_broker_availability(&queue, health_check()).await;

    assert_matches!(result, Err(QueueError::BrokerNotAvailable(BrokerStatus::Connecting)));
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn broker_check_waits_for_a_reconnecting_broker() {
    let mut queue = MockJobQueue::new();
    let mut statuses = vec![BrokerStatus::Ready, BrokerStatus::Reconnecting, BrokerStatus::Connecting];
    queue.expect_status().times(3).returning(move || statuses.pop().unwrap_or(BrokerStatus::Ready));

    assert_matches!(verify_broker_availability(&queue, health_check()).await, Ok(()));
}

#[rstest]
#[case::ended(BrokerStatus::End)]
#[tokio::test(start_paused = true)]
async fn broker_check_fails_fast_on_a_closed_broker(#[case] status: BrokerStatus) {
    let mut queue = MockJobQueue::new();
    queue.expect_status().times(1).returning(move || status);

    assert_matches!(
        verify_broker_availability(&queue, health_check()).await,
        Err(QueueError::BrokerNotAvailable(BrokerStatus::End))
    );
}
