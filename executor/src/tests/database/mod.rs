use assert_matches::assert_matches;
use rstest::*;

use crate::core::client::database::DatabaseError;
use crate::core::client::MongoDbClient;
use crate::tests::common::{integration_database, job_data, receipt};
use crate::types::jobs::{Job, JobData, JobStatus};

#[fixture]
async fn database() -> MongoDbClient {
    let database = MongoDbClient::new(&integration_database()).await.expect("valid connection url");
    database.create_indexes().await.expect("MongoDB should be reachable");
    database
}

async fn stored_job(database: &MongoDbClient, data: JobData) -> Job {
    let job = Job::new(uuid::Uuid::new_v4().to_string(), data);
    database.insert_job(&job).await.unwrap();
    job
}

#[rstest]
#[tokio::test]
#[ignore = "requires MongoDB"]
async fn claim_job_leases_a_waiting_job_once(#[future] database: MongoDbClient, job_data: JobData) {
    let database = database.await;
    let job = stored_job(&database, job_data).await;

    let leased = database.claim_job(&job.id).await.unwrap().expect("waiting job is leasable");
    assert_eq!(leased.status, JobStatus::Active);
    assert_eq!(leased.attempts_made, 1);
    assert!(leased.processed_on.is_some());

    assert!(database.claim_job(&job.id).await.unwrap().is_none());
}

#[rstest]
#[tokio::test]
#[ignore = "requires MongoDB"]
async fn stalled_jobs_are_leased_again(#[future] database: MongoDbClient, job_data: JobData) {
    let database = database.await;
    let job = stored_job(&database, job_data).await;

    // only an active job can stall
    assert!(database.mark_stalled(&job.id).await.unwrap().is_none());

    database.claim_job(&job.id).await.unwrap();
    let stalled = database.mark_stalled(&job.id).await.unwrap().expect("active job can stall");
    assert_eq!(stalled.status, JobStatus::Stalled);

    let leased = database.claim_job(&job.id).await.unwrap().expect("stalled job is leasable");
    assert_eq!(leased.status, JobStatus::Active);
    assert_eq!(leased.attempts_made, 2);
}

#[rstest]
#[tokio::test]
#[ignore = "requires MongoDB"]
async fn update_progress_only_raises_the_progress_of_an_active_job(
    #[future] database: MongoDbClient,
    job_data: JobData,
) {
    let database = database.await;
    let job = stored_job(&database, job_data).await;

    assert!(database.update_progress(&job.id, 50).await.unwrap().is_none(), "waiting job");

    database.claim_job(&job.id).await.unwrap();
    assert_eq!(database.update_progress(&job.id, 50).await.unwrap().map(|job| job.progress), Some(50));
    assert!(database.update_progress(&job.id, 50).await.unwrap().is_none(), "same value");
    assert!(database.update_progress(&job.id, 0).await.unwrap().is_none(), "regression");
    assert_eq!(database.find_job(&job.id).await.unwrap().map(|job| job.progress), Some(50));
}

#[rstest]
#[tokio::test]
#[ignore = "requires MongoDB"]
async fn complete_job_applies_once(#[future] database: MongoDbClient, job_data: JobData) {
    let database = database.await;
    let job = stored_job(&database, job_data).await;
    database.claim_job(&job.id).await.unwrap();

    let completed = database.complete_job(&job.id, &receipt(true)).await.unwrap().expect("active job");
    assert_eq!(completed.status, JobStatus::Completed);
    assert_eq!(completed.return_value, Some(receipt(true)));
    assert!(completed.finished_on.is_some());

    assert!(database.complete_job(&job.id, &receipt(true)).await.unwrap().is_none());
    assert!(database.fail_job(&job.id, "too late").await.unwrap().is_none());
    assert!(database.find_failed_job(&job.id).await.unwrap().is_none());
}

#[rstest]
#[tokio::test]
#[ignore = "requires MongoDB"]
async fn fail_job_moves_the_job_to_the_failed_collection(#[future] database: MongoDbClient, job_data: JobData) {
    let database = database.await;
    let job = stored_job(&database, job_data).await;

    assert!(database.fail_job(&job.id, "not leased").await.unwrap().is_none(), "waiting job");

    database.claim_job(&job.id).await.unwrap();
    let failed = database.fail_job(&job.id, "Contract // Invalid contract!").await.unwrap().expect("active job");
    assert_eq!(failed.status, JobStatus::Failed);

    assert!(database.find_job(&job.id).await.unwrap().is_none());
    let stored = database.find_failed_job(&job.id).await.unwrap().expect("failed copy");
    assert_eq!(stored.failed_reason.as_deref(), Some("Contract // Invalid contract!"));
    assert_eq!(database.failed_jobs().await.unwrap(), vec![stored]);

    assert!(database.fail_job(&job.id, "again").await.unwrap().is_none());
}

#[rstest]
#[tokio::test]
#[ignore = "requires MongoDB"]
async fn fail_job_reports_an_existing_failed_copy(#[future] database: MongoDbClient, job_data: JobData) {
    let database = database.await;
    let job = stored_job(&database, job_data).await;
    database.claim_job(&job.id).await.unwrap();
    database.fail_job(&job.id, "first").await.unwrap();

    // the same id leased again from the primary collection
    database.insert_job(&job).await.unwrap();
    database.claim_job(&job.id).await.unwrap();

    let result = database.fail_job(&job.id, "second").await;
    assert_matches!(result, Err(DatabaseError::ItemAlreadyExists(id)) if id == job.id);
    assert_eq!(database.find_job(&job.id).await.unwrap().map(|job| job.status), Some(JobStatus::Active));
}
