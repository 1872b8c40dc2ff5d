use std::sync::Arc;

use chrono::Utc;
use executor_chain_client_interface::ExecutionReceipt;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{bson, Client, Collection, Database, IndexModel};
use serde::Serialize;
use tracing::debug;

use super::error::DatabaseError;
use crate::core::client::database::constant::{FAILED_JOBS_COLLECTION, JOBS_COLLECTION};
use crate::types::jobs::{Job, JobStatus};
use crate::types::params::DatabaseParams;

pub trait ToDocument {
    fn to_document(&self) -> Result<Document, DatabaseError>;
}

impl<T: Serialize> ToDocument for T {
    fn to_document(&self) -> Result<Document, DatabaseError> {
        let doc = bson::to_bson(self)?;

        if let Bson::Document(doc) = doc {
            Ok(doc)
        } else {
            Err(DatabaseError::FailedToSerializeDocument(format!("Failed to serialize document: {}", doc)))
        }
    }
}

fn status(status: JobStatus) -> Bson {
    Bson::String(status.to_string())
}

/// Non terminal statuses a job can be leased from
fn leasable() -> Bson {
    Bson::Array(vec![status(JobStatus::Waiting), status(JobStatus::Stalled)])
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == 11000
    )
}

/// MongoDB client holding job records
pub struct MongoDbClient {
    client: Client,
    database: Arc<Database>,
}

impl MongoDbClient {
    pub async fn new(config: &DatabaseParams) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(&config.connection_uri).await?;
        let database = Arc::new(client.database(&config.database_name));
        Ok(Self { client, database })
    }

    /// Mongodb client uses Arc internally, reducing the cost of clone.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    fn jobs_collection(&self) -> Collection<Job> {
        self.database.collection(JOBS_COLLECTION)
    }

    fn failed_jobs_collection(&self) -> Collection<Job> {
        self.database.collection(FAILED_JOBS_COLLECTION)
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    /// Unique `id` indexes on both job collections, created by the setup command.
    pub async fn create_indexes(&self) -> Result<(), DatabaseError> {
        let index = || {
            IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };
        self.jobs_collection().create_index(index(), None).await?;
        self.failed_jobs_collection().create_index(index(), None).await?;
        Ok(())
    }

    pub async fn insert_job(&self, job: &Job) -> Result<(), DatabaseError> {
        self.jobs_collection().insert_one(job, None).await?;
        debug!(job_id = %job.id, "Job record created");
        Ok(())
    }

    pub async fn delete_job(&self, id: &str) -> Result<(), DatabaseError> {
        self.jobs_collection().delete_one(doc! { "id": id }, None).await?;
        Ok(())
    }

    pub async fn find_job(&self, id: &str) -> Result<Option<Job>, DatabaseError> {
        Ok(self.jobs_collection().find_one(doc! { "id": id }, None).await?)
    }

    pub async fn find_failed_job(&self, id: &str) -> Result<Option<Job>, DatabaseError> {
        Ok(self.failed_jobs_collection().find_one(doc! { "id": id }, None).await?)
    }

    pub async fn failed_jobs(&self) -> Result<Vec<Job>, DatabaseError> {
        let cursor = self.failed_jobs_collection().find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_job(&self, filter: Document, update: Document) -> Result<Option<Job>, DatabaseError> {
        let options = FindOneAndUpdateOptions::builder().return_document(ReturnDocument::After).build();
        Ok(self.jobs_collection().find_one_and_update(filter, update, options).await?)
    }

    /// Leases a waiting or stalled job: it becomes active and one more attempt is counted.
    /// Returns `None` when the job is not leasable anymore.
    pub async fn claim_job(&self, id: &str) -> Result<Option<Job>, DatabaseError> {
        self.update_job(
            doc! { "id": id, "status": { "$in": leasable() } },
            doc! {
                "$set": { "status": status(JobStatus::Active), "processedOn": Utc::now().timestamp_millis() },
                "$inc": { "attemptsMade": 1 },
            },
        )
        .await
    }

    pub async fn mark_stalled(&self, id: &str) -> Result<Option<Job>, DatabaseError> {
        self.update_job(
            doc! { "id": id, "status": status(JobStatus::Active) },
            doc! { "$set": { "status": status(JobStatus::Stalled) } },
        )
        .await
    }

    /// Only raises the progress of an active job.
    pub async fn update_progress(&self, id: &str, progress: u8) -> Result<Option<Job>, DatabaseError> {
        let progress = i32::from(progress);
        self.update_job(
            doc! { "id": id, "status": status(JobStatus::Active), "progress": { "$lt": progress } },
            doc! { "$set": { "progress": progress } },
        )
        .await
    }

    pub async fn complete_job(&self, id: &str, result: &ExecutionReceipt) -> Result<Option<Job>, DatabaseError> {
        self.update_job(
            doc! { "id": id, "status": status(JobStatus::Active) },
            doc! {
                "$set": {
                    "status": status(JobStatus::Completed),
                    "returnValue": bson::to_bson(result)?,
                    "finishedOn": Utc::now().timestamp_millis(),
                }
            },
        )
        .await
    }

    /// Moves an active job to the failed collection. The failed copy is written first so a
    /// crash in between leaves a duplicate rather than losing the job.
    pub async fn fail_job(&self, id: &str, reason: &str) -> Result<Option<Job>, DatabaseError> {
        let Some(mut job) = self.find_job(id).await? else {
            return Ok(None);
        };
        if job.status != JobStatus::Active {
            return Ok(None);
        }

        job.status = JobStatus::Failed;
        job.failed_reason = Some(reason.to_string());
        job.finished_on = Some(Utc::now().timestamp_millis());
        self.failed_jobs_collection().insert_one(&job, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                DatabaseError::ItemAlreadyExists(id.to_string())
            } else {
                DatabaseError::MongoError(e)
            }
        })?;

        let deleted =
            self.jobs_collection().delete_one(doc! { "id": id, "status": status(JobStatus::Active) }, None).await?;
        if deleted.deleted_count == 0 {
            // another transition won the race, drop the copy
            self.failed_jobs_collection().delete_one(doc! { "id": id }, None).await?;
            return Ok(None);
        }
        Ok(Some(job))
    }
}
