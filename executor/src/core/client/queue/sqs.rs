use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex as StdMutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_sqs::types::QueueAttributeName;
use aws_sdk_sqs::Client;
use executor_chain_client_interface::ExecutionReceipt;
use omniqueue::backends::{SqsBackend, SqsConfig, SqsConsumer, SqsProducer};
use omniqueue::Delivery;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{BrokerStatus, JobEventBus, JobEventListener, JobQueue, QueueError};
use crate::core::client::MongoDbClient;
use crate::types::jobs::{EnqueuedJob, Job, JobData, JobEvent, JobId, JobProgress, JobStatus, ListenerId};
use crate::types::params::{AWSParams, SqsParams};
use crate::ExecutorError;

impl AWSParams {
    pub async fn sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::from_env();
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        loader.load().await
    }
}

#[derive(Clone, Debug)]
pub struct InnerSQS(Client);

impl InnerSQS {
    pub fn new(aws_config: &SdkConfig) -> Self {
        let sqs_config_builder = aws_sdk_sqs::config::Builder::from(aws_config);
        Self(Client::from_conf(sqs_config_builder.build()))
    }

    pub fn client(&self) -> &Client {
        &self.0
    }

    pub async fn get_queue_url_from_client(&self, queue_name: &str) -> Result<String, QueueError> {
        Ok(self
            .client()
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await?
            .queue_url()
            .ok_or_else(|| QueueError::FailedToGetQueueUrl(queue_name.to_string()))?
            .to_string())
    }

    /// Create a new queue with the given name
    pub async fn create_queue(&self, queue_name: &str, visibility_timeout: u32) -> Result<String, ExecutorError> {
        let mut attributes = HashMap::new();
        attributes.insert(QueueAttributeName::VisibilityTimeout, visibility_timeout.to_string());
        let res = self
            .client()
            .create_queue()
            .queue_name(queue_name)
            .set_attributes(Some(attributes))
            .send()
            .await
            .map_err(|e| {
                ExecutorError::SetupCommandError(format!("Failed to create SQS queue '{}': {}", queue_name, e))
            })?;

        Ok(res
            .queue_url()
            .ok_or_else(|| ExecutorError::SetupCommandError("Failed to get SQS URL".to_string()))?
            .to_string())
    }
}

/// Body of an SQS message, job records live in MongoDB.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JobQueueMessage {
    pub id: JobId,
}

/// Producer and consumer of the job queue, built once the queue url is known.
struct SqsChannel {
    producer: SqsProducer,
    consumer: Mutex<SqsConsumer>,
}

/// Job records in MongoDB, deliveries through SQS.
///
/// A delivery stays unacknowledged while its job is active and is acked once the job reaches a
/// terminal state. If the visibility timeout expires first, SQS redelivers the message and the
/// job is marked stalled before being leased again.
///
/// Building the queue does not reach either service. The SQS channel is opened on first use, so
/// an unreachable broker is reported by the startup health check.
pub struct SqsJobQueue {
    database: MongoDbClient,
    sqs: InnerSQS,
    queue_name: String,
    channel: OnceCell<SqsChannel>,
    in_flight: StdMutex<HashMap<JobId, Delivery>>,
    events: JobEventBus,
    receive_wait: Duration,
    ever_ready: AtomicBool,
}

impl SqsJobQueue {
    pub async fn new(params: &SqsParams) -> Result<Self, QueueError> {
        let database = MongoDbClient::new(&params.database).await?;
        let sqs = InnerSQS::new(&params.aws.sdk_config().await);

        Ok(Self {
            database,
            sqs,
            queue_name: params.queue_name.clone(),
            channel: OnceCell::new(),
            in_flight: StdMutex::new(HashMap::new()),
            events: JobEventBus::default(),
            receive_wait: params.receive_wait,
            ever_ready: AtomicBool::new(false),
        })
    }

    async fn channel(&self) -> Result<&SqsChannel, QueueError> {
        self.channel
            .get_or_try_init(|| async {
                let queue_url = self.sqs.get_queue_url_from_client(&self.queue_name).await?;
                debug!(queue = %self.queue_name, queue_url = %queue_url, "Found queue url");
                let producer =
                    SqsBackend::builder(SqsConfig { queue_dsn: queue_url.clone(), override_endpoint: false })
                        .build_producer()
                        .await?;
                let consumer = SqsBackend::builder(SqsConfig { queue_dsn: queue_url, override_endpoint: false })
                    .build_consumer()
                    .await?;
                Ok::<_, QueueError>(SqsChannel { producer, consumer: Mutex::new(consumer) })
            })
            .await
    }

    async fn ack(&self, id: &str, delivery: Delivery) {
        if let Err((e, _)) = delivery.ack().await {
            warn!(job_id = %id, error = %e, "Failed to ack delivery, the message will be redelivered and skipped");
        }
    }

    /// Acks the delivery of a job that just reached a terminal state.
    async fn settle(&self, id: &str) {
        let delivery = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).remove(id);
        if let Some(delivery) = delivery {
            self.ack(id, delivery).await;
        }
    }

    /// Explains why a guarded update matched nothing.
    async fn rejected(&self, id: &str) -> QueueError {
        match self.fetch_by_id(id).await {
            Ok(job) if job.is_terminal() => QueueError::JobAlreadyFinished { id: id.to_string(), status: job.status },
            Ok(job) => QueueError::JobNotActive { id: id.to_string(), status: job.status },
            Err(e) => e,
        }
    }
}

#[async_trait]
impl JobQueue for SqsJobQueue {
    async fn status(&self) -> BrokerStatus {
        let (database, queue) =
            tokio::join!(self.database.ping(), self.sqs.get_queue_url_from_client(&self.queue_name));

        match (database, queue) {
            (Ok(()), Ok(_)) => {
                self.ever_ready.store(true, Ordering::Relaxed);
                BrokerStatus::Ready
            }
            (database, queue) => {
                if let Err(e) = database {
                    debug!(error = %e, "MongoDB ping failed");
                }
                if let Err(e) = queue {
                    debug!(error = %e, "SQS queue lookup failed");
                }
                if self.ever_ready.load(Ordering::Relaxed) {
                    BrokerStatus::Reconnecting
                } else {
                    BrokerStatus::Connecting
                }
            }
        }
    }

    async fn enqueue(&self, data: JobData) -> Result<EnqueuedJob, QueueError> {
        let channel = self.channel().await?;
        let job = Job::new(Uuid::new_v4().to_string(), data);
        self.database.insert_job(&job).await?;

        if let Err(e) = channel.producer.send_serde_json(&JobQueueMessage { id: job.id.clone() }).await {
            if let Err(cleanup) = self.database.delete_job(&job.id).await {
                warn!(job_id = %job.id, error = %cleanup, "Failed to remove job record after a failed send");
            }
            return Err(e.into());
        }

        debug!(job_id = %job.id, queue = %self.queue_name, "Job enqueued");
        Ok(EnqueuedJob::from(&job))
    }

    async fn find_job(&self, id: &str) -> Result<Option<Job>, QueueError> {
        Ok(self.database.find_job(id).await?)
    }

    async fn list_failed(&self) -> Result<Vec<Job>, QueueError> {
        Ok(self.database.failed_jobs().await?)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Job, QueueError> {
        if let Some(job) = self.database.find_job(id).await? {
            return Ok(job);
        }
        self.database.find_failed_job(id).await?.ok_or_else(|| QueueError::JobNotFound { id: id.to_string() })
    }

    async fn next_job(&self) -> Result<Option<Job>, QueueError> {
        let deliveries = {
            let mut consumer = self.channel().await?.consumer.lock().await;
            consumer.receive_all(1, self.receive_wait).await?
        };
        let Some(delivery) = deliveries.into_iter().next() else {
            return Ok(None);
        };

        let Some(JobQueueMessage { id }) = delivery.payload_serde_json::<JobQueueMessage>()? else {
            warn!("Dropping a delivery without payload");
            self.ack("-", delivery).await;
            return Ok(None);
        };

        match self.database.find_job(&id).await? {
            // failed jobs are moved out of the primary collection
            None => {
                debug!(job_id = %id, "Skipping delivery of a failed or removed job");
                self.ack(&id, delivery).await;
                return Ok(None);
            }
            Some(job) if job.is_terminal() => {
                debug!(job_id = %id, status = %job.status, "Skipping redelivery of a finished job");
                self.ack(&id, delivery).await;
                return Ok(None);
            }
            Some(job) if job.status == JobStatus::Active => {
                warn!(job_id = %id, attempts_made = job.attempts_made, "Lease expired, marking the job stalled");
                self.database.mark_stalled(&id).await?;
            }
            Some(_) => {}
        }

        match self.database.claim_job(&id).await? {
            Some(job) => {
                info!(job_id = %id, attempts_made = job.attempts_made, "📥 Job leased");
                let stale = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).insert(id.clone(), delivery);
                if stale.is_some() {
                    debug!(job_id = %id, "Replaced the delivery of the expired lease");
                }
                Ok(Some(job))
            }
            None => {
                // leased concurrently, the message becomes visible again after its timeout
                debug!(job_id = %id, "Job was leased by another consumer");
                Ok(None)
            }
        }
    }

    async fn report_progress(&self, id: &str, progress: JobProgress) -> Result<(), QueueError> {
        let requested = progress.value();
        if self.database.update_progress(id, requested).await?.is_some() {
            self.events.emit(&JobEvent::Progress { job_id: id.to_string(), progress: requested });
            return Ok(());
        }

        let job = self.fetch_by_id(id).await?;
        match job.status {
            JobStatus::Active if job.progress == requested => Ok(()),
            JobStatus::Active => {
                Err(QueueError::ProgressRegression { id: id.to_string(), current: job.progress, requested })
            }
            status if status.is_terminal() => Err(QueueError::JobAlreadyFinished { id: id.to_string(), status }),
            status => Err(QueueError::JobNotActive { id: id.to_string(), status }),
        }
    }

    async fn complete(&self, id: &str, result: ExecutionReceipt) -> Result<(), QueueError> {
        if self.database.complete_job(id, &result).await?.is_none() {
            return Err(self.rejected(id).await);
        }
        self.settle(id).await;
        self.events.emit(&JobEvent::Completed { job_id: id.to_string(), result });
        Ok(())
    }

    async fn fail(&self, id: &str, reason: &str) -> Result<(), QueueError> {
        if self.database.fail_job(id, reason).await?.is_none() {
            return Err(self.rejected(id).await);
        }
        self.settle(id).await;
        self.events.emit(&JobEvent::Failed { job_id: id.to_string(), reason: reason.to_string() });
        Ok(())
    }

    fn on_event(&self, listener: JobEventListener) -> ListenerId {
        self.events.subscribe(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.events.unsubscribe(id);
    }
}
