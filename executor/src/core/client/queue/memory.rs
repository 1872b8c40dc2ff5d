use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use executor_chain_client_interface::ExecutionReceipt;
use tokio::sync::Notify;
use tracing::debug;

use super::{BrokerStatus, JobEventBus, JobEventListener, JobQueue, QueueError};
use crate::types::jobs::{EnqueuedJob, Job, JobData, JobEvent, JobId, JobProgress, JobStatus, ListenerId};

/// How long `next_job` waits for an enqueue before returning empty handed.
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(500);

#[derive(Default)]
struct State {
    jobs: HashMap<JobId, Job>,
    failed: HashMap<JobId, Job>,
    waiting: VecDeque<JobId>,
    next_id: u64,
}

impl State {
    fn active(&mut self, id: &str) -> Result<&mut Job, QueueError> {
        if let Some(job) = self.failed.get(id) {
            return Err(QueueError::JobAlreadyFinished { id: id.to_string(), status: job.status });
        }
        let job = self.jobs.get_mut(id).ok_or_else(|| QueueError::JobNotFound { id: id.to_string() })?;
        match job.status {
            JobStatus::Active => Ok(job),
            status if status.is_terminal() => Err(QueueError::JobAlreadyFinished { id: id.to_string(), status }),
            status => Err(QueueError::JobNotActive { id: id.to_string(), status }),
        }
    }
}

/// Process local queue with the same contract as the durable backend. Jobs are lost on
/// restart and failed jobs are evicted from the primary index like a broker would.
pub struct InMemoryJobQueue {
    state: Mutex<State>,
    status: Mutex<BrokerStatus>,
    notify: Notify,
    events: JobEventBus,
    idle_wait: Duration,
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_WAIT)
    }
}

impl InMemoryJobQueue {
    pub fn new(idle_wait: Duration) -> Self {
        Self {
            state: Mutex::new(State { next_id: 1, ..State::default() }),
            status: Mutex::new(BrokerStatus::Ready),
            notify: Notify::new(),
            events: JobEventBus::default(),
            idle_wait,
        }
    }

    pub fn set_status(&self, status: BrokerStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lease(&self) -> Option<Job> {
        let mut state = self.state();
        while let Some(id) = state.waiting.pop_front() {
            if let Some(job) = state.jobs.get_mut(&id).filter(|job| job.status == JobStatus::Waiting) {
                job.status = JobStatus::Active;
                job.attempts_made += 1;
                job.processed_on = Some(Utc::now().timestamp_millis());
                return Some(job.clone());
            }
        }
        None
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn status(&self) -> BrokerStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enqueue(&self, data: JobData) -> Result<EnqueuedJob, QueueError> {
        let status = self.status().await;
        if matches!(status, BrokerStatus::End) {
            return Err(QueueError::BrokerNotAvailable(status));
        }

        let enqueued = {
            let mut state = self.state();
            let id = state.next_id.to_string();
            state.next_id += 1;
            let job = Job::new(id.clone(), data);
            let enqueued = EnqueuedJob::from(&job);
            state.jobs.insert(id.clone(), job);
            state.waiting.push_back(id);
            enqueued
        };

        debug!(job_id = %enqueued.id, "Job enqueued");
        self.notify.notify_one();
        Ok(enqueued)
    }

    async fn find_job(&self, id: &str) -> Result<Option<Job>, QueueError> {
        Ok(self.state().jobs.get(id).cloned())
    }

    async fn list_failed(&self) -> Result<Vec<Job>, QueueError> {
        let mut failed = self.state().failed.values().cloned().collect::<Vec<_>>();
        failed.sort_by_key(|job| job.timestamp);
        Ok(failed)
    }

    async fn next_job(&self) -> Result<Option<Job>, QueueError> {
        if let Some(job) = self.lease() {
            return Ok(Some(job));
        }
        let _ = tokio::time::timeout(self.idle_wait, self.notify.notified()).await;
        Ok(self.lease())
    }

    async fn report_progress(&self, id: &str, progress: JobProgress) -> Result<(), QueueError> {
        let requested = progress.value();
        {
            let mut state = self.state();
            let job = state.active(id)?;
            if requested == job.progress {
                return Ok(());
            }
            if requested < job.progress {
                return Err(QueueError::ProgressRegression { id: id.to_string(), current: job.progress, requested });
            }
            job.progress = requested;
        }

        self.events.emit(&JobEvent::Progress { job_id: id.to_string(), progress: requested });
        Ok(())
    }

    async fn complete(&self, id: &str, result: ExecutionReceipt) -> Result<(), QueueError> {
        {
            let mut state = self.state();
            let job = state.active(id)?;
            job.status = JobStatus::Completed;
            job.return_value = Some(result.clone());
            job.finished_on = Some(Utc::now().timestamp_millis());
        }

        self.events.emit(&JobEvent::Completed { job_id: id.to_string(), result });
        Ok(())
    }

    async fn fail(&self, id: &str, reason: &str) -> Result<(), QueueError> {
        {
            let mut state = self.state();
            state.active(id)?;
            if let Some(mut job) = state.jobs.remove(id) {
                job.status = JobStatus::Failed;
                job.failed_reason = Some(reason.to_string());
                job.finished_on = Some(Utc::now().timestamp_millis());
                state.failed.insert(id.to_string(), job);
            }
        }

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
