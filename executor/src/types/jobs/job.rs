use chrono::Utc;
use executor_chain_client_interface::ExecutionReceipt;
use serde::{Deserialize, Serialize};

use crate::types::request::ExecutionRequest;

/// Opaque identifier assigned by the queue on enqueue
pub type JobId = String;

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    /// Enqueued and waiting for a worker
    Waiting,
    /// Leased by a worker
    Active,
    Completed,
    Failed,
    /// The lease expired without the job reaching a terminal state, the broker redelivers it
    Stalled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Progress milestones reported by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobProgress {
    Queued,
    CertificateFound,
    Confirmed,
}

impl JobProgress {
    pub fn value(&self) -> u8 {
        match self {
            JobProgress::Queued => 0,
            JobProgress::CertificateFound => 50,
            JobProgress::Confirmed => 100,
        }
    }
}

/// W3C trace context of the request that created the job
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TracingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceparent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracestate: Option<String>,
}

impl TracingOptions {
    pub fn is_empty(&self) -> bool {
        self.traceparent.is_none() && self.tracestate.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    #[serde(flatten)]
    pub request: ExecutionRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracing_options: Option<TracingOptions>,
}

impl JobData {
    pub fn new(request: ExecutionRequest, tracing_options: TracingOptions) -> Self {
        let tracing_options = (!tracing_options.is_empty()).then_some(tracing_options);
        Self { request, tracing_options }
    }
}

/// A job as stored by the queue and returned to callers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub data: JobData,
    pub progress: u8,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<ExecutionReceipt>,
    pub attempts_made: u32,
    /// Creation time, milliseconds since the unix epoch
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_on: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_on: Option<i64>,
}

impl Job {
    pub fn new(id: JobId, data: JobData) -> Self {
        Self {
            id,
            data,
            progress: JobProgress::Queued.value(),
            status: JobStatus::Waiting,
            failed_reason: None,
            return_value: None,
            attempts_made: 0,
            timestamp: Utc::now().timestamp_millis(),
            processed_on: None,
            finished_on: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Returned by the queue once a job has been persisted
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnqueuedJob {
    pub id: JobId,
    pub timestamp: i64,
}

impl From<&Job> for EnqueuedJob {
    fn from(job: &Job) -> Self {
        Self { id: job.id.clone(), timestamp: job.timestamp }
    }
}
