use executor_chain_client_interface::ExecutionReceipt;
use serde::Serialize;

use crate::types::jobs::job::JobId;

/// Handle returned when registering a queue event listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Broadcast by the queue for every job. Listeners filter by id themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Progress { job_id: JobId, progress: u8 },
    Completed { job_id: JobId, result: ExecutionReceipt },
    Failed { job_id: JobId, reason: String },
}

impl JobEvent {
    pub fn job_id(&self) -> &str {
        match self {
            JobEvent::Progress { job_id, .. } | JobEvent::Completed { job_id, .. } | JobEvent::Failed { job_id, .. } => {
                job_id
            }
        }
    }
}

/// Item of a job subscription, serialized as `{"type": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum JobStreamEvent {
    Progress(u8),
    Completed(ExecutionReceipt),
}
