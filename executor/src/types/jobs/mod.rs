pub mod event;
pub mod job;

pub use event::{JobEvent, JobStreamEvent, ListenerId};
pub use job::{EnqueuedJob, Job, JobData, JobId, JobProgress, JobStatus, TracingOptions};
