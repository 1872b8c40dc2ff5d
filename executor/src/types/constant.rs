use std::time::Duration;

/// Gas limit attached to every messaging `execute` call.
pub const EXECUTE_GAS_LIMIT: u64 = 4_000_000;

pub const CERTIFICATE_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const CERTIFICATE_MAX_POLL_ATTEMPTS: u32 = 80;

pub const BROKER_HEALTH_CHECK_RETRIES: u32 = 3;
pub const BROKER_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Name of the job queue, also used as the SQS queue name by default
pub const EXECUTION_QUEUE_NAME: &str = "execute";

/// Version of the Executor
pub const EXECUTOR_VERSION: &str = env!("CARGO_PKG_VERSION");
