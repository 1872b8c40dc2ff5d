use std::time::Duration;

use crate::cli::worker::WorkerCliArgs;
use crate::types::constant::{CERTIFICATE_MAX_POLL_ATTEMPTS, CERTIFICATE_POLL_INTERVAL, EXECUTE_GAS_LIMIT};
use crate::ExecutorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerParams {
    pub concurrency: usize,
    pub certificate_poll_interval: Duration,
    pub certificate_max_attempts: u32,
    pub gas_limit: u64,
}

impl Default for WorkerParams {
    fn default() -> Self {
        Self {
            concurrency: 4,
            certificate_poll_interval: CERTIFICATE_POLL_INTERVAL,
            certificate_max_attempts: CERTIFICATE_MAX_POLL_ATTEMPTS,
            gas_limit: EXECUTE_GAS_LIMIT,
        }
    }
}

impl TryFrom<WorkerCliArgs> for WorkerParams {
    type Error = ExecutorError;

    fn try_from(args: WorkerCliArgs) -> Result<Self, Self::Error> {
        if args.worker_concurrency == 0 {
            return Err(ExecutorError::InvalidArgument {
                name: "EXECUTOR_WORKER_CONCURRENCY".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if args.certificate_max_attempts == 0 {
            return Err(ExecutorError::InvalidArgument {
                name: "EXECUTOR_CERTIFICATE_MAX_ATTEMPTS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            concurrency: args.worker_concurrency,
            certificate_poll_interval: Duration::from_millis(args.certificate_poll_interval_ms),
            certificate_max_attempts: args.certificate_max_attempts,
            gas_limit: args.execute_gas_limit,
        })
    }
}
