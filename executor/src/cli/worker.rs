use clap::Args;

/// Parameters used to config the execution workers.
#[derive(Debug, Clone, Args)]
pub struct WorkerCliArgs {
    /// Number of jobs processed concurrently by this process.
    #[arg(env = "EXECUTOR_WORKER_CONCURRENCY", long, default_value_t = 4)]
    pub worker_concurrency: usize,

    /// Delay between two certificate lookups.
    #[arg(env = "EXECUTOR_CERTIFICATE_POLL_INTERVAL_MS", long, default_value_t = 1000)]
    pub certificate_poll_interval_ms: u64,

    /// Number of certificate lookups before a job fails.
    #[arg(env = "EXECUTOR_CERTIFICATE_MAX_ATTEMPTS", long, default_value_t = 80)]
    pub certificate_max_attempts: u32,

    /// Gas limit of the execute transaction.
    #[arg(env = "EXECUTOR_EXECUTE_GAS_LIMIT", long, default_value_t = 4_000_000)]
    pub execute_gas_limit: u64,
}
