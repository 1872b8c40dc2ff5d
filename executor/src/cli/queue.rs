use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueueBackend {
    /// Jobs in MongoDB, deliveries through AWS SQS
    Sqs,
    /// Process local queue, jobs are lost on restart
    Memory,
}

/// Parameters used to config the job queue.
#[derive(Debug, Clone, Args)]
pub struct QueueCliArgs {
    #[arg(env = "EXECUTOR_QUEUE_BACKEND", long, value_enum, default_value_t = QueueBackend::Sqs)]
    pub queue_backend: QueueBackend,

    /// Name of the SQS queue carrying job deliveries.
    #[arg(env = "EXECUTOR_AWS_SQS_QUEUE_NAME", long, default_value = "executor_execute_queue")]
    pub sqs_queue_name: String,

    /// Long polling wait of one SQS receive call.
    #[arg(env = "EXECUTOR_SQS_RECEIVE_WAIT_SECS", long, default_value_t = 5)]
    pub sqs_receive_wait_secs: u64,

    /// Status checks retried while the broker is still connecting, before giving up at startup.
    #[arg(env = "EXECUTOR_BROKER_HEALTH_CHECK_RETRIES", long, default_value_t = 3)]
    pub broker_health_check_retries: u32,

    #[arg(env = "EXECUTOR_BROKER_HEALTH_CHECK_INTERVAL_MS", long, default_value_t = 1000)]
    pub broker_health_check_interval_ms: u64,
}
