use clap::Args;

/// Parameters used to config the server.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct ServerCliArgs {
    /// The host to listen on.
    #[arg(env = "EXECUTOR_HOST", long, default_value = "0.0.0.0")]
    pub host: String,

    /// The port to listen on.
    #[arg(env = "EXECUTOR_PORT", long, default_value = "3000")]
    pub port: u16,

    /// How often an open job subscription re-reads the job from the queue, in milliseconds.
    /// Catches events of jobs processed by another executor instance.
    #[arg(env = "EXECUTOR_SUBSCRIPTION_REFRESH_INTERVAL_MS", long, default_value = "1000")]
    pub subscription_refresh_interval_ms: u64,
}
