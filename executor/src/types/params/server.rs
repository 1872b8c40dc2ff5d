use std::time::Duration;

use crate::cli::server::ServerCliArgs;

#[derive(Debug, Clone)]
pub struct ServerParams {
    pub host: String,
    pub port: u16,
    pub subscription_refresh: Duration,
}

impl From<ServerCliArgs> for ServerParams {
    fn from(args: ServerCliArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            subscription_refresh: Duration::from_millis(args.subscription_refresh_interval_ms.max(1)),
        }
    }
}
