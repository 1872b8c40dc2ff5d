pub mod chain;
pub mod otel;
pub mod queue;
pub mod server;
pub mod worker;

pub use chain::ChainParams;
pub use otel::OTELConfig;
pub use queue::{AWSParams, BrokerHealthCheck, DatabaseParams, QueueBackendParams, QueueParams, SqsParams};
pub use server::ServerParams;
pub use worker::WorkerParams;
