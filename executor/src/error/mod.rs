pub mod execution;

use executor_chain_client_interface::ChainClientError;
use thiserror::Error;

use crate::core::client::database::DatabaseError;
use crate::core::client::queue::QueueError;
use crate::service::ExecutionServiceError;
pub use execution::{ExecutionError, ExecutionResult};

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Error types for the executor process
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Queue error: {0}")]
    QueueError(#[from] QueueError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Execution service error: {0}")]
    ExecutionServiceError(#[from] ExecutionServiceError),

    #[error("Chain client error: {0}")]
    ChainClientError(#[from] ChainClientError),

    /// A required argument was not provided on the command line or in the environment
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Setup Command error
    #[error("Setup Command Error: {0}")]
    SetupCommandError(String),

    #[error("Server Error: {0}")]
    ServerError(#[from] std::io::Error),

    #[error("Worker Error: {0}")]
    WorkerError(String),

    #[error("OTEL Logger Error: {0}")]
    OTELLogError(#[from] opentelemetry::logs::LogError),
    #[error("OTEL Metrics Error: {0}")]
    OTELMetricsError(#[from] opentelemetry::metrics::MetricsError),
    #[error("OTEL Trace Error: {0}")]
    OTELTraceError(#[from] opentelemetry::trace::TraceError),
}
