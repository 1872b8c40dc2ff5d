pub mod certificate;
pub mod controller;
pub mod processor;
pub mod resolver;

use std::sync::Arc;

pub use certificate::CertificatePoller;
pub use controller::WorkerController;
pub use processor::{ExecutionProcessor, ExecutionState};
pub use resolver::SubnetResolver;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::config::Config;

/// Starts the consumer slots in the background and returns the controller used for shutdown.
pub fn initialize_worker(config: Arc<Config>, cancellation_token: CancellationToken) -> WorkerController {
    let processor = Arc::new(ExecutionProcessor::new(&config));
    let controller = WorkerController::start(processor, config.queue(), config.worker().concurrency, cancellation_token);
    info!(concurrency = config.worker().concurrency, "Execution workers started");
    controller
}
