use std::sync::Arc;

use executor_chain_client_interface::ChainConnector;
use executor_evm_client::EvmConnector;
use tracing::info;

use crate::cli::RunCmd;
use crate::core::client::queue::memory::InMemoryJobQueue;
use crate::core::client::queue::sqs::SqsJobQueue;
use crate::core::client::queue::JobQueue;
use crate::types::params::{
    BrokerHealthCheck, ChainParams, QueueBackendParams, QueueParams, ServerParams, WorkerParams,
};
use crate::utils::metrics::ExecutorMetrics;
use crate::ExecutorResult;

/// Shared configuration and clients of the executor process.
pub struct Config {
    chain: ChainParams,
    worker: WorkerParams,
    server: ServerParams,
    health_check: BrokerHealthCheck,
    queue: Arc<dyn JobQueue>,
    chain_connector: Arc<dyn ChainConnector>,
    metrics: Arc<ExecutorMetrics>,
}

impl Config {
    pub fn new(
        chain: ChainParams,
        worker: WorkerParams,
        server: ServerParams,
        health_check: BrokerHealthCheck,
        queue: Arc<dyn JobQueue>,
        chain_connector: Arc<dyn ChainConnector>,
        metrics: Arc<ExecutorMetrics>,
    ) -> Self {
        Self { chain, worker, server, health_check, queue, chain_connector, metrics }
    }

    /// Builds the configuration from the `run` arguments, connecting the queue backend.
    pub async fn from_run_cmd(run_cmd: &RunCmd, metrics: Arc<ExecutorMetrics>) -> ExecutorResult<Self> {
        let chain = ChainParams::try_from(run_cmd.chain_args.clone())?;
        let worker = WorkerParams::try_from(run_cmd.worker_args.clone())?;
        let server = ServerParams::from(run_cmd.server_args.clone());
        let queue_params = QueueParams::try_from(run_cmd.clone())?;

        let queue: Arc<dyn JobQueue> = match queue_params.backend {
            QueueBackendParams::Sqs(ref params) => {
                info!(queue = %params.queue_name, database = %params.database.database_name, "Using the SQS queue backend");
                Arc::new(SqsJobQueue::new(params).await?)
            }
            QueueBackendParams::Memory => {
                info!("Using the in-memory queue backend, jobs do not survive a restart");
                Arc::new(InMemoryJobQueue::default())
            }
        };
        let chain_connector = Arc::new(EvmConnector::new(chain.connection_grace));

        Ok(Self::new(chain, worker, server, queue_params.health_check, queue, chain_connector, metrics))
    }

    pub fn chain(&self) -> &ChainParams {
        &self.chain
    }

    pub fn worker(&self) -> &WorkerParams {
        &self.worker
    }

    pub fn server_config(&self) -> &ServerParams {
        &self.server
    }

    pub fn health_check(&self) -> BrokerHealthCheck {
        self.health_check
    }

    pub fn queue(&self) -> Arc<dyn JobQueue> {
        self.queue.clone()
    }

    pub fn chain_connector(&self) -> Arc<dyn ChainConnector> {
        self.chain_connector.clone()
    }

    pub fn metrics(&self) -> Arc<ExecutorMetrics> {
        self.metrics.clone()
    }
}
