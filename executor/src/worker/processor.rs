use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use alloy_primitives::{Bytes, B256};
use executor_chain_client_interface::{ChainConnector, ContractKind, ExecuteCall, ExecutionReceipt};
use futures::FutureExt;
use opentelemetry::KeyValue;
use tracing::{error, info};

use crate::core::client::queue::{JobQueue, QueueError};
use crate::core::config::Config;
use crate::error::{ExecutionError, ExecutionResult};
use crate::types::jobs::{Job, JobProgress};
use crate::utils::metrics::ExecutorMetrics;
use crate::worker::certificate::CertificatePoller;
use crate::worker::resolver::SubnetResolver;

/// Stage of the pipeline a job is in, logged when the job fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ExecutionState {
    Resolving,
    Connecting,
    LoadingContracts,
    AwaitingCertificate,
    Submitting,
    Confirming,
}

/// Drives one leased job from its subnet id to a mined execute transaction.
pub struct ExecutionProcessor {
    queue: Arc<dyn JobQueue>,
    connector: Arc<dyn ChainConnector>,
    resolver: SubnetResolver,
    poller: CertificatePoller,
    private_key: String,
    core_address: String,
    gas_limit: u64,
    metrics: Arc<ExecutorMetrics>,
}

impl ExecutionProcessor {
    pub fn new(config: &Config) -> Self {
        let chain = config.chain();
        let worker = config.worker();
        Self {
            queue: config.queue(),
            connector: config.chain_connector(),
            resolver: SubnetResolver::new(config.chain_connector(), chain),
            poller: CertificatePoller::new(
                worker.certificate_poll_interval,
                worker.certificate_max_attempts,
                config.metrics(),
            ),
            private_key: chain.private_key.clone(),
            core_address: chain.topos_core_proxy_contract_address.clone(),
            gas_limit: worker.gas_limit,
            metrics: config.metrics(),
        }
    }

    /// Settles the job as completed or failed. Panics in the pipeline fail the job too, so the
    /// only error left is the queue refusing the terminal write.
    pub async fn process(&self, job: &Job) -> Result<(), QueueError> {
        let started = Instant::now();
        let mut state = ExecutionState::Resolving;

        let outcome = match AssertUnwindSafe(self.execute(job, &mut state)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(ExecutionError::Panicked(panic_message(panic))),
        };

        let settled = match outcome {
            Ok(receipt) => {
                info!(tx_hash = %receipt.transaction_hash, block_number = ?receipt.block_number, "✅ Job completed");
                self.metrics.jobs_completed.add(1, &[]);
                self.queue.complete(&job.id, receipt).await
            }
            Err(e) => {
                error!(state = %state, error = %e, "❌ Job failed");
                self.metrics.jobs_failed.add(1, &[KeyValue::new("state", state.to_string())]);
                self.queue.fail(&job.id, &e.to_string()).await
            }
        };

        self.metrics.job_duration.record(started.elapsed().as_secs_f64(), &[]);
        settled
    }

    async fn execute(&self, job: &Job, state: &mut ExecutionState) -> ExecutionResult<ExecutionReceipt> {
        let request = &job.data.request;

        *state = ExecutionState::Resolving;
        let endpoint = self.resolver.resolve(&request.subnet_id).await?;

        *state = ExecutionState::Connecting;
        let client = self.connector.connect(&endpoint).await?;
        let signer = client.load_signer(&self.private_key)?;

        *state = ExecutionState::LoadingContracts;
        let core = client.load_contract(&self.core_address, ContractKind::ToposCore).await?;
        let messaging = client.load_contract(&request.messaging_contract_address, ContractKind::ToposMessaging).await?;

        let receipt_trie_root = B256::from_str(&request.receipt_trie_root)
            .map_err(|e| ExecutionError::InvalidReceiptTrieRoot(format!("{}: {e}", request.receipt_trie_root)))?;
        let receipt_trie_merkle_proof = Bytes::from_str(&request.receipt_trie_merkle_proof)
            .map_err(|e| ExecutionError::InvalidReceiptTrieMerkleProof(e.to_string()))?;

        *state = ExecutionState::AwaitingCertificate;
        let cert_id = self.poller.wait_for_certificate(client.as_ref(), &core, receipt_trie_root).await?;
        info!(cert_id = %cert_id, "📜 Certificate found");
        self.queue.report_progress(&job.id, JobProgress::CertificateFound).await?;

        *state = ExecutionState::Submitting;
        let call = ExecuteCall {
            log_indexes: request.log_indexes.clone(),
            receipt_trie_merkle_proof,
            receipt_trie_root,
            gas_limit: self.gas_limit,
        };
        let pending = client.execute(&messaging, &signer, call).await?;

        *state = ExecutionState::Confirming;
        let receipt = client.wait_for_receipt(&pending).await?;
        if !receipt.status {
            return Err(ExecutionError::TransactionFailed(receipt.transaction_hash.to_string()));
        }
        self.queue.report_progress(&job.id, JobProgress::Confirmed).await?;

        Ok(receipt)
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return message.to_string();
    }
    if let Some(message) = panic.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_string()
}
