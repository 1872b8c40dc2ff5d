use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::B256;
use executor_chain_client_interface::{ChainClient, ChainClientError, ContractHandle};
use tracing::{debug, warn};

use crate::error::{ExecutionError, ExecutionResult};
use crate::utils::metrics::ExecutorMetrics;

/// Waits for a receipt trie root to be covered by a certificate on the receiving subnet.
pub struct CertificatePoller {
    interval: Duration,
    max_attempts: u32,
    metrics: Arc<ExecutorMetrics>,
}

impl CertificatePoller {
    pub fn new(interval: Duration, max_attempts: u32, metrics: Arc<ExecutorMetrics>) -> Self {
        Self { interval, max_attempts: max_attempts.max(1), metrics }
    }

    /// Queries `receiptRootToCertId` once per interval, at most `max_attempts` times. The zero
    /// id means the certificate has not been observed yet and is never returned.
    ///
    /// Read errors count as attempts. When every attempt failed, the last read error is
    /// returned instead of `CertificateNotFound`.
    pub async fn wait_for_certificate(
        &self,
        client: &dyn ChainClient,
        core: &ContractHandle,
        receipt_trie_root: B256,
    ) -> ExecutionResult<B256> {
        let mut last_error: Option<ChainClientError> = None;
        let mut failed_reads = 0;

        for attempt in 1..=self.max_attempts {
            self.metrics.certificate_poll_attempts.add(1, &[]);

            match client.receipt_root_to_cert_id(core, receipt_trie_root).await {
                Ok(cert_id) if cert_id != B256::ZERO => {
                    debug!(attempt, cert_id = %cert_id, "Certificate observed");
                    return Ok(cert_id);
                }
                Ok(_) => debug!(attempt, max_attempts = self.max_attempts, "Certificate not observed yet"),
                Err(e) => {
                    warn!(attempt, error = %e, "Certificate lookup failed");
                    failed_reads += 1;
                    last_error = Some(e);
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        match last_error {
            Some(e) if failed_reads == self.max_attempts => Err(e.into()),
            _ => Err(ExecutionError::CertificateNotFound {
                receipt_trie_root: receipt_trie_root.to_string(),
                attempts: self.max_attempts,
            }),
        }
    }
}
