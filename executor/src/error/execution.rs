use executor_chain_client_interface::ChainClientError;
use thiserror::Error;

use crate::core::client::queue::QueueError;

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Reasons an execution job ends up failed. The `Display` text is what gets stored as the
/// job's failure reason.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    ChainClient(#[from] ChainClientError),

    #[error("Subnet // Invalid subnet id: {0}")]
    InvalidSubnetId(String),

    #[error("Subnet // No endpoint is registered for subnet {0}")]
    SubnetNotFound(String),

    #[error("Certificate // No certificate found for receipt trie root {receipt_trie_root} after {attempts} attempts")]
    CertificateNotFound { receipt_trie_root: String, attempts: u32 },

    #[error("Execute // Invalid receipt trie root: {0}")]
    InvalidReceiptTrieRoot(String),

    #[error("Execute // Invalid receipt trie merkle proof: {0}")]
    InvalidReceiptTrieMerkleProof(String),

    #[error("Execute // Transaction {0} was mined but reverted")]
    TransactionFailed(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Execute // Worker panicked: {0}")]
    Panicked(String),
}
