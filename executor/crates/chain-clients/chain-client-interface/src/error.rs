use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Revert information extracted from a failed dry-run.
///
/// `decoded` tells whether `data` holds a human readable reason (custom error name or
/// `Error(string)` message) or the raw hex encoded revert data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertPayload {
    pub decoded: bool,
    pub data: String,
}

impl std::fmt::Display for RevertPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{{\"decoded\":{},\"data\":\"{}\"}}", self.decoded, self.data),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainClientError {
    #[error("Provider // Invalid endpoint! ({endpoint}): {reason}")]
    ProviderInvalidEndpoint { endpoint: String, reason: String },

    #[error("Wallet // Invalid private key!")]
    WalletInvalidPrivateKey,

    #[error("Contract // Invalid address! ({address}): {reason}")]
    ContractInvalidAddress { address: String, reason: String },

    #[error("Contract // Invalid contract! No code at {address}")]
    ContractInvalidNoCode { address: String },

    #[error("Contract // Call to {method} failed: {reason}")]
    ContractCall { method: String, reason: String },

    #[error("Execute // Failed to initialize the transaction: {0}")]
    ExecuteTransactionFailedInit(String),

    #[error("Execute // Transaction reverted: {0}")]
    ExecuteTransactionRevert(RevertPayload),

    #[error("Execute // Failed to fetch the transaction receipt: {0}")]
    Receipt(String),
}

pub type ChainClientResult<T> = Result<T, ChainClientError>;
