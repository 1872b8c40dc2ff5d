use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::error::{ChainClientError, ChainClientResult};

/// The contract ABIs the executor talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    ToposCore,
    SubnetRegistrator,
    ToposMessaging,
}

/// A contract whose code presence has been verified on the connected chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractHandle {
    pub address: Address,
    pub kind: ContractKind,
}

/// A validated signing key together with the address it controls.
#[derive(Clone, PartialEq, Eq)]
pub struct SignerHandle {
    pub address: Address,
    secret: B256,
}

impl SignerHandle {
    pub fn new(address: Address, secret: B256) -> Self {
        Self { address, secret }
    }

    pub fn secret(&self) -> &B256 {
        &self.secret
    }
}

impl std::fmt::Debug for SignerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerHandle").field("address", &self.address).finish_non_exhaustive()
    }
}

/// Endpoints registered for a subnet in the registrator contract. Either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubnetEndpoints {
    pub endpoint_http: String,
    pub endpoint_ws: String,
}

/// Arguments of the messaging contract `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteCall {
    pub log_indexes: Vec<u64>,
    pub receipt_trie_merkle_proof: Bytes,
    pub receipt_trie_root: B256,
    pub gas_limit: u64,
}

/// A broadcast transaction whose receipt has not been observed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingExecution {
    pub transaction_hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    pub transaction_hash: B256,
    pub block_hash: Option<B256>,
    pub block_number: Option<u64>,
    pub from: Address,
    pub to: Option<Address>,
    pub gas_used: u64,
    /// Decimal wei amount; kept as a string since it does not fit every storage backend's integers.
    pub effective_gas_price: String,
    pub status: bool,
}

/// Validates a `0x` prefixed, 32 byte hex encoded private key.
pub fn parse_private_key(private_key: &str) -> ChainClientResult<B256> {
    let hex = private_key.strip_prefix("0x").ok_or(ChainClientError::WalletInvalidPrivateKey)?;
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ChainClientError::WalletInvalidPrivateKey);
    }
    let secret = B256::from_str(hex).map_err(|_| ChainClientError::WalletInvalidPrivateKey)?;
    if secret.is_zero() {
        return Err(ChainClientError::WalletInvalidPrivateKey);
    }
    Ok(secret)
}
