use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A request to execute a cross-subnet message on its receiving subnet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    /// The id of the receiving subnet
    pub subnet_id: String,
    /// Indexes of the message logs in the receipt of the sending transaction
    pub log_indexes: Vec<u64>,
    /// Root of the receipt trie including the sending transaction's receipt
    pub receipt_trie_root: String,
    /// Inclusion proof of the receipt under `receipt_trie_root`
    pub receipt_trie_merkle_proof: String,
    /// The messaging contract executing the message on the receiving subnet
    pub messaging_contract_address: String,
}

/// Every constraint an execution request body violated, in field order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", .0.join(", "))]
pub struct ValidationErrors(pub Vec<String>);

impl ExecutionRequest {
    /// Validates a raw request body, reporting all violations at once instead of stopping
    /// at the first one.
    pub fn validate(body: &Value) -> Result<Self, ValidationErrors> {
        let mut violations = Vec::new();

        let subnet_id = required_string(body, "subnetId", &mut violations);
        let log_indexes = log_indexes(body, "logIndexes", &mut violations);
        let receipt_trie_root = required_string(body, "receiptTrieRoot", &mut violations);
        let receipt_trie_merkle_proof = required_string(body, "receiptTrieMerkleProof", &mut violations);
        let messaging_contract_address = ethereum_address(body, "messagingContractAddress", &mut violations);

        match (subnet_id, log_indexes, receipt_trie_root, receipt_trie_merkle_proof, messaging_contract_address) {
            (
                Some(subnet_id),
                Some(log_indexes),
                Some(receipt_trie_root),
                Some(receipt_trie_merkle_proof),
                Some(messaging_contract_address),
            ) if violations.is_empty() => Ok(Self {
                subnet_id,
                log_indexes,
                receipt_trie_root,
                receipt_trie_merkle_proof,
                messaging_contract_address,
            }),
            _ => Err(ValidationErrors(violations)),
        }
    }
}

fn field<'a>(body: &'a Value, name: &str) -> Option<&'a Value> {
    body.get(name).filter(|value| !value.is_null())
}

fn required_string(body: &Value, name: &str, violations: &mut Vec<String>) -> Option<String> {
    match field(body, name) {
        None => {
            violations.push(format!("{name} should not be null or undefined"));
            violations.push(format!("{name} should not be empty"));
            violations.push(format!("{name} must be a string"));
            None
        }
        Some(Value::String(value)) if value.is_empty() => {
            violations.push(format!("{name} should not be empty"));
            None
        }
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => {
            violations.push(format!("{name} must be a string"));
            None
        }
    }
}

fn log_indexes(body: &Value, name: &str, violations: &mut Vec<String>) -> Option<Vec<u64>> {
    let items = match field(body, name) {
        None => {
            violations.push(format!("{name} should not be null or undefined"));
            violations.push(format!("{name} must be an array"));
            violations.push(format!("{name} should not be empty"));
            return None;
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            violations.push(format!("{name} must be an array"));
            return None;
        }
    };

    if items.is_empty() {
        violations.push(format!("{name} should not be empty"));
        return None;
    }

    let integers = items.iter().map(|item| item.as_i64().or_else(|| item.as_u64().map(|_| 0))).collect::<Vec<_>>();
    if integers.iter().any(Option::is_none) {
        violations.push(format!("each value in {name} must be an integer number"));
    }
    if integers.iter().flatten().any(|value| *value < 0) {
        violations.push(format!("each value in {name} must not be less than 0"));
    }

    items.iter().map(Value::as_u64).collect()
}

fn ethereum_address(body: &Value, name: &str, violations: &mut Vec<String>) -> Option<String> {
    let Some(value) = field(body, name) else {
        violations.push(format!("{name} should not be empty"));
        violations.push(format!("{name} must be an Ethereum address"));
        return None;
    };

    if value.as_str() == Some("") {
        violations.push(format!("{name} should not be empty"));
    }

    match value.as_str().filter(|address| is_checksum_address(address)) {
        Some(address) => Some(address.to_string()),
        None => {
            violations.push(format!("{name} must be an Ethereum address"));
            None
        }
    }
}

/// `0x` followed by 40 hex characters. Mixed case addresses must carry a valid EIP-55 checksum.
fn is_checksum_address(address: &str) -> bool {
    let Some(hex) = address.strip_prefix("0x") else {
        return false;
    };
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    let Ok(parsed) = Address::from_str(address) else {
        return false;
    };

    let is_lower = hex.chars().all(|c| !c.is_ascii_uppercase());
    let is_upper = hex.chars().all(|c| !c.is_ascii_lowercase());
    is_lower || is_upper || parsed.to_checksum(None) == address
}
