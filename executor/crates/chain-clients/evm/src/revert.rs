use alloy::hex;
use alloy::sol_types::{Revert, SolError, SolInterface};
use executor_chain_client_interface::RevertPayload;

use crate::contracts::IToposMessaging::IToposMessagingErrors;

fn messaging_error_name(error: &IToposMessagingErrors) -> &'static str {
    match error {
        IToposMessagingErrors::CertNotPresent(_) => "CertNotPresent",
        IToposMessagingErrors::IllegalMemoryAccess(_) => "IllegalMemoryAccess",
        IToposMessagingErrors::InvalidMerkleProof(_) => "InvalidMerkleProof",
        IToposMessagingErrors::InvalidSubnetId(_) => "InvalidSubnetId",
        IToposMessagingErrors::InvalidTransactionStatus(_) => "InvalidTransactionStatus",
        IToposMessagingErrors::LogIndexOutOfRange(_) => "LogIndexOutOfRange",
        IToposMessagingErrors::TransactionAlreadyExecuted(_) => "TransactionAlreadyExecuted",
        IToposMessagingErrors::UnsupportedProofKind(_) => "UnsupportedProofKind",
    }
}

/// Best-effort decoding of revert data returned by a messaging contract dry-run.
pub fn decode_revert(data: &[u8]) -> RevertPayload {
    if let Ok(error) = IToposMessagingErrors::abi_decode(data, true) {
        return RevertPayload { decoded: true, data: messaging_error_name(&error).to_string() };
    }
    if let Ok(revert) = Revert::abi_decode(data, true) {
        return RevertPayload { decoded: true, data: revert.reason };
    }
    RevertPayload { decoded: false, data: hex::encode_prefixed(data) }
}
