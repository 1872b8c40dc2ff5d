
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use constants::*;
use executor_chain_client_interface::{
    ChainClient, ChainClientError, ContractHandle, ContractKind, ExecutionReceipt, MockChainClient, MockChainConnector,
    PendingExecution, SignerHandle,
};
use rstest::*;

use crate::types::jobs::{JobData, TracingOptions};
use crate::types::params::{AWSParams, DatabaseParams};
use crate::types::request::ExecutionRequest;

pub const TRANSACTION_HASH: B256 = B256::repeat_byte(0x42);
pub const CERTIFICATE_ID: B256 = B256::repeat_byte(0x07);

#[fixture]
pub fn execution_request(#[default(HOME_SUBNET_ID)] subnet_id: &str) -> ExecutionRequest {
    ExecutionRequest {
        subnet_id: subnet_id.to_string(),
        log_indexes: vec![0],
        receipt_trie_root: RECEIPT_TRIE_ROOT.to_string(),
        receipt_trie_merkle_proof: RECEIPT_TRIE_MERKLE_PROOF.to_string(),
        messaging_contract_address: MESSAGING_CONTRACT_ADDRESS.to_string(),
    }
}

#[fixture]
pub fn job_data(execution_request: ExecutionRequest) -> JobData {
    JobData::new(execution_request, TracingOptions::default())
}

pub fn receipt(status: bool) -> ExecutionReceipt {
    ExecutionReceipt {
        transaction_hash: TRANSACTION_HASH,
        block_hash: Some(B256::repeat_byte(0x0b)),
        block_number: Some(12),
        from: Address::repeat_byte(0x11),
        to: Some(Address::from_str(MESSAGING_CONTRACT_ADDRESS).expect("valid address")),
        gas_used: 61_000,
        effective_gas_price: "1000000007".to_string(),
        status,
    }
}

/// A fresh database on the integration test MongoDB.
pub fn integration_database() -> DatabaseParams {
    DatabaseParams {
        connection_uri: std::env::var("EXECUTOR_TEST_MONGODB_CONNECTION_URL")
            .unwrap_or_else(|_| TEST_MONGODB_CONNECTION_URL.to_string()),
        database_name: format!("executor-test-{}", uuid::Uuid::new_v4().simple()),
    }
}

pub fn integration_aws() -> AWSParams {
    AWSParams {
        region: Some(TEST_AWS_REGION.to_string()),
        endpoint_url: Some(
            std::env::var("EXECUTOR_TEST_AWS_ENDPOINT_URL").unwrap_or_else(|_| TEST_AWS_ENDPOINT_URL.to_string()),
        ),
    }
}

pub fn b256(value: &str) -> B256 {
    B256::from_str(value).expect("valid 32 byte hex")
}

/// Every contract address has code.
pub fn expect_contracts(client: &mut MockChainClient) {
    client.expect_load_contract().returning(|address, kind| {
        Ok(ContractHandle { address: Address::from_str(address).expect("valid address"), kind })
    });
}

/// Contracts have code except the messaging contract.
pub fn expect_messaging_without_code(client: &mut MockChainClient) {
    client.expect_load_contract().returning(|address, kind| match kind {
        ContractKind::ToposMessaging => Err(ChainClientError::ContractInvalidNoCode { address: address.to_string() }),
        _ => Ok(ContractHandle { address: Address::from_str(address).expect("valid address"), kind }),
    });
}

pub fn expect_signer(client: &mut MockChainClient) {
    client
        .expect_load_signer()
        .returning(|_| Ok(SignerHandle::new(Address::repeat_byte(0x11), b256(VALID_PRIVATE_KEY))));
}

pub fn expect_home_subnet(client: &mut MockChainClient, home_subnet_id: &str) {
    let id = b256(home_subnet_id);
    client.expect_network_subnet_id().returning(move |_| Ok(id));
}

/// A chain where the certificate is already known and the execute transaction succeeds.
pub fn executing_chain_client() -> MockChainClient {
    let mut client = MockChainClient::new();
    expect_contracts(&mut client);
    expect_signer(&mut client);
    expect_home_subnet(&mut client, HOME_SUBNET_ID);
    client.expect_receipt_root_to_cert_id().returning(|_, _| Ok(CERTIFICATE_ID));
    client.expect_execute().returning(|_, _, _| Ok(PendingExecution { transaction_hash: TRANSACTION_HASH }));
    client.expect_wait_for_receipt().returning(|_| Ok(receipt(true)));
    client
}

/// Every endpoint connects to `client`.
pub fn connector_for(client: MockChainClient) -> MockChainConnector {
    let client: Arc<dyn ChainClient> = Arc::new(client);
    let mut connector = MockChainConnector::new();
    connector.expect_connect().returning(move |_| Ok(client.clone()));
    connector
}
