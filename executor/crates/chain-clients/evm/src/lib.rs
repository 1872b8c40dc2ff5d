use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::consensus::TxReceipt as _;
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{PendingTransactionConfig, Provider, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::BoxTransport;
use async_trait::async_trait;
use executor_chain_client_interface::{
    parse_private_key, ChainClient, ChainClientError, ChainClientResult, ChainConnector, ContractHandle, ContractKind,
    ExecuteCall, ExecutionReceipt, PendingExecution, SignerHandle, SubnetEndpoints,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::contracts::{IToposCore, IToposMessaging, ISubnetRegistrator};
use crate::revert::decode_revert;

pub mod contracts;
pub mod revert;

/// Time an endpoint must stay healthy after the connection is opened.
pub const DEFAULT_LIVENESS_GRACE: Duration = Duration::from_secs(1);

/// Opens alloy backed connections to http(s) and ws(s) endpoints.
#[derive(Debug, Clone)]
pub struct EvmConnector {
    liveness_grace: Duration,
}

impl EvmConnector {
    pub fn new(liveness_grace: Duration) -> Self {
        Self { liveness_grace }
    }
}

impl Default for EvmConnector {
    fn default() -> Self {
        Self::new(DEFAULT_LIVENESS_GRACE)
    }
}

#[async_trait]
impl ChainConnector for EvmConnector {
    async fn connect(&self, endpoint: &str) -> ChainClientResult<Arc<dyn ChainClient>> {
        let client = EvmChainClient::connect(endpoint, self.liveness_grace).await?;
        Ok(Arc::new(client))
    }
}

pub struct EvmChainClient {
    endpoint: String,
    provider: RootProvider<BoxTransport>,
}

impl EvmChainClient {
    /// Opens the connection, then races a chain id request against the liveness window.
    /// Streaming transports report most failures asynchronously, so an error surfacing
    /// inside the window rejects the endpoint. A request still pending when the window
    /// closes does not.
    pub async fn connect(endpoint: &str, liveness_grace: Duration) -> ChainClientResult<Self> {
        let invalid =
            |reason: String| ChainClientError::ProviderInvalidEndpoint { endpoint: endpoint.to_string(), reason };

        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" | "ws" | "wss" => {}
            scheme => return Err(invalid(format!("unsupported scheme `{scheme}`"))),
        }

        let opened_at = Instant::now();
        let provider = ProviderBuilder::new().on_builtin(url.as_str()).await.map_err(|e| invalid(e.to_string()))?;

        match tokio::time::timeout(liveness_grace, provider.get_chain_id()).await {
            Ok(Ok(chain_id)) => {
                debug!(endpoint = %endpoint, chain_id = chain_id, "Endpoint answered the liveness check");
                tokio::time::sleep_until(opened_at + liveness_grace).await;
            }
            Ok(Err(e)) => return Err(invalid(e.to_string())),
            Err(_) => {
                warn!(endpoint = %endpoint, grace = ?liveness_grace, "Liveness check still pending, accepting endpoint");
            }
        }

        info!(endpoint = %endpoint, "🔗 Connected to chain endpoint");
        Ok(Self { endpoint: endpoint.to_string(), provider })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn call_error(method: &str, error: alloy::contract::Error) -> ChainClientError {
    ChainClientError::ContractCall { method: method.to_string(), reason: error.to_string() }
}

fn revert_data(error: &alloy::contract::Error) -> Option<Bytes> {
    match error {
        alloy::contract::Error::TransportError(e) => e.as_error_resp().and_then(|payload| payload.as_revert_data()),
        _ => None,
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    async fn load_contract(&self, address: &str, kind: ContractKind) -> ChainClientResult<ContractHandle> {
        let invalid_address =
            |reason: String| ChainClientError::ContractInvalidAddress { address: address.to_string(), reason };

        let parsed = Address::from_str(address).map_err(|e| invalid_address(e.to_string()))?;
        let code = self.provider.get_code_at(parsed).await.map_err(|e| invalid_address(e.to_string()))?;
        if code.is_empty() {
            return Err(ChainClientError::ContractInvalidNoCode { address: address.to_string() });
        }

        debug!(endpoint = %self.endpoint, address = %parsed, kind = ?kind, "Contract loaded");
        Ok(ContractHandle { address: parsed, kind })
    }

    fn load_signer(&self, private_key: &str) -> ChainClientResult<SignerHandle> {
        let secret = parse_private_key(private_key)?;
        let signer = PrivateKeySigner::from_bytes(&secret).map_err(|_| ChainClientError::WalletInvalidPrivateKey)?;
        Ok(SignerHandle::new(signer.address(), secret))
    }

    async fn network_subnet_id(&self, core: &ContractHandle) -> ChainClientResult<B256> {
        let contract = IToposCore::new(core.address, &self.provider);
        Ok(contract.networkSubnetId().call().await.map_err(|e| call_error("networkSubnetId", e))?._0)
    }

    async fn subnet_endpoints(
        &self,
        registrator: &ContractHandle,
        subnet_id: B256,
    ) -> ChainClientResult<SubnetEndpoints> {
        let contract = ISubnetRegistrator::new(registrator.address, &self.provider);
        let subnet = contract.subnets(subnet_id).call().await.map_err(|e| call_error("subnets", e))?;
        Ok(SubnetEndpoints { endpoint_http: subnet.endpointHttp, endpoint_ws: subnet.endpointWs })
    }

    async fn receipt_root_to_cert_id(&self, core: &ContractHandle, receipt_root: B256) -> ChainClientResult<B256> {
        let contract = IToposCore::new(core.address, &self.provider);
        Ok(contract.receiptRootToCertId(receipt_root).call().await.map_err(|e| call_error("receiptRootToCertId", e))?._0)
    }

    async fn execute(
        &self,
        messaging: &ContractHandle,
        signer: &SignerHandle,
        call: ExecuteCall,
    ) -> ChainClientResult<PendingExecution> {
        let wallet_signer =
            PrivateKeySigner::from_bytes(signer.secret()).map_err(|_| ChainClientError::WalletInvalidPrivateKey)?;
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(wallet_signer))
            .on_provider(self.provider.clone());

        let contract = IToposMessaging::new(messaging.address, &provider);
        let log_indexes = call.log_indexes.iter().map(|index| U256::from(*index)).collect::<Vec<_>>();
        let execute = contract
            .execute(log_indexes, call.receipt_trie_merkle_proof, call.receipt_trie_root)
            .from(signer.address)
            .gas(call.gas_limit);

        // dry-run
        if let Err(error) = execute.call().await {
            return Err(match revert_data(&error) {
                Some(data) => ChainClientError::ExecuteTransactionRevert(decode_revert(&data)),
                None => ChainClientError::ExecuteTransactionFailedInit(error.to_string()),
            });
        }

        let pending =
            execute.send().await.map_err(|e| ChainClientError::ExecuteTransactionFailedInit(e.to_string()))?;
        let transaction_hash = *pending.tx_hash();
        info!(endpoint = %self.endpoint, tx_hash = %transaction_hash, "📤 Execute transaction broadcast");
        Ok(PendingExecution { transaction_hash })
    }

    async fn wait_for_receipt(&self, pending: &PendingExecution) -> ChainClientResult<ExecutionReceipt> {
        let receipt_error = |reason: String| ChainClientError::Receipt(reason);

        let tx_hash = self
            .provider
            .watch_pending_transaction(PendingTransactionConfig::new(pending.transaction_hash))
            .await
            .map_err(|e| receipt_error(e.to_string()))?
            .await
            .map_err(|e| receipt_error(e.to_string()))?;

        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| receipt_error(e.to_string()))?
            .ok_or_else(|| receipt_error(format!("no receipt returned for mined transaction {tx_hash}")))?;

        Ok(ExecutionReceipt {
            transaction_hash: receipt.transaction_hash,
            block_hash: receipt.block_hash,
            block_number: receipt.block_number,
            from: receipt.from,
            to: receipt.to,
            gas_used: receipt.gas_used as u64,
            effective_gas_price: receipt.effective_gas_price.to_string(),
            status: receipt.status(),
        })
    }
}
