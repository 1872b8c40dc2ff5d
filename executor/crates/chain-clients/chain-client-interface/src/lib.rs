use std::sync::Arc;

use alloy_primitives::B256;
use async_trait::async_trait;
use mockall::automock;

pub mod error;
pub mod types;

pub use error::{ChainClientError, ChainClientResult, RevertPayload};
pub use types::{
    parse_private_key, ContractHandle, ContractKind, ExecuteCall, ExecutionReceipt, PendingExecution, SignerHandle,
    SubnetEndpoints,
};

/// Opens connections to chain endpoints.
#[automock]
#[async_trait]
pub trait ChainConnector: Send + Sync {
    /// Should open a connection to `endpoint` and only return it once the endpoint
    /// survived the liveness window without reporting an error.
    async fn connect(&self, endpoint: &str) -> ChainClientResult<Arc<dyn ChainClient>>;
}

/// A live connection to one chain.
#[automock]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Should verify that code is deployed at `address` before handing out a handle.
    async fn load_contract(&self, address: &str, kind: ContractKind) -> ChainClientResult<ContractHandle>;

    /// Should validate the private key and derive the address it controls.
    fn load_signer(&self, private_key: &str) -> ChainClientResult<SignerHandle>;

    /// Should read the subnet id of the chain from its core contract.
    async fn network_subnet_id(&self, core: &ContractHandle) -> ChainClientResult<B256>;

    /// Should read the registration record of `subnet_id` from the subnet registrator.
    async fn subnet_endpoints(&self, registrator: &ContractHandle, subnet_id: B256)
        -> ChainClientResult<SubnetEndpoints>;

    /// Should return the certificate id covering `receipt_root`, zero when none is known yet.
    async fn receipt_root_to_cert_id(&self, core: &ContractHandle, receipt_root: B256) -> ChainClientResult<B256>;

    /// Should dry-run the messaging `execute` call and broadcast it when it does not revert.
    async fn execute(
        &self,
        messaging: &ContractHandle,
        signer: &SignerHandle,
        call: ExecuteCall,
    ) -> ChainClientResult<PendingExecution>;

    /// Should wait until the transaction is mined. No timeout is applied.
    async fn wait_for_receipt(&self, pending: &PendingExecution) -> ChainClientResult<ExecutionReceipt>;
}
