use std::time::Duration;

use crate::cli::chain::ChainCliArgs;
use crate::ExecutorError;

/// Chain related parameters shared by the service and the workers.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub private_key: String,
    pub topos_core_proxy_contract_address: String,
    pub subnet_registrator_contract_address: String,
    pub topos_subnet_endpoint: String,
    pub connection_grace: Duration,
}

impl TryFrom<ChainCliArgs> for ChainParams {
    type Error = ExecutorError;

    fn try_from(args: ChainCliArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            private_key: args
                .private_key
                .ok_or_else(|| ExecutorError::MissingArgument("EXECUTOR_PRIVATE_KEY".to_string()))?,
            topos_core_proxy_contract_address: args.topos_core_proxy_contract_address.ok_or_else(|| {
                ExecutorError::MissingArgument("EXECUTOR_TOPOS_CORE_PROXY_CONTRACT_ADDRESS".to_string())
            })?,
            subnet_registrator_contract_address: args.subnet_registrator_contract_address.ok_or_else(|| {
                ExecutorError::MissingArgument("EXECUTOR_SUBNET_REGISTRATOR_CONTRACT_ADDRESS".to_string())
            })?,
            topos_subnet_endpoint: args
                .topos_subnet_endpoint
                .ok_or_else(|| ExecutorError::MissingArgument("EXECUTOR_TOPOS_SUBNET_ENDPOINT".to_string()))?,
            connection_grace: Duration::from_millis(args.connection_grace_ms),
        })
    }
}
