use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::B256;
use executor_chain_client_interface::{ChainConnector, ContractKind};
use tracing::{debug, info};

use crate::error::{ExecutionError, ExecutionResult};
use crate::types::params::ChainParams;
use crate::utils::helpers::{sanitize_url_protocol, EndpointKind};

/// Maps a subnet id to the endpoint of that subnet, through the registry on the home subnet.
/// Nothing is cached, every call resolves again.
pub struct SubnetResolver {
    connector: Arc<dyn ChainConnector>,
    home_endpoint: String,
    core_address: String,
    registrator_address: String,
}

impl SubnetResolver {
    pub fn new(connector: Arc<dyn ChainConnector>, chain: &ChainParams) -> Self {
        Self {
            connector,
            home_endpoint: chain.topos_subnet_endpoint.clone(),
            core_address: chain.topos_core_proxy_contract_address.clone(),
            registrator_address: chain.subnet_registrator_contract_address.clone(),
        }
    }

    pub async fn resolve(&self, subnet_id: &str) -> ExecutionResult<String> {
        let requested = B256::from_str(subnet_id).map_err(|_| ExecutionError::InvalidSubnetId(subnet_id.to_string()))?;

        let home = self.connector.connect(&self.home_endpoint).await?;
        let core = home.load_contract(&self.core_address, ContractKind::ToposCore).await?;
        let home_subnet_id = home.network_subnet_id(&core).await?;

        if home_subnet_id == requested {
            debug!(subnet_id = %requested, "Receiving subnet is the home subnet");
            return Ok(self.home_endpoint.clone());
        }

        let registrator = home.load_contract(&self.registrator_address, ContractKind::SubnetRegistrator).await?;
        let endpoints = home.subnet_endpoints(&registrator, requested).await?;

        let endpoint = if !endpoints.endpoint_ws.is_empty() {
            sanitize_url_protocol(&endpoints.endpoint_ws, EndpointKind::Ws)
        } else if !endpoints.endpoint_http.is_empty() {
            sanitize_url_protocol(&endpoints.endpoint_http, EndpointKind::Http)
        } else {
            return Err(ExecutionError::SubnetNotFound(subnet_id.to_string()));
        };

        info!(subnet_id = %requested, endpoint = %endpoint, "🧭 Subnet endpoint resolved");
        Ok(endpoint)
    }
}
