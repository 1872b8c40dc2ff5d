use clap::Args;

/// Parameters used to reach the Topos subnet and sign on receiving subnets.
#[derive(Debug, Clone, Args)]
pub struct ChainCliArgs {
    /// Private key of the account sending execute transactions.
    #[arg(env = "EXECUTOR_PRIVATE_KEY", long, hide_env_values = true)]
    pub private_key: Option<String>,

    /// Address of the ToposCore proxy, deployed at the same address on every subnet.
    #[arg(env = "EXECUTOR_TOPOS_CORE_PROXY_CONTRACT_ADDRESS", long)]
    pub topos_core_proxy_contract_address: Option<String>,

    /// Address of the SubnetRegistrator on the Topos subnet.
    #[arg(env = "EXECUTOR_SUBNET_REGISTRATOR_CONTRACT_ADDRESS", long)]
    pub subnet_registrator_contract_address: Option<String>,

    /// Endpoint of the Topos subnet, e.g. ws://localhost:8545
    #[arg(env = "EXECUTOR_TOPOS_SUBNET_ENDPOINT", long)]
    pub topos_subnet_endpoint: Option<String>,

    /// How long a new connection must stay error free before it is used.
    #[arg(env = "EXECUTOR_CONNECTION_GRACE_MS", long, default_value_t = 1000)]
    pub connection_grace_ms: u64,
}
