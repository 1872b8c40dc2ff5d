use std::sync::Arc;

use clap::Parser as _;
use dotenvy::dotenv;
use executor::cli::{Cli, Commands, RunCmd, SetupCmd};
use executor::core::config::Config;
use executor::server::setup_server;
use executor::service::ExecutionService;
use executor::setup::setup;
use executor::types::constant::EXECUTOR_VERSION;
use executor::types::params::OTELConfig;
use executor::utils::instrument::ExecutorInstrumentation;
use executor::utils::logging::init_logging;
use executor::utils::metrics::ExecutorMetrics;
use executor::worker::initialize_worker;
use executor::ExecutorResult;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Start the executor
#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { run_command } => match run_executor(run_command).await {
            Ok(_) => {
                info!("Executor service stopped");
            }
            Err(e) => {
                error!(
                    error = %e,
                    error_chain = ?e,
                    "Failed to run executor service"
                );
                panic!("Failed to run executor service: {}", e);
            }
        },
        Commands::Setup { setup_command } => match setup_executor(setup_command).await {
            Ok(_) => {
                info!("Executor setup completed successfully");
            }
            Err(e) => {
                error!(
                    error = %e,
                    error_chain = ?e,
                    "Failed to setup executor"
                );
                panic!("Failed to setup executor: {}", e);
            }
        },
    }
}

async fn run_executor(run_cmd: &RunCmd) -> ExecutorResult<()> {
    let otel_config = OTELConfig::try_from(run_cmd.instrumentation_args.clone())?;
    let instrumentation = ExecutorInstrumentation::new(&otel_config)?;
    init_logging(&instrumentation);
    info!(version = EXECUTOR_VERSION, "Starting executor service");

    let metrics = Arc::new(ExecutorMetrics::register(&instrumentation.meter()));
    let config = Arc::new(Config::from_run_cmd(run_cmd, metrics).await?);
    debug!("Configuration initialized");

    // refuses to start on a malformed key or an unavailable broker
    let service = Arc::new(ExecutionService::new(&config).await?);

    let worker_controller = initialize_worker(config.clone(), CancellationToken::new());
    let (address, server_handle) = setup_server(config.server_config(), service).await?;
    info!(address = %address, "Executor service started successfully");

    tokio::signal::ctrl_c().await?;
    info!("Executor service shutting down");

    if let Err(e) = server_handle.shutdown().await {
        error!(error = %e, "API server task failed");
    }
    worker_controller.shutdown().await?;

    instrumentation.shutdown()?;
    Ok(())
}

/// Creates the queue and database resources of the `sqs` backend
async fn setup_executor(setup_cmd: &SetupCmd) -> ExecutorResult<()> {
    let instrumentation =
        ExecutorInstrumentation::new(&OTELConfig { endpoint: None, service_name: "executor-setup".to_string() })?;
    init_logging(&instrumentation);
    info!(
        queue = %setup_cmd.queue_args.sqs_queue_name,
        database = %setup_cmd.mongodb_args.mongodb_database_name,
        "Executing setup command"
    );
    setup(setup_cmd).await
}
