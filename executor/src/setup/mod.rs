use aws_config::SdkConfig;
use tracing::{debug, info};

use crate::cli::SetupCmd;
use crate::core::client::queue::sqs::InnerSQS;
use crate::core::client::MongoDbClient;
use crate::types::params::{QueueBackendParams, QueueParams, SqsParams};
use crate::{ExecutorError, ExecutorResult};

/// Creates the SQS queue and the MongoDB indexes the `sqs` backend relies on.
/// Both steps are idempotent, running setup again on existing resources succeeds.
pub async fn setup(setup_cmd: &SetupCmd) -> ExecutorResult<()> {
    let queue_params = QueueParams::try_from(setup_cmd.clone())?;
    debug!("Queue Params: {:?}", queue_params);

    match queue_params.backend {
        QueueBackendParams::Sqs(params) => {
            info!("Setting up resources for the executor...");
            let aws_config = params.aws.sdk_config().await;
            setup_queue(&aws_config, &params, setup_cmd.visibility_timeout_secs).await?;
            setup_database(&params).await?;
            info!("✅ Executor resources are ready");
        }
        QueueBackendParams::Memory => {
            info!("The in-memory queue backend has no resources to set up");
        }
    }

    Ok(())
}

async fn setup_queue(aws_config: &SdkConfig, params: &SqsParams, visibility_timeout: u32) -> ExecutorResult<()> {
    let sqs = InnerSQS::new(aws_config);
    let queue_url = sqs.create_queue(&params.queue_name, visibility_timeout).await?;
    info!(queue = %params.queue_name, queue_url = %queue_url, "SQS queue created");
    Ok(())
}

async fn setup_database(params: &SqsParams) -> ExecutorResult<()> {
    let database = MongoDbClient::new(&params.database).await?;
    database
        .create_indexes()
        .await
        .map_err(|e| ExecutorError::SetupCommandError(format!("Failed to create MongoDB indexes: {e}")))?;
    info!(database = %params.database.database_name, "MongoDB indexes created");
    Ok(())
}
