use std::time::Duration;

use crate::cli::database::MongoDBCliArgs;
use crate::cli::provider::AWSConfigCliArgs;
use crate::cli::queue::{QueueBackend, QueueCliArgs};
use crate::cli::{RunCmd, SetupCmd};
use crate::ExecutorError;

#[derive(Debug, Clone)]
pub struct DatabaseParams {
    pub connection_uri: String,
    pub database_name: String,
}

impl From<MongoDBCliArgs> for DatabaseParams {
    fn from(args: MongoDBCliArgs) -> Self {
        Self { connection_uri: args.mongodb_connection_url, database_name: args.mongodb_database_name }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AWSParams {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

impl From<AWSConfigCliArgs> for AWSParams {
    fn from(args: AWSConfigCliArgs) -> Self {
        Self { region: args.aws_region, endpoint_url: args.aws_endpoint_url }
    }
}

#[derive(Debug, Clone)]
pub struct SqsParams {
    pub queue_name: String,
    pub receive_wait: Duration,
    pub database: DatabaseParams,
    pub aws: AWSParams,
}

#[derive(Debug, Clone)]
pub enum QueueBackendParams {
    Sqs(SqsParams),
    Memory,
}

/// How often the broker status is re-checked at startup while it is still connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerHealthCheck {
    pub retries: u32,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct QueueParams {
    pub backend: QueueBackendParams,
    pub health_check: BrokerHealthCheck,
}

fn queue_params(
    queue_args: QueueCliArgs,
    mongodb_args: MongoDBCliArgs,
    aws_args: AWSConfigCliArgs,
) -> Result<QueueParams, ExecutorError> {
    let backend = match queue_args.queue_backend {
        QueueBackend::Memory => QueueBackendParams::Memory,
        QueueBackend::Sqs => {
            if queue_args.sqs_queue_name.is_empty() {
                return Err(ExecutorError::MissingArgument("EXECUTOR_AWS_SQS_QUEUE_NAME".to_string()));
            }
            QueueBackendParams::Sqs(SqsParams {
                queue_name: queue_args.sqs_queue_name,
                receive_wait: Duration::from_secs(queue_args.sqs_receive_wait_secs),
                database: mongodb_args.into(),
                aws: aws_args.into(),
            })
        }
    };

    Ok(QueueParams {
        backend,
        health_check: BrokerHealthCheck {
            retries: queue_args.broker_health_check_retries,
            interval: Duration::from_millis(queue_args.broker_health_check_interval_ms),
        },
    })
}

impl TryFrom<RunCmd> for QueueParams {
    type Error = ExecutorError;

    fn try_from(run_cmd: RunCmd) -> Result<Self, Self::Error> {
        queue_params(run_cmd.queue_args, run_cmd.mongodb_args, run_cmd.aws_config_args)
    }
}

impl TryFrom<SetupCmd> for QueueParams {
    type Error = ExecutorError;

    fn try_from(setup_cmd: SetupCmd) -> Result<Self, Self::Error> {
        queue_params(setup_cmd.queue_args, setup_cmd.mongodb_args, setup_cmd.aws_config_args)
    }
}
