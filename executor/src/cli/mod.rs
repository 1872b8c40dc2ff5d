use clap::{Parser, Subcommand};

pub mod chain;
pub mod database;
pub mod instrumentation;
pub mod provider;
pub mod queue;
pub mod server;
pub mod worker;

#[derive(Parser, Debug)]
#[command(
    name = "executor",
    about = "Topos Executor - executes cross-subnet messages on their receiving subnet",
    after_help = "Examples:\n  \
    executor run --queue-backend memory\n  \
    executor setup --sqs-queue-name executor_execute_queue"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the executor service
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
    /// Create the queue and database resources the executor relies on
    Setup {
        #[command(flatten)]
        setup_command: Box<SetupCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct RunCmd {
    #[clap(flatten)]
    pub chain_args: chain::ChainCliArgs,

    #[clap(flatten)]
    pub worker_args: worker::WorkerCliArgs,

    #[clap(flatten)]
    pub queue_args: queue::QueueCliArgs,

    #[clap(flatten)]
    pub mongodb_args: database::MongoDBCliArgs,

    #[clap(flatten)]
    pub aws_config_args: provider::AWSConfigCliArgs,

    #[clap(flatten)]
    pub server_args: server::ServerCliArgs,

    #[clap(flatten)]
    pub instrumentation_args: instrumentation::InstrumentationCliArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct SetupCmd {
    #[clap(flatten)]
    pub queue_args: queue::QueueCliArgs,

    #[clap(flatten)]
    pub mongodb_args: database::MongoDBCliArgs,

    #[clap(flatten)]
    pub aws_config_args: provider::AWSConfigCliArgs,

    /// Visibility timeout of the SQS queue, after which an unacknowledged job is redelivered.
    #[arg(env = "EXECUTOR_SQS_VISIBILITY_TIMEOUT_SECS", long, default_value_t = 300)]
    pub visibility_timeout_secs: u32,
}
