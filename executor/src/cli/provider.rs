use clap::Args;

/// Parameters used to config AWS.
#[derive(Debug, Clone, Args)]
pub struct AWSConfigCliArgs {
    /// Region of the AWS resources, falls back to the default provider chain.
    #[arg(env = "AWS_REGION", long)]
    pub aws_region: Option<String>,

    /// Custom endpoint, e.g. a localstack instance.
    #[arg(env = "AWS_ENDPOINT_URL", long)]
    pub aws_endpoint_url: Option<String>,
}
