use clap::Args;
use url::Url;

/// Parameters used to config instrumentation.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct InstrumentationCliArgs {
    /// The name of the instrumentation service.
    #[arg(env = "EXECUTOR_OTEL_SERVICE_NAME", long, default_value = "executor-service")]
    pub otel_service_name: Option<String>,

    /// The endpoint of the collector. Instrumentation is skipped when unset.
    #[arg(env = "OTEL_EXPORTER_OTLP_ENDPOINT", long)]
    pub otel_collector_endpoint: Option<Url>,
}
