use url::Url;

use crate::cli::instrumentation::InstrumentationCliArgs;
use crate::ExecutorError;

#[derive(Debug, Clone)]
pub struct OTELConfig {
    pub endpoint: Option<Url>,
    pub service_name: String,
}

impl TryFrom<InstrumentationCliArgs> for OTELConfig {
    type Error = ExecutorError;

    fn try_from(args: InstrumentationCliArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            endpoint: args.otel_collector_endpoint,
            service_name: args
                .otel_service_name
                .ok_or_else(|| ExecutorError::MissingArgument("EXECUTOR_OTEL_SERVICE_NAME".to_string()))?,
        })
    }
}
