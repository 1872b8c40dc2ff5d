use std::collections::HashMap;
use std::time::Duration;

use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{ExportConfig, WithExportConfig};
use opentelemetry_sdk::logs::LoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{BatchConfigBuilder, Config, Tracer};
use opentelemetry_sdk::{runtime, Resource};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use url::Url;

use crate::types::jobs::TracingOptions;
use crate::types::params::OTELConfig;
use crate::ExecutorResult;

/// Scope name of the executor's meter and tracer
pub const INSTRUMENTATION_SCOPE: &str = "executor";

/// OpenTelemetry providers of the executor. Every provider is `None` when no collector
/// endpoint is configured.
pub struct ExecutorInstrumentation {
    pub otel_config: OTELConfig,
    pub tracer: Option<Tracer>,
    pub logger_provider: Option<LoggerProvider>,
    pub meter_provider: Option<SdkMeterProvider>,
}

fn service_resource(config: &OTELConfig, suffix: &str) -> Resource {
    Resource::new(vec![KeyValue::new(
        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
        format!("{}{}", config.service_name, suffix),
    )])
}

impl ExecutorInstrumentation {
    /// Installs the OTLP pipelines. Must run inside the tokio runtime.
    pub fn new(config: &OTELConfig) -> ExecutorResult<Self> {
        match config.endpoint {
            None => Ok(Self { otel_config: config.clone(), tracer: None, logger_provider: None, meter_provider: None }),
            Some(ref endpoint) => Ok(Self {
                otel_config: config.clone(),
                meter_provider: Some(Self::instrument_metric_provider(config, endpoint)?),
                tracer: Some(Self::instrument_tracer_provider(config, endpoint)?),
                logger_provider: Some(Self::instrument_logger_provider(config, endpoint)?),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.otel_config.endpoint.is_some()
    }

    /// The executor's meter, a no-op meter when metrics are not exported.
    pub fn meter(&self) -> Meter {
        match &self.meter_provider {
            Some(provider) => provider.meter(INSTRUMENTATION_SCOPE),
            None => global::meter(INSTRUMENTATION_SCOPE),
        }
    }

    fn instrument_logger_provider(config: &OTELConfig, endpoint: &Url) -> ExecutorResult<LoggerProvider> {
        Ok(opentelemetry_otlp::new_pipeline()
            .logging()
            .with_resource(service_resource(config, "_logs_service"))
            .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint.to_string()))
            .install_batch(runtime::Tokio)?)
    }

    fn instrument_metric_provider(config: &OTELConfig, endpoint: &Url) -> ExecutorResult<SdkMeterProvider> {
        let export_config = ExportConfig { endpoint: endpoint.to_string(), ..ExportConfig::default() };

        let provider = opentelemetry_otlp::new_pipeline()
            .metrics(runtime::Tokio)
            .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_export_config(export_config))
            .with_resource(service_resource(config, "_meter_service"))
            .with_period(Duration::from_secs(5))
            .build()?;

        global::set_meter_provider(provider.clone());
        Ok(provider)
    }

    fn instrument_tracer_provider(config: &OTELConfig, endpoint: &Url) -> ExecutorResult<Tracer> {
        let batch_config = BatchConfigBuilder::default().build();

        let provider = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint.to_string()))
            .with_trace_config(Config::default().with_resource(service_resource(config, "_trace_service")))
            .with_batch_config(batch_config)
            .install_batch(runtime::Tokio)?;

        global::set_tracer_provider(provider.clone());
        Ok(provider.tracer(format!("{}{}", config.service_name, "_subscriber")))
    }

    pub fn shutdown(&self) -> ExecutorResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        global::shutdown_tracer_provider();
        if let Some(ref logger_provider) = self.logger_provider {
            logger_provider.shutdown()?;
        }
        if let Some(ref meter_provider) = self.meter_provider {
            meter_provider.shutdown()?;
        }
        Ok(())
    }
}

/// Context carried by the W3C `traceparent`/`tracestate` pair of the request that created a job.
pub fn remote_context(options: &TracingOptions) -> opentelemetry::Context {
    let mut carrier = HashMap::new();
    if let Some(traceparent) = &options.traceparent {
        carrier.insert("traceparent".to_string(), traceparent.clone());
    }
    if let Some(tracestate) = &options.tracestate {
        carrier.insert("tracestate".to_string(), tracestate.clone());
    }
    TraceContextPropagator::new().extract(&carrier)
}

/// Makes the request's trace the parent of `span`. No-op when traces are not exported.
pub fn link_remote_parent(span: &Span, options: &TracingOptions) {
    span.set_parent(remote_context(options));
}
