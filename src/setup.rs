use opentelemetry::{metrics::MetricsError, trace::TraceError, KeyValue};
use opentelemetry_sdk::{
    metrics::SdkMeterProvider,
    runtime,
    trace::{Config, TracerProvider},
    Resource,
};
use opentelemetry_semantic_conventions::{resource::SERVICE_NAME, SCHEMA_URL};
use prometheus::Registry;
use tracing_core::LevelFilter;
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry as Subscribers,
};

pub const SERVICE: &str = "trace-demo";
pub const ENVIRONMENT: &str = "production";
pub const ID: i64 = 1;

/// Default Jaeger collector endpoint (thrift over HTTP).
pub const DEFAULT_COLLECTOR_ENDPOINT: &str = "http://127.0.0.1:14268/api/traces";

/// Installs the process-wide log subscriber. The filter is read from
/// `RUST_LOG` and falls back to `info`.
///
/// This should be the first statement of both demo binaries.
pub fn init_logging() {
    Subscribers::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resource describing the trace emitter, attached to every span it exports.
pub fn trace_resource() -> Resource {
    Resource::from_schema_url(
        [
            KeyValue::new(SERVICE_NAME, SERVICE),
            KeyValue::new("environment", ENVIRONMENT),
            KeyValue::new("ID", ID),
        ],
        SCHEMA_URL,
    )
}

pub fn trace_config() -> Config {
    Config::default().with_resource(trace_resource())
}

/// Builds a tracer provider that batches finished spans and ships them to
/// the Jaeger collector at `endpoint`.
///
/// The provider is returned to the caller instead of being installed
/// globally. Must be called from within a Tokio runtime.
pub fn init_trace_provider(endpoint: &str) -> Result<TracerProvider, TraceError> {
    let provider = opentelemetry_jaeger::new_collector_pipeline()
        .with_endpoint(endpoint)
        .with_reqwest()
        .with_trace_config(trace_config())
        .build_batch(runtime::Tokio)?;

    tracing::debug!(%endpoint, "jaeger trace provider ready");
    Ok(provider)
}

/// Exports every buffered span, then drops the provider.
///
/// Flushing blocks on the batch worker, so it runs on the blocking pool to
/// keep the async workers free for the export itself.
pub async fn shutdown_trace_provider(provider: TracerProvider) -> Result<(), TraceError> {
    let results = tokio::task::spawn_blocking(move || {
        let results = provider.force_flush();
        drop(provider);
        results
    })
    .await
    .map_err(|err| TraceError::Other(Box::new(err)))?;

    results.into_iter().collect()
}

/// Builds a meter provider whose only reader is a Prometheus exporter
/// writing into `registry`. Values are computed when the registry is
/// gathered, so the provider needs no runtime.
pub fn init_meter_provider(registry: Registry) -> Result<SdkMeterProvider, MetricsError> {
    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry)
        .build()?;

    Ok(SdkMeterProvider::builder().with_reader(exporter).build())
}
