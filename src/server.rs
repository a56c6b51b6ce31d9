//! Prometheus scrape endpoint serving `GET /metrics`.

use std::{error::Error, future::Future, net::SocketAddr};

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::net::TcpListener;

use crate::middleware::ScrapeTraceLayer;

/// Default bind address; `:2223` on every interface.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:2223";

pub const METRICS_PATH: &str = "/metrics";

#[derive(Clone)]
struct ScrapeState {
    registry: Registry,
}

/// Router exposing `registry` at [`METRICS_PATH`]; every other path is 404.
pub fn router(registry: Registry) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics_handler))
        .layer(ScrapeTraceLayer)
        .with_state(ScrapeState { registry })
}

/// Gathering runs the observable-instrument callbacks, so every scrape sees
/// freshly sampled gauge values.
async fn metrics_handler(State(state): State<ScrapeState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    tracing::debug!(families = metric_families.len(), "metrics scraped");

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(CONTENT_TYPE, encoder.format_type().to_string())],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CONTENT_TYPE, "text/plain; charset=utf-8".to_string())],
                format!("encode error: {e}").into_bytes(),
            )
        }
    }
}

/// Binds the scrape listener. Failing here is fatal for the metrics demo.
pub async fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, path = METRICS_PATH, "serving metrics");
    Ok(listener)
}

/// Serves `registry` on `listener` until `shutdown` resolves, then drains
/// in-flight scrapes.
pub async fn serve<F>(
    listener: TcpListener,
    registry: Registry,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("metrics server stopped");
    Ok(())
}

/// Serves `registry` until `shutdown` resolves, then shuts `provider` down.
///
/// A server failure is returned as is and skips the provider shutdown.
pub async fn run<F>(
    listener: TcpListener,
    registry: Registry,
    provider: SdkMeterProvider,
    shutdown: F,
) -> Result<(), Box<dyn Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    serve(listener, registry, shutdown).await?;

    provider.shutdown()?;
    tracing::info!("meter provider shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use opentelemetry::metrics::MeterProvider as _;
    use tokio::sync::oneshot;
    use tower::ServiceExt;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::{metrics_demo, setup, testing::Capture};

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_demo_instruments() {
        let registry = Registry::new();
        let provider = setup::init_meter_provider(registry.clone()).unwrap();
        let _instruments = metrics_demo::record(&provider.meter(metrics_demo::METER));

        let response = router(registry)
            .oneshot(Request::get(METRICS_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let text = body_text(response).await;
        assert!(text.contains("# HELP foo_total foo description"), "{text}");
        assert!(text.contains("baz_count{"), "{text}");
        assert!(text.contains("# TYPE bar gauge"), "{text}");
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = router(Registry::new())
            .oneshot(Request::get("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve(listener, Registry::new(), async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn run_shuts_provider_down_after_serving() {
        let registry = Registry::new();
        let provider = setup::init_meter_provider(registry.clone()).unwrap();
        let _instruments = metrics_demo::record(&provider.meter(metrics_demo::METER));
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let running = tokio::spawn(run(listener, registry, provider.clone(), async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        running.await.unwrap().expect("run should stop cleanly");
        assert!(
            provider.shutdown().is_err(),
            "provider should already be shut down"
        );
    }

    #[tokio::test]
    async fn scrape_is_logged_inside_scrape_span() {
        let capture = Capture::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(capture.clone()),
        );

        let response = router(Registry::new())
            .oneshot(Request::get(METRICS_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let scraped = capture.named("metrics scraped");
        assert_eq!(scraped.len(), 1, "{:?}", capture.records());
        assert_eq!(scraped[0].parent, "scrape");
        assert!(scraped[0].field("families").is_some());
    }
}
