use std::task::{Context, Poll};

use http::Request;
use opentelemetry::trace::TraceContextExt;
use tower::Service;
use tower_layer::Layer;
use tracing::{instrument::Instrumented, Instrument};

use crate::propagation;

/// Runs every scrape request inside a `scrape` span.
///
/// When the scraper sends propagation headers, the remote trace id is
/// recorded on the span so scrape logs can be correlated with the caller's
/// trace.
///
/// ```ignore
/// let app = Router::new()
///     .route("/metrics", get(metrics))
///     .layer(ScrapeTraceLayer);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapeTraceLayer;

impl<S> Layer<S> for ScrapeTraceLayer {
    type Service = ScrapeTraceService<S>;

    fn layer(&self, service: S) -> Self::Service {
        ScrapeTraceService { service }
    }
}

/// This service implements the ScrapeTrace behavior
#[derive(Debug, Clone)]
pub struct ScrapeTraceService<S> {
    service: S,
}

impl<S, Body> Service<Request<Body>> for ScrapeTraceService<S>
where
    S: Service<Request<Body>>,
{
    type Error = S::Error;
    type Future = Instrumented<S::Future>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let span = scrape_span(&request);

        self.service.call(request).instrument(span)
    }
}

fn scrape_span<Body>(request: &Request<Body>) -> tracing::Span {
    let remote = propagation::extract_context(request.headers());
    let span_context = remote.span().span_context().clone();

    if span_context.is_valid() {
        tracing::info_span!(
            "scrape",
            method = %request.method(),
            path = request.uri().path(),
            trace_id = %span_context.trace_id(),
        )
    } else {
        tracing::info_span!(
            "scrape",
            method = %request.method(),
            path = request.uri().path(),
        )
    }
}
