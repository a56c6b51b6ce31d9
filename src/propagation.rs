use http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::{
    propagation::{Extractor, Injector, TextMapCompositePropagator, TextMapPropagator},
    Context,
};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

/// Propagator writing and reading W3C `traceparent`, W3C `baggage` and
/// Jaeger `uber-trace-id` headers.
pub fn propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
        Box::new(opentelemetry_jaeger_propagator::Propagator::new()),
    ])
}

/// Writes the span context and baggage of `context` into `headers` so a
/// downstream service can continue the trace.
pub fn inject_context(context: &Context, headers: &mut HeaderMap) {
    propagator().inject_context(context, &mut HeaderInjector::new(headers));
}

/// Rebuilds the remote [`Context`] (span context and baggage) carried by
/// `headers`. Headers without propagation data yield an empty context.
pub fn extract_context(headers: &HeaderMap) -> Context {
    propagator().extract_with_context(&Context::new(), &HeaderExtractor::new(headers))
}

// "traceparent" => https://www.w3.org/TR/trace-context/#trace-context-http-headers-format
// "baggage" => https://www.w3.org/TR/baggage/#header-name

/// Injector used by the propagators to insert their header values, e.g.
/// "traceparent" as "{version}-{trace_id}-{span_id}-{trace_flags}" or
/// "baggage" as a comma separated `key=value` list. Keys or values that are
/// not valid header text are dropped.
struct HeaderInjector<'a> {
    headers: &'a mut HeaderMap,
}

impl<'a> HeaderInjector<'a> {
    fn new(headers: &'a mut HeaderMap) -> Self {
        HeaderInjector { headers }
    }
}

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        let Ok(key) = key.parse::<HeaderName>() else {
            tracing::debug!(%key, "failed to parse header name");
            return;
        };
        let Ok(value) = HeaderValue::from_str(&value) else {
            tracing::debug!(%value, "failed to parse header value");
            return;
        };
        self.headers.insert(key, value);
    }
}

struct HeaderExtractor<'a> {
    headers: &'a HeaderMap,
}

impl<'a> HeaderExtractor<'a> {
    fn new(headers: &'a HeaderMap) -> Self {
        HeaderExtractor { headers }
    }
}

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|h| h.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.headers.keys().map(|k| k.as_str()).collect()
    }
}
