//! The demo trace: a root span `foo` and a failing child span `bar`.

use http::HeaderMap;
use opentelemetry::{
    baggage::{Baggage, BaggageExt},
    trace::{Span, Status, TraceContextExt, TraceId, Tracer, TracerProvider as _},
    Context, KeyValue,
};
use opentelemetry_sdk::trace::TracerProvider;

use crate::propagation;

pub const MAIN_TRACER: &str = "com-main";
pub const BAR_TRACER: &str = "com-bar";

/// Baggage entries carried by the demo trace. [`Baggage`] is a map and does
/// not keep this order.
pub const BAGGAGE: [(&str, &str); 2] = [("data2", "value2"), ("data1", "value1")];

/// Baggage key copied onto the `bar` span.
pub const COPIED_BAGGAGE_KEY: &str = "data1";

/// Simulated business failure raised by `bar`.
#[derive(Debug, thiserror::Error)]
#[error("bar error")]
pub struct BarError;

pub fn demo_baggage() -> Baggage {
    let mut baggage = Baggage::new();
    for (key, value) in BAGGAGE {
        baggage.insert(key, value);
    }
    baggage
}

/// Identity of an emitted trace.
#[derive(Debug, Clone)]
pub struct EmittedTrace {
    pub trace_id: TraceId,
    /// Propagation headers a downstream call would carry to join the trace.
    pub headers: HeaderMap,
}

/// Emits the demo trace through `provider`.
///
/// The error returned by `bar` is recorded on the root span and goes no
/// further.
pub fn emit_trace(provider: &TracerProvider, baggage: &Baggage) -> EmittedTrace {
    let tracer = provider.tracer(MAIN_TRACER);
    let parent = Context::new().with_baggage(
        baggage
            .iter()
            .map(|(key, (value, _))| KeyValue::new(key.clone(), value.clone())),
    );
    let span = tracer.start_with_context("foo", &parent);
    let cx = parent.with_span(span);
    let trace_id = cx.span().span_context().trace_id();

    if let Err(err) = bar(provider, &cx, baggage) {
        let span = cx.span();
        span.record_error(&err);
        span.set_status(Status::error(err.to_string()));
    }

    let mut headers = HeaderMap::new();
    propagation::inject_context(&cx, &mut headers);

    cx.span().end();
    EmittedTrace { trace_id, headers }
}

fn bar(provider: &TracerProvider, cx: &Context, baggage: &Baggage) -> Result<(), BarError> {
    let tracer = provider.tracer(BAR_TRACER);
    let mut span = tracer.start_with_context("bar", cx);

    span.set_attribute(KeyValue::new("test", "value"));
    match baggage.get(COPIED_BAGGAGE_KEY) {
        Some(value) => span.set_attribute(KeyValue::new(COPIED_BAGGAGE_KEY, value.clone())),
        None => tracing::warn!(key = COPIED_BAGGAGE_KEY, "baggage entry missing"),
    }

    let err = BarError;
    span.add_event(err.to_string(), vec![]);
    span.set_status(Status::error(err.to_string()));
    span.end();

    Err(err)
}
