//! # Telemetry demos
//! Two small programs exercising the OpenTelemetry SDK without any global
//! providers: every tracer, meter and propagator is built explicitly and
//! handed to the code that needs it.
//!
//! ## Setup
//! Logging, the Jaeger-backed tracer provider and the Prometheus-backed
//! meter provider are built by [`setup`].
//!
//! ## Traces
//! [`trace_demo::emit_trace`] emits a root span `foo` and a failing child
//! span `bar` that copies a baggage entry into its attributes.
//! [`propagation`] writes and reads the matching propagation headers.
//!
//! ## Metrics
//! [`metrics_demo::record`] registers a counter, a histogram and an
//! observable gauge. [`server`] exposes them for Prometheus scrapes, with
//! [`middleware::ScrapeTraceLayer`] correlating scrapes with the caller's
//! trace.

pub mod metrics_demo;
pub mod middleware;
pub mod propagation;
pub mod server;
pub mod setup;
#[cfg(test)]
mod testing;
pub mod trace_demo;
