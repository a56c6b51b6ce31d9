//! Demo instruments published through the Prometheus reader.
//!
//! Key metrics:
//! - foo: counter, incremented once by 5
//! - baz: histogram fed five observations between 7 and 105
//! - bar: gauge sampled uniformly from `[-10, 80)` on every scrape

use std::ops::Range;

use opentelemetry::{
    metrics::{Counter, Histogram, Meter, ObservableGauge},
    KeyValue,
};
use rand::Rng;

pub const METER: &str = "prometheus";

pub const COUNTER_INCREMENT: f64 = 5.0;
pub const HISTOGRAM_OBSERVATIONS: [f64; 5] = [23.0, 7.0, 50.0, 101.0, 105.0];
pub const GAUGE_RANGE: Range<f64> = -10.0..80.0;

/// Labels attached to every measurement.
pub fn labels() -> [KeyValue; 2] {
    [KeyValue::new("A", "B"), KeyValue::new("C", "D")]
}

/// Keeps the registered instruments alive; hold it for as long as the
/// metrics are served.
pub struct Instruments {
    _counter: Counter<f64>,
    _histogram: Histogram<f64>,
    _gauge: ObservableGauge<f64>,
}

/// Registers the demo instruments on `meter` and records the fixed
/// counter and histogram values.
pub fn record(meter: &Meter) -> Instruments {
    let attrs = labels();

    let counter = meter
        .f64_counter("foo")
        .with_description("foo description")
        .init();
    counter.add(COUNTER_INCREMENT, &attrs);

    let histogram = meter
        .f64_histogram("baz")
        .with_description("baz description")
        .init();
    for value in HISTOGRAM_OBSERVATIONS {
        histogram.record(value, &attrs);
    }

    let gauge = meter
        .f64_observable_gauge("bar")
        .with_description("bar description")
        .with_callback(move |observer| observer.observe(sample_gauge(), &attrs))
        .init();

    tracing::debug!(meter = METER, "instruments registered");

    Instruments {
        _counter: counter,
        _histogram: histogram,
        _gauge: gauge,
    }
}

fn sample_gauge() -> f64 {
    rand::thread_rng().gen_range(GAUGE_RANGE)
}
