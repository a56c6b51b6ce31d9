//! Log capture for tests that assert on span and event fields.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use tracing::{
    field::{Field, Visit},
    span::{Attributes, Id},
    Event, Subscriber,
};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

/// One span opening or event, with its fields rendered as strings.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub name: String,
    /// Name of the span an event was emitted in; empty for spans.
    pub parent: String,
    pub fields: Vec<(String, String)>,
}

impl Captured {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<Captured>>>);

impl Capture {
    pub fn records(&self) -> Vec<Captured> {
        self.0.lock().unwrap().clone()
    }

    pub fn named(&self, name: &str) -> Vec<Captured> {
        self.records()
            .into_iter()
            .filter(|record| record.name == name)
            .collect()
    }
}

impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut record = Captured {
            name: attrs.metadata().name().to_string(),
            ..Captured::default()
        };
        attrs.record(&mut FieldVisitor(&mut record.fields));
        self.0.lock().unwrap().push(record);
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut record = Captured {
            parent: ctx
                .event_span(event)
                .map(|span| span.name().to_string())
                .unwrap_or_default(),
            ..Captured::default()
        };
        event.record(&mut FieldVisitor(&mut record.fields));
        record.name = record.field("message").unwrap_or_default().to_string();
        self.0.lock().unwrap().push(record);
    }
}

struct FieldVisitor<'a>(&'a mut Vec<(String, String)>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
}
