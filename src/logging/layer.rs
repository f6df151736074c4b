//! Bridge from `tracing` events to a [`Logger`].
//!
//! Installing a [`LoggerLayer`] lets code that logs through the `tracing`
//! macros share the logger's sink, encoding and level threshold.
//! `TRACE` events have no matching level and are dropped.

use std::fmt;

use serde_json::Value;
use tracing::{
    field::{Field as TracingField, Visit},
    subscriber::Interest,
    Event,
    Metadata,
    Subscriber,
};
use tracing_subscriber::layer::{Context, Layer};

use super::{encoder::Caller, fields::Field, level::Level, Logger};


const MESSAGE_FIELD: &str = "message";

const TARGET_KEY: &str = "logger";


/// Layer forwarding `tracing` events to a [`Logger`].
///
/// The event's fields become record fields and its target is recorded
/// under the `logger` key. Spans are ignored.
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber,
{
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // The level threshold can change at any time, so nothing may be cached.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        if !metadata.is_event() {
            return true;
        }

        Level::from_tracing(metadata.level()).is_some_and(|level| self.logger.enabled(level))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let Some(level) = Level::from_tracing(metadata.level()) else {
            return;
        };

        let mut visitor = FieldVisitor::default();
        visitor
            .fields
            .push(Field::new(TARGET_KEY, metadata.target()));
        event.record(&mut visitor);

        let caller = metadata.file().map(|file| Caller {
            file,
            line: metadata.line().unwrap_or_default(),
        });

        self.logger
            .emit(level, &visitor.message, &visitor.fields, caller);
    }
}


#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<Field>,
}

impl FieldVisitor {
    fn push<V: Into<Value>>(&mut self, field: &TracingField, value: V) {
        self.fields.push(Field::new(field.name(), value));
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, value);
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, value);
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, value);
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, value);
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == MESSAGE_FIELD {
            self.message = value.to_string();
        } else {
            self.push(field, value);
        }
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if field.name() == MESSAGE_FIELD {
            self.message = format!("{value:?}");
        } else {
            self.push(field, format!("{value:?}"));
        }
    }
}
