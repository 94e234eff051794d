//! Compatibility bridge for `tracing`.
//!
//! [`TokenWriterLayer`] is a `tracing_subscriber` layer that turns each event
//! into a [`LogEvent`]: the `message` field becomes the message and every
//! other field lands in `extra` with its JSON type preserved.

use std::fmt;

use serde_json::Value;
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context};

use crate::{
    level::Priority,
    log_event::{ExtraFields, LogEvent},
    log_writer::{LogWriter, SerializedWriter},
    writer::TokenWriter,
};

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

impl From<&Level> for Priority {
    fn from(level: &Level) -> Self {
        if *level == Level::ERROR {
            Priority::Error
        } else if *level == Level::WARN {
            Priority::Warning
        } else if *level == Level::INFO {
            Priority::Info
        } else {
            Priority::Debug
        }
    }
}

/// Layer forwarding `tracing` events to a [`LogWriter`].
pub struct TokenWriterLayer<W: LogWriter = TokenWriter> {
    writer: SerializedWriter<W>,
}

impl<W: LogWriter> TokenWriterLayer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: SerializedWriter::new(writer),
        }
    }
}

impl<W: LogWriter> fmt::Debug for TokenWriterLayer<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenWriterLayer").finish_non_exhaustive()
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    extra: ExtraFields,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.extra.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl<S, W> Layer<S> for TokenWriterLayer<W>
where
    S: Subscriber,
    W: LogWriter + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut log_event = LogEvent::new(
            Priority::from(metadata.level()),
            visitor.message.unwrap_or_default(),
        )
        .with_extra("target", metadata.target());
        log_event.extra.extend(visitor.extra);
        self.writer.write(&log_event);
    }
}
