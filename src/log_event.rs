//! Log event representation handed to the writer.
//!
//! A [`LogEvent`] carries the fields a formatter may render: the event time,
//! its [`Priority`], the message and a map of free-form `extra` values.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::level::Priority;

/// Free-form key-value pairs attached to an event.
pub type ExtraFields = BTreeMap<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    /// Time the event was created.
    pub timestamp: DateTime<Utc>,
    /// Severity of the event.
    pub priority: Priority,
    /// The log message content.
    pub message: String,
    /// Structured context rendered by the `%extra%` placeholder.
    pub extra: ExtraFields,
}

impl LogEvent {
    /// Construct an event stamped with the current time.
    pub fn new(priority: Priority, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            priority,
            message: message.into(),
            extra: ExtraFields::new(),
        }
    }

    /// Replace the event timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach a single extra field, replacing any previous value for `key`.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.priority, self.message)
    }
}
