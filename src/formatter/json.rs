//! JSON line formatter.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::{
    level::Priority,
    log_event::{ExtraFields, LogEvent},
};

use super::LineFormatter;

#[derive(Serialize)]
struct JsonLine<'a> {
    timestamp: String,
    priority: u8,
    #[serde(rename = "priorityName")]
    priority_name: Priority,
    message: &'a str,
    #[serde(skip_serializing_if = "ExtraFields::is_empty")]
    extra: &'a ExtraFields,
}

impl<'a> From<&'a LogEvent> for JsonLine<'a> {
    fn from(event: &'a LogEvent) -> Self {
        Self {
            timestamp: event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            priority: event.priority.number(),
            priority_name: event.priority,
            message: &event.message,
            extra: &event.extra,
        }
    }
}

/// Renders each event as one compact JSON object.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonFormatter;

impl LineFormatter for JsonFormatter {
    fn format(&self, event: &LogEvent) -> String {
        serde_json::to_string(&JsonLine::from(event)).unwrap_or_else(|err| {
            log::warn!("JsonFormatter failed to serialise event: {err}");
            event.message.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    fn renders_fields_as_json_object() {
        let event = LogEvent::new(Priority::Error, "boom")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())
            .with_extra("request_id", "r-1");
        let line = JsonFormatter.format(&event);
        assert!(!line.contains('\n'));
        let parsed: Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(
            parsed,
            json!({
                "timestamp": "2024-05-06T07:08:09.000Z",
                "priority": 3,
                "priorityName": "ERR",
                "message": "boom",
                "extra": {"request_id": "r-1"},
            })
        );
    }

    #[rstest]
    fn omits_empty_extra() {
        let line = JsonFormatter.format(&LogEvent::new(Priority::Info, "plain"));
        let parsed: Value = serde_json::from_str(&line).expect("valid json");
        assert!(parsed.get("extra").is_none());
    }
}
