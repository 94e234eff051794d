//! Placeholder template formatter.
//!
//! Templates reference event fields with `%name%` placeholders. The template
//! is parsed once on construction; unknown placeholders are kept verbatim.

use chrono::SecondsFormat;

use crate::log_event::LogEvent;

use super::LineFormatter;

/// Template used when no other is supplied.
pub const DEFAULT_TEMPLATE: &str = "%timestamp% - %priorityName% - %message% %extra%";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Timestamp,
    Priority,
    PriorityName,
    Message,
    Extra,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "timestamp" => Some(Self::Timestamp),
            "priority" => Some(Self::Priority),
            "priorityName" => Some(Self::PriorityName),
            "message" => Some(Self::Message),
            "extra" => Some(Self::Extra),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// Formatter substituting event fields into a `%placeholder%` template.
///
/// Recognised placeholders are `%timestamp%` (RFC 3339, second precision,
/// UTC), `%priority%` (syslog number), `%priorityName%`, `%message%` and
/// `%extra%` (compact JSON, or nothing when the event has no extra fields).
#[derive(Clone, Debug)]
pub struct SimpleFormatter {
    template: String,
    segments: Vec<Segment>,
}

impl SimpleFormatter {
    /// Create a formatter from a custom template.
    pub fn with_template(template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = parse_template(&template);
        Self { template, segments }
    }

    /// The template this formatter was built from.
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl Default for SimpleFormatter {
    fn default() -> Self {
        Self::with_template(DEFAULT_TEMPLATE)
    }
}

impl LineFormatter for SimpleFormatter {
    fn format(&self, event: &LogEvent) -> String {
        let mut output = String::with_capacity(self.template.len() + event.message.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Field(field) => render_field(&mut output, *field, event),
            }
        }
        output
    }
}

fn render_field(output: &mut String, field: Field, event: &LogEvent) {
    match field {
        Field::Timestamp => {
            output.push_str(&event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        Field::Priority => output.push_str(&event.priority.number().to_string()),
        Field::PriorityName => output.push_str(event.priority.name()),
        Field::Message => output.push_str(&event.message),
        Field::Extra => {
            if !event.extra.is_empty() {
                // A map of JSON values always serialises.
                output.push_str(&serde_json::to_string(&event.extra).unwrap_or_default());
            }
        }
    }
}

fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;
    while let Some(start) = rest.find('%') {
        literal.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let placeholder = after
            .find('%')
            .and_then(|end| Field::from_name(&after[..end]).map(|field| (field, end)));
        match placeholder {
            Some((field, end)) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field(field));
                rest = &after[end + 1..];
            }
            None => {
                literal.push('%');
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
