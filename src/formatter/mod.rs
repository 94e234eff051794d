//! Formatter implementations rendering a [`LogEvent`] as a single line.
//!
//! Provides the core [`LineFormatter`] trait alongside [`SharedFormatter`], a
//! cloneable trait object the writer holds so callers can inject any
//! rendering strategy. Two implementations ship with the crate: the
//! placeholder-based [`SimpleFormatter`] used by default and
//! [`JsonFormatter`] for collectors that parse JSON lines.

use std::{fmt, sync::Arc};

use crate::log_event::LogEvent;

mod json;
mod simple;

pub use json::JsonFormatter;
pub use simple::{DEFAULT_TEMPLATE, SimpleFormatter};

/// Trait for formatting log events into strings.
///
/// Implementors must be thread-safe (`Send + Sync`) so a formatter can be
/// shared between writers living on different threads.
pub trait LineFormatter: Send + Sync {
    /// Format an event into its line representation, without separator.
    fn format(&self, event: &LogEvent) -> String;
}

/// Shared formatter trait object used by writers.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn LineFormatter + Send + Sync>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(formatter: F) -> Self
    where
        F: LineFormatter + Send + Sync + 'static,
    {
        let inner: Arc<dyn LineFormatter + Send + Sync> = Arc::new(formatter);
        Self { inner }
    }

    /// Wrap an existing shared formatter trait object.
    pub fn from_arc(inner: Arc<dyn LineFormatter + Send + Sync>) -> Self {
        Self { inner }
    }

    /// Format an event using the wrapped formatter instance.
    pub fn format(&self, event: &LogEvent) -> String {
        self.inner.format(event)
    }
}

impl Default for SharedFormatter {
    fn default() -> Self {
        Self::new(SimpleFormatter::default())
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn LineFormatter>)")
    }
}

impl<F> LineFormatter for F
where
    F: Fn(&LogEvent) -> String + Send + Sync,
{
    fn format(&self, event: &LogEvent) -> String {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    //! Tests for the shared formatter wrapper.

    use super::*;
    use crate::level::Priority;
    use static_assertions::assert_impl_all;

    #[test]
    fn shared_formatter_is_send_sync() {
        assert_impl_all!(SharedFormatter: Send, Sync);
    }

    #[test]
    fn closures_act_as_formatters() {
        let formatter = SharedFormatter::new(|event: &LogEvent| event.message.to_uppercase());
        let event = LogEvent::new(Priority::Info, "quiet");
        assert_eq!(formatter.format(&event), "QUIET");
    }

    #[test]
    fn from_arc_shares_the_instance() {
        let inner: Arc<dyn LineFormatter + Send + Sync> = Arc::new(JsonFormatter);
        let a = SharedFormatter::from_arc(Arc::clone(&inner));
        let b = a.clone();
        let event = LogEvent::new(Priority::Notice, "same");
        assert_eq!(a.format(&event), b.format(&event));
        assert_eq!(Arc::strong_count(&inner), 3);
    }
}
