//! Compatibility bridge for the Rust `log` crate.
//!
//! [`TokenLogger`] implements `log::Log` on top of any [`LogWriter`],
//! converting each record into a [`LogEvent`]. [`install`] registers a
//! [`TokenWriter`] as the global logger.

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::{
    level::Priority,
    log_event::LogEvent,
    log_writer::{LogWriter, SerializedWriter},
    writer::TokenWriter,
};

/// Records whose target starts with this prefix come from the writer itself
/// and are never forwarded.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Adapter implementing the Rust `log::Log` trait for a [`LogWriter`].
pub struct TokenLogger<W: LogWriter = TokenWriter> {
    writer: SerializedWriter<W>,
    level: LevelFilter,
}

impl<W: LogWriter> TokenLogger<W> {
    /// Forward records at or above `level` to `writer`.
    pub fn new(writer: W, level: LevelFilter) -> Self {
        Self {
            writer: SerializedWriter::new(writer),
            level,
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Shut the wrapped writer down and return it.
    pub fn into_inner(self) -> W {
        let mut writer = self.writer.into_inner();
        writer.shutdown();
        writer
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

fn event_from_record(record: &Record<'_>) -> LogEvent {
    let mut event = LogEvent::new(Priority::from(record.level()), record.args().to_string())
        .with_extra("target", record.target());
    if let Some(module_path) = record.module_path() {
        event = event.with_extra("module_path", module_path);
    }
    if let Some(file) = record.file() {
        event = event.with_extra("file", file);
    }
    if let Some(line) = record.line() {
        event = event.with_extra("line", line);
    }
    event
}

impl<W: LogWriter> log::Log for TokenLogger<W> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level && !is_own_target(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.writer.write(&event_from_record(record));
    }

    fn flush(&self) {
        self.writer.flush();
    }
}

/// Install a [`TokenLogger`] wrapping `writer` as the global Rust logger and
/// raise the global maximum level to `level`.
///
/// Fails when another global logger is already set.
pub fn install(writer: TokenWriter, level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(TokenLogger::new(writer, level)))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Unit tests for the `log` crate bridge.

    use super::*;
    use crate::test_utils::RecordingConnector;
    use log::Log;
    use parking_lot::Mutex;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct CollectingWriter {
        events: Arc<Mutex<Vec<LogEvent>>>,
    }

    impl LogWriter for CollectingWriter {
        fn write(&mut self, event: &LogEvent) {
            self.events.lock().push(event.clone());
        }
    }

    fn collecting_logger(level: LevelFilter) -> (TokenLogger<CollectingWriter>, CollectingWriter) {
        let writer = CollectingWriter::default();
        (TokenLogger::new(writer.clone(), level), writer)
    }

    #[rstest]
    fn record_metadata_becomes_extra() {
        let (logger, writer) = collecting_logger(LevelFilter::Trace);
        let record = log::Record::builder()
            .args(format_args!("hello"))
            .level(log::Level::Warn)
            .target("app::db")
            .module_path(Some("app::db"))
            .file(Some("db.rs"))
            .line(Some(42))
            .build();

        logger.log(&record);

        let events = writer.events.lock();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.priority, Priority::Warning);
        assert_eq!(event.message, "hello");
        assert_eq!(event.extra["target"], json!("app::db"));
        assert_eq!(event.extra["module_path"], json!("app::db"));
        assert_eq!(event.extra["file"], json!("db.rs"));
        assert_eq!(event.extra["line"], json!(42));
    }

    #[rstest]
    fn records_below_level_are_skipped() {
        let (logger, writer) = collecting_logger(LevelFilter::Warn);
        for (level, message) in [(log::Level::Info, "info"), (log::Level::Error, "error")] {
            logger.log(
                &log::Record::builder()
                    .args(format_args!("{message}"))
                    .level(level)
                    .target("app")
                    .build(),
            );
        }
        let events = writer.events.lock();
        assert_eq!(events.len(), 1, "only ERROR should pass the threshold");
        assert_eq!(events[0].priority, Priority::Error);
    }

    #[rstest]
    #[case("logentries_writer", true)]
    #[case("logentries_writer::writer::token_writer", true)]
    #[case("logentries_writer_ext", false)]
    #[case("app", false)]
    fn own_records_are_ignored(#[case] target: &str, #[case] ignored: bool) {
        assert_eq!(is_own_target(target), ignored);
        let (logger, writer) = collecting_logger(LevelFilter::Trace);
        logger.log(
            &log::Record::builder()
                .args(format_args!("x"))
                .level(log::Level::Warn)
                .target(target)
                .build(),
        );
        assert_eq!(writer.events.lock().is_empty(), ignored);
    }

    #[rstest]
    fn forwards_to_token_writer() {
        let connector = RecordingConnector::new();
        let writer = TokenWriter::builder("abc123")
            .with_connector(connector.clone())
            .build()
            .expect("build writer");
        let logger = TokenLogger::new(writer, LevelFilter::Info);

        logger.log(
            &log::Record::builder()
                .args(format_args!("bridged"))
                .level(log::Level::Info)
                .target("app")
                .build(),
        );
        logger.flush();

        let sent = connector.transmitted_text();
        assert!(sent.starts_with("abc123 "));
        assert!(sent.contains(" - INFO - bridged {\"target\":\"app\"}"));
        assert!(sent.ends_with('\n'));

        let writer = logger.into_inner();
        assert!(writer.config().persistent());
        assert_eq!(connector.closed_count(), 0);
    }
}
