//! Public writer type exported by the crate.

use std::{fmt, io};

use log::{debug, warn};

use crate::{
    error::{ConnectionFailure, WriterError},
    formatter::SharedFormatter,
    log_event::LogEvent,
    log_writer::LogWriter,
    rate_limited_warner::RateLimitedWarner,
};

use super::{
    builder::TokenWriterBuilder,
    config::WriterConfig,
    endpoint::Endpoint,
    transport::{Connection, Connector, NetConnector},
};

/// Observable connection lifecycle of a [`TokenWriter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection has been made yet.
    Absent,
    /// A socket handle is held.
    Connected,
    /// The previous socket was closed or found dead.
    Closed,
}

enum ConnectionState {
    Absent,
    Connected(Box<dyn Connection>),
    Closed,
}

/// Writer shipping token-prefixed lines to the collector.
///
/// The socket is opened lazily by the first [`write`](Self::write) and
/// reused until the peer closes it, a send fails, or a non-persistent writer
/// is shut down. Network failures never reach the caller: the affected line
/// is dropped, the failure is recorded for [`last_error`](Self::last_error),
/// and the next write tries to connect again.
pub struct TokenWriter {
    config: WriterConfig,
    formatter: SharedFormatter,
    connector: Box<dyn Connector>,
    state: ConnectionState,
    last_error: Option<ConnectionFailure>,
    connect_failures: u64,
    dropped_lines: u64,
    warner: RateLimitedWarner,
}

impl TokenWriter {
    /// Construct a writer for `token` with default settings.
    pub fn new(token: impl AsRef<str>) -> Result<Self, WriterError> {
        Ok(Self::from_config(WriterConfig::with_token(token)?))
    }

    /// Start building a writer for `token`.
    pub fn builder(token: impl Into<String>) -> TokenWriterBuilder {
        TokenWriterBuilder::new(token)
    }

    /// Construct a writer dialling the real collector with the default
    /// formatter.
    pub fn from_config(config: WriterConfig) -> Self {
        Self::with_parts(config, SharedFormatter::default(), Box::new(NetConnector::new()))
    }

    /// Construct a writer from explicit collaborators.
    pub fn with_parts(
        config: WriterConfig,
        formatter: SharedFormatter,
        connector: Box<dyn Connector>,
    ) -> Self {
        Self {
            config,
            formatter,
            connector,
            state: ConnectionState::Absent,
            last_error: None,
            connect_failures: 0,
            dropped_lines: 0,
            warner: RateLimitedWarner::default(),
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn endpoint(&self) -> Endpoint {
        self.config.endpoint()
    }

    /// Whether a socket is held and the peer has not closed it.
    pub fn is_connected(&self) -> bool {
        match &self.state {
            ConnectionState::Connected(conn) => conn.is_open(),
            ConnectionState::Absent | ConnectionState::Closed => false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        match self.state {
            ConnectionState::Absent => ConnectionStatus::Absent,
            ConnectionState::Connected(_) => ConnectionStatus::Connected,
            ConnectionState::Closed => ConnectionStatus::Closed,
        }
    }

    /// The most recent connect or send failure, if any.
    pub fn last_error(&self) -> Option<&ConnectionFailure> {
        self.last_error.as_ref()
    }

    /// Number of failed connection attempts since construction.
    pub fn connect_failures(&self) -> u64 {
        self.connect_failures
    }

    /// Number of lines that could not be delivered.
    pub fn dropped_lines(&self) -> u64 {
        self.dropped_lines
    }

    /// Render the exact bytes `write` would transmit for `event`.
    ///
    /// Line breaks produced by the formatter are replaced with spaces so one
    /// event always occupies one line at the collector.
    pub fn build_line(&self, event: &LogEvent) -> String {
        let formatted = self.formatter.format(event);
        let token = self.config.token();
        let separator = self.config.line_separator();
        let mut line = String::with_capacity(token.len() + formatted.len() + separator.len() + 1);
        line.push_str(token);
        line.push(' ');
        line.extend(formatted.chars().map(|c| match c {
            '\r' | '\n' => ' ',
            other => other,
        }));
        line.push_str(separator);
        line
    }

    /// Deliver `event` to the collector on a best-effort basis.
    pub fn write(&mut self, event: &LogEvent) {
        let connected = match self.connect() {
            Ok(()) => true,
            Err(failure) => {
                self.connect_failures += 1;
                debug!(
                    "TokenWriter could not connect to {}: {failure}",
                    self.config.endpoint()
                );
                self.last_error = Some(failure);
                false
            }
        };
        let line = self.build_line(event);
        if connected {
            self.transmit(&line);
        } else {
            self.drop_line();
        }
    }

    /// Flush the socket and report any pending dropped-line warning.
    pub fn flush(&mut self) {
        if let ConnectionState::Connected(conn) = &mut self.state
            && let Err(err) = conn.flush()
        {
            self.fail_send(&err);
        }
        self.flush_warnings();
    }

    /// Close a non-persistent connection. Persistent sockets stay open for
    /// reuse by later writers.
    pub fn shutdown(&mut self) {
        self.flush_warnings();
        if self.config.persistent() || !matches!(self.state, ConnectionState::Connected(_)) {
            return;
        }
        if let ConnectionState::Connected(mut conn) =
            std::mem::replace(&mut self.state, ConnectionState::Closed)
        {
            conn.close();
            debug!("TokenWriter closed connection to {}", self.config.endpoint());
        }
    }

    fn connect(&mut self) -> Result<(), ConnectionFailure> {
        if self.is_connected() {
            return Ok(());
        }
        let endpoint = self.config.endpoint();
        if matches!(self.state, ConnectionState::Connected(_)) {
            debug!("TokenWriter: {endpoint} closed the connection; reconnecting");
            self.state = ConnectionState::Closed;
        }

        let timeout = self.config.connect_timeout();
        let opened = if self.config.persistent() {
            self.connector.open_persistent(&endpoint, timeout)
        } else {
            self.connector.open(&endpoint, timeout)
        };
        let conn = opened.map_err(ConnectionFailure::from)?;
        if !conn.is_open() {
            return Err(ConnectionFailure::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection to {endpoint} was closed before use"),
            ));
        }
        self.state = ConnectionState::Connected(conn);
        debug!("TokenWriter connected to {endpoint}");
        Ok(())
    }

    fn transmit(&mut self, line: &str) {
        let ConnectionState::Connected(conn) = &mut self.state else {
            self.drop_line();
            return;
        };
        if let Err(err) = conn.write_all(line.as_bytes()).and_then(|()| conn.flush()) {
            self.fail_send(&err);
            self.drop_line();
        }
    }

    fn fail_send(&mut self, err: &io::Error) {
        debug!(
            "TokenWriter send to {} failed: {err}",
            self.config.endpoint()
        );
        self.last_error = Some(ConnectionFailure::from(err));
        if let ConnectionState::Connected(mut conn) =
            std::mem::replace(&mut self.state, ConnectionState::Closed)
        {
            conn.close();
        }
    }

    fn drop_line(&mut self) {
        self.dropped_lines += 1;
        self.warner.record_drop();
        let endpoint = self.config.endpoint();
        let reason = self
            .last_error
            .as_ref()
            .map_or("no active connection", |failure| failure.message.as_str());
        self.warner.warn_if_due(|count| {
            warn!("TokenWriter dropped {count} lines for {endpoint}: {reason}");
        });
    }

    fn flush_warnings(&mut self) {
        let endpoint = self.config.endpoint();
        self.warner.flush(|count| {
            warn!("TokenWriter dropped {count} lines for {endpoint} in the last interval");
        });
    }
}

impl LogWriter for TokenWriter {
    fn write(&mut self, event: &LogEvent) {
        TokenWriter::write(self, event);
    }

    fn flush(&mut self) {
        TokenWriter::flush(self);
    }

    fn shutdown(&mut self) {
        TokenWriter::shutdown(self);
    }
}

impl Drop for TokenWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for TokenWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenWriter")
            .field("endpoint", &self.config.endpoint())
            .field("persistent", &self.config.persistent())
            .field("status", &self.status())
            .field("dropped_lines", &self.dropped_lines)
            .finish()
    }
}
