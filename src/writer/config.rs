//! Configuration consumed by [`TokenWriter`](super::TokenWriter).
//!
//! [`TokenWriterBuilder`](super::TokenWriterBuilder) and the INI loader
//! produce these values; every constructor validates its input so a
//! `WriterConfig` that exists is always usable.

use std::time::Duration;

use crate::error::WriterError;

use super::endpoint::Endpoint;

/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default separator appended to every transmitted line.
pub const DEFAULT_LINE_SEPARATOR: &str = "\n";
/// Writers request pooled connections unless told otherwise.
pub const DEFAULT_PERSISTENT: bool = true;
/// Writers use the plaintext endpoint unless told otherwise.
pub const DEFAULT_USE_TLS: bool = false;

/// Immutable writer settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterConfig {
    token: String,
    use_tls: bool,
    persistent: bool,
    connect_timeout: Duration,
    line_separator: String,
    endpoint: Endpoint,
}

impl WriterConfig {
    /// Build a configuration from the classic constructor arguments.
    ///
    /// `timeout_secs` may be fractional. Fails with
    /// [`WriterError::InvalidConfiguration`] when the token is blank or `"0"`,
    /// or the timeout is not a positive, finite number of seconds.
    pub fn new(
        token: impl AsRef<str>,
        use_tls: bool,
        persistent: bool,
        timeout_secs: f64,
    ) -> Result<Self, WriterError> {
        Self::from_parts(
            token.as_ref(),
            use_tls,
            persistent,
            timeout_from_secs(timeout_secs)?,
            DEFAULT_LINE_SEPARATOR.to_owned(),
        )
    }

    /// Build a configuration using defaults for everything but the token.
    pub fn with_token(token: impl AsRef<str>) -> Result<Self, WriterError> {
        Self::from_parts(
            token.as_ref(),
            DEFAULT_USE_TLS,
            DEFAULT_PERSISTENT,
            DEFAULT_CONNECT_TIMEOUT,
            DEFAULT_LINE_SEPARATOR.to_owned(),
        )
    }

    pub(crate) fn from_parts(
        token: &str,
        use_tls: bool,
        persistent: bool,
        connect_timeout: Duration,
        line_separator: String,
    ) -> Result<Self, WriterError> {
        let token = validate_token(token)?;
        validate_timeout(connect_timeout)?;
        validate_separator(&line_separator)?;
        Ok(Self {
            token,
            use_tls,
            persistent,
            connect_timeout,
            line_separator,
            endpoint: Endpoint::select(use_tls),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    pub fn persistent(&self) -> bool {
        self.persistent
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn line_separator(&self) -> &str {
        &self.line_separator
    }

    /// Collector endpoint selected by the TLS flag.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }
}

pub(crate) fn validate_token(token: &str) -> Result<String, WriterError> {
    let trimmed = token.trim();
    // A lone "0" was historically treated as no token at all.
    if trimmed.is_empty() || trimmed == "0" {
        return Err(WriterError::invalid(
            "cannot create a token writer with an empty token",
        ));
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn timeout_from_secs(secs: f64) -> Result<Duration, WriterError> {
    let timeout = Duration::try_from_secs_f64(secs).map_err(|_| {
        WriterError::invalid(format!(
            "connect timeout must be a positive number of seconds (got {secs})"
        ))
    })?;
    validate_timeout(timeout)?;
    Ok(timeout)
}

fn validate_timeout(timeout: Duration) -> Result<(), WriterError> {
    if timeout.is_zero() {
        return Err(WriterError::invalid(
            "connect timeout must be greater than zero",
        ));
    }
    Ok(())
}

fn validate_separator(separator: &str) -> Result<(), WriterError> {
    if separator.is_empty() {
        return Err(WriterError::invalid("line separator must not be empty"));
    }
    Ok(())
}
