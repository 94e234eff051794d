//! Builder for [`TokenWriter`](super::TokenWriter).
//!
//! Exposes the TLS and persistence flags, the connect timeout, the line
//! separator, and injection points for the formatter and connector. All
//! validation happens in [`TokenWriterBuilder::build`].

use std::{fmt, time::Duration};

use crate::{
    error::WriterError,
    formatter::{LineFormatter, SharedFormatter},
};

use super::{
    config::{
        DEFAULT_CONNECT_TIMEOUT, DEFAULT_LINE_SEPARATOR, DEFAULT_PERSISTENT, DEFAULT_USE_TLS,
        WriterConfig, timeout_from_secs,
    },
    token_writer::TokenWriter,
    transport::{Connector, NetConnector},
};

#[derive(Clone, Copy, Debug, PartialEq)]
enum TimeoutSetting {
    Secs(f64),
    Exact(Duration),
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`TokenWriter`] instances.
#[derive(Default)]
pub struct TokenWriterBuilder {
    token: String,
    use_tls: Option<bool>,
    persistent: Option<bool>,
    connect_timeout: Option<TimeoutSetting>,
    line_separator: Option<String>,
    formatter: Option<SharedFormatter>,
    connector: Option<Box<dyn Connector>>,
}

impl TokenWriterBuilder {
    /// Create a builder for `token` with every other setting at its default.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    option_setter!(
        #[doc = "Use the TLS endpoint instead of the plaintext one."]
        with_tls,
        use_tls,
        bool
    );
    option_setter!(
        #[doc = "Request a pooled, persistent socket (the default) or a fresh one."]
        with_persistent,
        persistent,
        bool
    );
    option_setter!(
        #[doc = "Override the separator appended to every line."]
        with_line_separator,
        line_separator,
        String
    );

    /// Override the connect timeout in (possibly fractional) seconds.
    pub fn with_connect_timeout_secs(mut self, secs: f64) -> Self {
        self.connect_timeout = Some(TimeoutSetting::Secs(secs));
        self
    }

    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(TimeoutSetting::Exact(timeout));
        self
    }

    /// Render events with `formatter` instead of the default template.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: LineFormatter + 'static,
    {
        self.formatter = Some(SharedFormatter::new(formatter));
        self
    }

    /// Render events with an already shared formatter.
    pub fn with_shared_formatter(mut self, formatter: SharedFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Open sockets through `connector` instead of [`NetConnector`].
    pub fn with_connector<C>(mut self, connector: C) -> Self
    where
        C: Connector + 'static,
    {
        self.connector = Some(Box::new(connector));
        self
    }

    fn resolve_timeout(&self) -> Result<Duration, WriterError> {
        match self.connect_timeout {
            None => Ok(DEFAULT_CONNECT_TIMEOUT),
            Some(TimeoutSetting::Secs(secs)) => timeout_from_secs(secs),
            Some(TimeoutSetting::Exact(timeout)) => Ok(timeout),
        }
    }

    /// Validate the settings and produce the writer configuration.
    pub fn build_config(&self) -> Result<WriterConfig, WriterError> {
        WriterConfig::from_parts(
            &self.token,
            self.use_tls.unwrap_or(DEFAULT_USE_TLS),
            self.persistent.unwrap_or(DEFAULT_PERSISTENT),
            self.resolve_timeout()?,
            self.line_separator
                .clone()
                .unwrap_or_else(|| DEFAULT_LINE_SEPARATOR.to_owned()),
        )
    }

    /// Validate the settings and construct the writer. No connection is
    /// attempted until the first write.
    pub fn build(self) -> Result<TokenWriter, WriterError> {
        let config = self.build_config()?;
        let formatter = self.formatter.unwrap_or_default();
        let connector = self
            .connector
            .unwrap_or_else(|| Box::new(NetConnector::new()));
        Ok(TokenWriter::with_parts(config, formatter, connector))
    }
}

impl fmt::Debug for TokenWriterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenWriterBuilder")
            .field("use_tls", &self.use_tls)
            .field("persistent", &self.persistent)
            .field("connect_timeout", &self.connect_timeout)
            .field("line_separator", &self.line_separator)
            .field("custom_formatter", &self.formatter.is_some())
            .field("custom_connector", &self.connector.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingConnector;
    use rstest::rstest;

    #[rstest]
    fn defaults_apply_when_unset() {
        let config = TokenWriterBuilder::new("tok")
            .build_config()
            .expect("valid config");
        assert_eq!(config, WriterConfig::with_token("tok").expect("valid token"));
    }

    #[rstest]
    fn overrides_are_applied() {
        let config = TokenWriterBuilder::new("tok")
            .with_tls(true)
            .with_persistent(false)
            .with_connect_timeout(Duration::from_millis(250))
            .with_line_separator("\r\n".into())
            .build_config()
            .expect("valid config");
        assert!(config.use_tls());
        assert!(!config.persistent());
        assert_eq!(config.connect_timeout(), Duration::from_millis(250));
        assert_eq!(config.line_separator(), "\r\n");
    }

    #[rstest]
    #[case(TokenWriterBuilder::new(""), "empty token")]
    #[case(TokenWriterBuilder::new("tok").with_connect_timeout_secs(0.0), "timeout")]
    #[case(TokenWriterBuilder::new("tok").with_connect_timeout(Duration::ZERO), "timeout")]
    #[case(TokenWriterBuilder::new("tok").with_line_separator(String::new()), "separator")]
    fn invalid_settings_fail_to_build(#[case] builder: TokenWriterBuilder, #[case] needle: &str) {
        let err = builder.build().expect_err("build must fail");
        assert!(
            matches!(err, WriterError::InvalidConfiguration(ref msg) if msg.contains(needle)),
            "unexpected error: {err}"
        );
    }

    #[rstest]
    fn empty_token_never_connects() {
        let connector = RecordingConnector::new();
        let result = TokenWriterBuilder::new("")
            .with_connector(connector.clone())
            .build();
        assert!(result.is_err());
        assert!(connector.attempts().is_empty());
    }

    #[rstest]
    fn debug_output_omits_token() {
        let builder = TokenWriterBuilder::new("secret-token").with_tls(true);
        let rendered = format!("{builder:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("use_tls: Some(true)"));
    }
}
