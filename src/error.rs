//! Error types surfaced by the writer.
//!
//! Only [`WriterError`] ever reaches callers, and only while constructing a
//! writer or loading its configuration. [`ConnectionFailure`] describes a
//! failed connect or send; the writer records it for inspection instead of
//! returning it from the logging path.

use std::io;

use thiserror::Error;

/// Errors that may occur while configuring a writer.
#[derive(Debug, Error)]
pub enum WriterError {
    /// Invalid user supplied configuration.
    #[error("invalid writer configuration: {0}")]
    InvalidConfiguration(String),
    /// Underlying I/O error whilst reading configuration.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl WriterError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

/// Details of the most recent network failure seen by a writer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ConnectionFailure {
    /// Category of the failure.
    pub kind: io::ErrorKind,
    /// Raw OS error code when the platform reported one.
    pub code: Option<i32>,
    /// Human readable description.
    pub message: String,
}

impl ConnectionFailure {
    /// Build a failure that did not originate from an OS error.
    pub fn new(kind: io::ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }
}

impl From<&io::Error> for ConnectionFailure {
    fn from(err: &io::Error) -> Self {
        Self {
            kind: err.kind(),
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}

impl From<io::Error> for ConnectionFailure {
    fn from(err: io::Error) -> Self {
        Self::from(&err)
    }
}
