//! Token-authenticated log shipping to the Logentries collector.
//!
//! A [`TokenWriter`] renders each [`LogEvent`] as one line prefixed with the
//! account token and sends it over plain TCP or TLS. Delivery is best
//! effort: connection problems never surface to the caller, and only invalid
//! configuration is reported as an error.
//!
//! ```no_run
//! use logentries_writer::{LogEvent, Priority, TokenWriter};
//!
//! let mut writer = TokenWriter::builder("2bfbea1e-10c3-4419-bdad-7e6435882e1f")
//!     .with_tls(true)
//!     .build()?;
//! writer.write(&LogEvent::new(Priority::Warning, "disk low"));
//! writer.shutdown();
//! # Ok::<(), logentries_writer::WriterError>(())
//! ```

pub mod error;
pub mod file_config;
pub mod formatter;
pub mod level;
pub mod log_event;
pub mod log_writer;
pub mod rate_limited_warner;
pub mod writer;

#[cfg(feature = "log-compat")]
pub mod log_compat;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use error::{ConnectionFailure, WriterError};
pub use file_config::{load_writer_builder, load_writer_config};
pub use formatter::{DEFAULT_TEMPLATE, JsonFormatter, LineFormatter, SharedFormatter, SimpleFormatter};
pub use level::{ParsePriorityError, Priority};
pub use log_event::{ExtraFields, LogEvent};
pub use log_writer::{LogWriter, SerializedWriter};
pub use writer::{
    COLLECTOR_HOST, Connection, ConnectionStatus, Connector, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_LINE_SEPARATOR, DEFAULT_PERSISTENT, DEFAULT_USE_TLS, Endpoint, NetConnector,
    PLAINTEXT_ENDPOINT, PLAINTEXT_PORT, Scheme, TLS_ENDPOINT, TLS_PORT, TokenWriter,
    TokenWriterBuilder, WriterConfig,
};

#[cfg(feature = "log-compat")]
pub use log_compat::{TokenLogger, install as install_logger};
#[cfg(feature = "tracing-compat")]
pub use tracing_compat::TokenWriterLayer;
