//! Token-authenticated line writer.
//!
//! This module defines [`TokenWriter`], which renders each
//! [`LogEvent`](crate::log_event::LogEvent) as `"<token> <line><separator>"`
//! and sends it to the fixed collector endpoint over TCP or TLS. Sockets are
//! opened lazily on the calling thread, reused while the peer keeps them
//! open, and re-established by the next write after any failure. Nothing is
//! queued or retried: a line that cannot be sent is dropped.

mod builder;
mod config;
mod endpoint;
mod pool;
mod token_writer;
mod transport;


pub use builder::TokenWriterBuilder;
pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_LINE_SEPARATOR, DEFAULT_PERSISTENT, DEFAULT_USE_TLS,
    WriterConfig,
};
pub use endpoint::{
    COLLECTOR_HOST, Endpoint, PLAINTEXT_ENDPOINT, PLAINTEXT_PORT, Scheme, TLS_ENDPOINT, TLS_PORT,
};
pub use token_writer::{ConnectionStatus, TokenWriter};
pub use transport::{Connection, Connector, NetConnector};
