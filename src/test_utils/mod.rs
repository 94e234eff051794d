//! Test helpers shared across crate unit tests and downstream test suites.
//!
//! Compiled for unit tests and, behind the `test-util` feature, for callers
//! that want to exercise a [`TokenWriter`](crate::TokenWriter) without a
//! network.

mod recording_connector;

pub use recording_connector::{ConnectAttempt, RecordingConnector};
