pub mod fixtures;
pub mod local_connector;

pub use fixtures::{LineServer, line_server, refused_addr};
pub use local_connector::LocalConnector;
