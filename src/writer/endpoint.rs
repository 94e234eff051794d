//! Fixed collector endpoints.
//!
//! The collector accepts token-prefixed lines on one plaintext and one TLS
//! port. Which one a writer uses is decided solely by its TLS flag.

use std::fmt;

/// Hostname of the token-based intake.
pub const COLLECTOR_HOST: &str = "api.logentries.com";
/// Port accepting plaintext TCP connections.
pub const PLAINTEXT_PORT: u16 = 10000;
/// Port accepting TLS connections.
pub const TLS_PORT: u16 = 20000;

/// Wire protocol spoken with an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    Tcp,
    Tls,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Tcp => "tcp",
            Scheme::Tls => "tls",
        }
    }
}

/// A collector address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: &'static str,
    pub port: u16,
}

/// Plaintext collector endpoint.
pub const PLAINTEXT_ENDPOINT: Endpoint = Endpoint {
    scheme: Scheme::Tcp,
    host: COLLECTOR_HOST,
    port: PLAINTEXT_PORT,
};

/// TLS collector endpoint.
pub const TLS_ENDPOINT: Endpoint = Endpoint {
    scheme: Scheme::Tls,
    host: COLLECTOR_HOST,
    port: TLS_PORT,
};

impl Endpoint {
    /// Pick the endpoint matching the TLS flag.
    pub const fn select(use_tls: bool) -> Self {
        if use_tls { TLS_ENDPOINT } else { PLAINTEXT_ENDPOINT }
    }

    pub fn is_tls(&self) -> bool {
        self.scheme == Scheme::Tls
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}
