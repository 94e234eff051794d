//! Transport primitives for the token writer.
//!
//! [`Connector`] is the seam between the writer and the network: the writer
//! only ever asks for a fresh or a persistent [`Connection`] to an
//! [`Endpoint`]. [`NetConnector`] implements it with real TCP and
//! `native-tls` sockets.

use std::{
    io::{self, Read, Write},
    net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use native_tls::{HandshakeError, TlsConnector, TlsStream};
use parking_lot::Mutex;

use super::{
    endpoint::{Endpoint, Scheme},
    pool,
};

/// Upper bound on reads made while checking a socket for end-of-stream.
const MAX_DRAIN_READS: usize = 64;

/// An open, writable socket handle.
pub trait Connection: Send {
    /// Write a full buffer to the socket.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flush the underlying writer.
    fn flush(&mut self) -> io::Result<()>;

    /// Return `false` once the peer has closed the stream.
    ///
    /// The collector never sends application data, so implementations may
    /// discard whatever the peer has sent while checking.
    fn is_open(&self) -> bool;

    /// Release the socket. Pooled handles leave the shared socket open.
    fn close(&mut self);
}

/// Opens connections to collector endpoints.
pub trait Connector: Send + Sync {
    /// Open a new socket used by a single writer.
    fn open(&self, endpoint: &Endpoint, timeout: Duration) -> io::Result<Box<dyn Connection>>;

    /// Open or reuse a socket shared by every persistent writer targeting
    /// the same endpoint.
    fn open_persistent(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> io::Result<Box<dyn Connection>>;
}

/// Concrete address a connector dials.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Target {
    pub(crate) scheme: Scheme,
    pub(crate) host: String,
    pub(crate) port: u16,
    /// Skip certificate and hostname validation (intended for tests).
    pub(crate) accept_invalid_certs: bool,
}

impl Target {
    /// Resolve the host, giving up at `deadline`.
    ///
    /// Literal IP addresses skip the resolver. Names are looked up on a
    /// helper thread, which is left to finish on its own after a timeout.
    fn socket_addrs(&self, deadline: Instant) -> io::Result<Vec<SocketAddr>> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, self.port)]);
        }
        let (tx, rx) = mpsc::channel();
        let host = self.host.clone();
        let port = self.port;
        thread::Builder::new()
            .name("logentries-resolve".into())
            .spawn(move || {
                let resolved = (host.as_str(), port)
                    .to_socket_addrs()
                    .map(|iter| iter.collect::<Vec<_>>());
                let _ = tx.send(resolved);
            })?;
        match rx.recv_timeout(time_left(deadline)?) {
            Ok(resolved) => resolved,
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out("resolving")),
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::other(format!(
                "resolver for {}:{} exited without an answer",
                self.host, self.port
            ))),
        }
    }

    fn timed_out(&self, stage: &str) -> io::Error {
        io::Error::new(
            io::ErrorKind::TimedOut,
            format!("{stage} {}:{} timed out", self.host, self.port),
        )
    }
}

fn time_left(deadline: Instant) -> io::Result<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        return Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "connect deadline elapsed",
        ));
    }
    Ok(left)
}

/// TCP stream whose blocking reads and writes stop at an optional deadline.
///
/// Each call re-arms the socket timeouts with the time remaining.
#[derive(Debug)]
pub(crate) struct BoundedStream {
    inner: TcpStream,
    deadline: Option<Instant>,
}

impl BoundedStream {
    fn new(inner: TcpStream, deadline: Instant) -> Self {
        Self {
            inner,
            deadline: Some(deadline),
        }
    }

    fn arm(&self) -> io::Result<()> {
        if let Some(deadline) = self.deadline {
            let left = time_left(deadline)?;
            self.inner.set_read_timeout(Some(left))?;
            self.inner.set_write_timeout(Some(left))?;
        }
        Ok(())
    }

    /// Drop the deadline once the connection is established.
    fn release(&mut self) -> io::Result<()> {
        self.deadline = None;
        self.inner.set_read_timeout(None)?;
        self.inner.set_write_timeout(None)
    }
}

impl Read for BoundedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.arm()?;
        self.inner.read(buf)
    }
}

impl Write for BoundedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.arm()?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Active socket connection state.
pub(crate) enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<BoundedStream>>),
}

impl ActiveConnection {
    fn tcp(&self) -> &TcpStream {
        match self {
            ActiveConnection::PlainTcp(stream) => stream,
            ActiveConnection::Tls(stream) => &stream.get_ref().inner,
        }
    }

    /// Report whether the peer has closed the stream.
    ///
    /// Pending input is read and discarded. TLS sockets are read through the
    /// TLS layer, so session tickets are consumed as records and a
    /// `close_notify` surfaces as end-of-stream.
    pub fn at_eof(&mut self) -> bool {
        if self.tcp().set_nonblocking(true).is_err() {
            return true;
        }
        let eof = self.drain_incoming();
        self.tcp().set_nonblocking(false).is_err() || eof
    }

    fn drain_incoming(&mut self) -> bool {
        let mut scratch = [0u8; 512];
        for _ in 0..MAX_DRAIN_READS {
            let read = match self {
                ActiveConnection::PlainTcp(stream) => stream.read(&mut scratch),
                ActiveConnection::Tls(stream) => stream.read(&mut scratch),
            };
            match read {
                Ok(0) => return true,
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return err.kind() != io::ErrorKind::WouldBlock,
            }
        }
        false
    }

    /// Write a full buffer to the socket.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.write_all(buf),
            ActiveConnection::Tls(stream) => stream.write_all(buf),
        }
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.flush(),
            ActiveConnection::Tls(stream) => stream.flush(),
        }
    }

    /// Shut the socket down in both directions.
    pub fn shutdown(&mut self) {
        let result = match self {
            ActiveConnection::PlainTcp(stream) => stream.shutdown(Shutdown::Both),
            ActiveConnection::Tls(stream) => stream
                .shutdown()
                .and_then(|()| stream.get_ref().inner.shutdown(Shutdown::Both)),
        };
        if let Err(err) = result
            && err.kind() != io::ErrorKind::NotConnected
        {
            log::debug!("token writer socket shutdown failed: {err}");
        }
    }
}

/// A socket owned by a single writer.
///
/// The lock only lets [`Connection::is_open`] drain the socket through a
/// shared reference; it is never contended.
struct FreshConnection(Mutex<ActiveConnection>);

impl Connection for FreshConnection {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.get_mut().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.get_mut().flush()
    }

    fn is_open(&self) -> bool {
        !self.0.lock().at_eof()
    }

    fn close(&mut self) {
        self.0.get_mut().shutdown();
    }
}

/// Dial `addrs` in order, sharing one deadline across every attempt.
pub(super) fn connect_tcp(
    target: &Target,
    addrs: &[SocketAddr],
    deadline: Instant,
) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in addrs {
        let Ok(left) = time_left(deadline) else {
            return Err(target.timed_out("connecting to"));
        };
        match TcpStream::connect_timeout(addr, left) {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses resolved for {}:{}", target.host, target.port),
        )
    }))
}

fn tls_connector(target: &Target) -> io::Result<TlsConnector> {
    let mut builder = TlsConnector::builder();
    if target.accept_invalid_certs {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }
    builder.build().map_err(io::Error::other)
}

fn handshake(
    target: &Target,
    stream: TcpStream,
    deadline: Instant,
) -> io::Result<ActiveConnection> {
    let connector = tls_connector(target)?;
    let mut stream = connector
        .connect(&target.host, BoundedStream::new(stream, deadline))
        .map_err(|err| match err {
            HandshakeError::WouldBlock(_) => target.timed_out("tls handshake with"),
            HandshakeError::Failure(_) if Instant::now() >= deadline => {
                target.timed_out("tls handshake with")
            }
            HandshakeError::Failure(err) => io::Error::new(io::ErrorKind::ConnectionAborted, err),
        })?;
    stream.get_mut().release()?;
    Ok(ActiveConnection::Tls(Box::new(stream)))
}

/// Establish a socket connection to `target`.
///
/// Name resolution, every address attempt and any TLS handshake share a
/// single deadline `timeout` from now.
pub(crate) fn connect_target(target: &Target, timeout: Duration) -> io::Result<ActiveConnection> {
    let deadline = Instant::now().checked_add(timeout).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("connect timeout {timeout:?} is out of range"),
        )
    })?;
    let addrs = target.socket_addrs(deadline)?;
    let stream = connect_tcp(target, &addrs, deadline)?;
    match target.scheme {
        Scheme::Tcp => Ok(ActiveConnection::PlainTcp(stream)),
        Scheme::Tls => handshake(target, stream, deadline),
    }
}

/// Connector dialling real sockets.
///
/// Persistent connections are kept in a process-wide pool keyed by the
/// dialled address, so writers created later reuse an existing socket while
/// the peer keeps it open.
#[derive(Clone, Debug, Default)]
pub struct NetConnector {
    redirect: Option<(String, u16)>,
    accept_invalid_certs: bool,
}

impl NetConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dial `host:port` instead of the collector, keeping the endpoint's
    /// scheme. Lets tests run against a local listener.
    #[cfg(any(test, feature = "test-util"))]
    pub fn redirected(host: impl Into<String>, port: u16) -> Self {
        Self {
            redirect: Some((host.into(), port)),
            accept_invalid_certs: false,
        }
    }

    /// Skip TLS certificate and hostname validation (intended for tests
    /// against a self-signed listener).
    #[cfg(any(test, feature = "test-util"))]
    pub fn accepting_invalid_certs(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }

    pub(crate) fn target(&self, endpoint: &Endpoint) -> Target {
        let (host, port) = match &self.redirect {
            Some((host, port)) => (host.clone(), *port),
            None => (endpoint.host.to_owned(), endpoint.port),
        };
        Target {
            scheme: endpoint.scheme,
            host,
            port,
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

impl Connector for NetConnector {
    fn open(&self, endpoint: &Endpoint, timeout: Duration) -> io::Result<Box<dyn Connection>> {
        let conn = connect_target(&self.target(endpoint), timeout)?;
        Ok(Box::new(FreshConnection(Mutex::new(conn))))
    }

    fn open_persistent(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> io::Result<Box<dyn Connection>> {
        let target = self.target(endpoint);
        let conn = pool::checkout(target, |target| connect_target(target, timeout))?;
        Ok(Box::new(conn))
    }
}
