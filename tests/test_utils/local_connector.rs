//! A [`Connector`] that dials a fixed local address regardless of the
//! requested endpoint, so integration tests can run the writer against a
//! listener on the loopback interface.

use std::{
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use logentries_writer::{Connection, Connector, Endpoint};

#[derive(Clone, Debug)]
pub struct LocalConnector {
    addr: SocketAddr,
    attempts: Arc<AtomicUsize>,
}

impl LocalConnector {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of connections opened (or attempted) so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn dial(&self, timeout: Duration) -> io::Result<Box<dyn Connection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let stream = TcpStream::connect_timeout(&self.addr, timeout)?;
        Ok(Box::new(LocalConnection(stream)))
    }
}

impl Connector for LocalConnector {
    fn open(&self, _endpoint: &Endpoint, timeout: Duration) -> io::Result<Box<dyn Connection>> {
        self.dial(timeout)
    }

    fn open_persistent(
        &self,
        _endpoint: &Endpoint,
        timeout: Duration,
    ) -> io::Result<Box<dyn Connection>> {
        self.dial(timeout)
    }
}

struct LocalConnection(TcpStream);

impl Connection for LocalConnection {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.0, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.0)
    }

    fn is_open(&self) -> bool {
        if self.0.set_nonblocking(true).is_err() {
            return false;
        }
        let mut scratch = [0u8; 256];
        let open = loop {
            match (&self.0).read(&mut scratch) {
                Ok(0) => break false,
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => break err.kind() == io::ErrorKind::WouldBlock,
            }
        };
        self.0.set_nonblocking(false).is_ok() && open
    }

    fn close(&mut self) {
        let _ = self.0.shutdown(Shutdown::Both);
    }
}
