//! A connector that records connect attempts and transmitted bytes in
//! memory.
//!
//! Clones share state, so a test can hand one clone to the writer and keep
//! another for assertions.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;

use crate::writer::{Connection, Connector, Endpoint};

/// One call made to [`RecordingConnector`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectAttempt {
    pub endpoint: Endpoint,
    pub persistent: bool,
    pub timeout: Duration,
}

#[derive(Default)]
struct Recorder {
    attempts: Vec<ConnectAttempt>,
    transmitted: Vec<u8>,
    refuse_connects: bool,
    fail_writes: bool,
    stale_handles: bool,
    closed: usize,
    handles: Vec<Arc<AtomicBool>>,
}

/// Connector double backed by shared in-memory state.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    inner: Arc<Mutex<Recorder>>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector whose every connect attempt is refused.
    pub fn refusing() -> Self {
        let connector = Self::new();
        connector.set_refuse_connects(true);
        connector
    }

    pub fn set_refuse_connects(&self, refuse: bool) {
        self.inner.lock().refuse_connects = refuse;
    }

    /// Make every subsequent write fail with a broken pipe.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Hand out handles that are already at end-of-stream.
    pub fn set_stale_handles(&self, stale: bool) {
        self.inner.lock().stale_handles = stale;
    }

    /// Simulate the peer closing every handle issued so far.
    pub fn hang_up(&self) {
        for handle in &self.inner.lock().handles {
            handle.store(false, Ordering::SeqCst);
        }
    }

    pub fn attempts(&self) -> Vec<ConnectAttempt> {
        self.inner.lock().attempts.clone()
    }

    pub fn transmitted(&self) -> Vec<u8> {
        self.inner.lock().transmitted.clone()
    }

    /// Transmitted bytes decoded as UTF-8.
    pub fn transmitted_text(&self) -> String {
        String::from_utf8(self.transmitted()).expect("transmitted bytes are UTF-8")
    }

    /// Number of handles explicitly closed by a writer.
    pub fn closed_count(&self) -> usize {
        self.inner.lock().closed
    }

    fn record(
        &self,
        endpoint: &Endpoint,
        persistent: bool,
        timeout: Duration,
    ) -> io::Result<Box<dyn Connection>> {
        let mut recorder = self.inner.lock();
        recorder.attempts.push(ConnectAttempt {
            endpoint: *endpoint,
            persistent,
            timeout,
        });
        if recorder.refuse_connects {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("connection to {endpoint} refused"),
            ));
        }
        let open = Arc::new(AtomicBool::new(!recorder.stale_handles));
        recorder.handles.push(Arc::clone(&open));
        Ok(Box::new(RecordingConnection {
            recorder: Arc::clone(&self.inner),
            open,
        }))
    }
}

impl Connector for RecordingConnector {
    fn open(&self, endpoint: &Endpoint, timeout: Duration) -> io::Result<Box<dyn Connection>> {
        self.record(endpoint, false, timeout)
    }

    fn open_persistent(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> io::Result<Box<dyn Connection>> {
        self.record(endpoint, true, timeout)
    }
}

struct RecordingConnection {
    recorder: Arc<Mutex<Recorder>>,
    open: Arc<AtomicBool>,
}

impl Connection for RecordingConnection {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut recorder = self.recorder.lock();
        if recorder.fail_writes {
            self.open.store(false, Ordering::SeqCst);
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        recorder.transmitted.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        self.recorder.lock().closed += 1;
    }
}
