//! The capability a logging pipeline needs from a writer.
//!
//! [`LogWriter`] is deliberately small so any framework can adapt to it.
//! Writers take `&mut self`; [`SerializedWriter`] lets multi-threaded
//! pipelines share one writer behind a lock.

use std::cell::RefCell;

use parking_lot::ReentrantMutex;

use crate::log_event::LogEvent;

/// Trait implemented by all log writers.
///
/// Writers must never panic or return errors from `write`: delivery is best
/// effort and failures are handled internally.
pub trait LogWriter: Send {
    /// Deliver one event.
    fn write(&mut self, event: &LogEvent);

    /// Push any buffered output towards its destination.
    fn flush(&mut self) {}

    /// Release resources held for delivery.
    fn shutdown(&mut self) {}
}

/// Lock serialising access to a writer shared between threads.
///
/// Re-entrant calls from the same thread (for example a formatter that logs)
/// are dropped instead of deadlocking.
pub struct SerializedWriter<W: LogWriter> {
    inner: ReentrantMutex<RefCell<W>>,
}

impl<W: LogWriter> SerializedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(writer)),
        }
    }

    /// Run `f` with exclusive access to the writer. Returns `None` when the
    /// current thread is already inside the writer.
    pub fn with<R>(&self, f: impl FnOnce(&mut W) -> R) -> Option<R> {
        let guard = self.inner.lock();
        let mut writer = guard.try_borrow_mut().ok()?;
        Some(f(&mut writer))
    }

    pub fn write(&self, event: &LogEvent) {
        self.with(|writer| writer.write(event));
    }

    pub fn flush(&self) {
        self.with(|writer| writer.flush());
    }

    pub fn shutdown(&self) {
        self.with(|writer| writer.shutdown());
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner().into_inner()
    }
}
