//! Process-wide pool of persistent collector sockets.
//!
//! Persistent writers targeting the same address share one socket. Each
//! writer holds a [`PooledConnection`] wrapping the shared socket; lines are
//! written under the socket's lock so concurrent writers never interleave
//! partial lines. Stale sockets are replaced on the next checkout.

use std::{collections::HashMap, io, sync::Arc};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::transport::{ActiveConnection, Connection, Target};

type SharedSocket = Arc<Mutex<ActiveConnection>>;

static POOL: Lazy<Mutex<HashMap<Target, SharedSocket>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Return the pooled socket for `target`, dialling a new one with `dial`
/// when none exists or the pooled socket has been closed by the peer.
pub(crate) fn checkout(
    target: Target,
    dial: impl FnOnce(&Target) -> io::Result<ActiveConnection>,
) -> io::Result<PooledConnection> {
    {
        let mut pool = POOL.lock();
        if let Some(socket) = pool.get(&target) {
            if !socket.lock().at_eof() {
                return Ok(PooledConnection {
                    target,
                    socket: Arc::clone(socket),
                });
            }
            log::debug!(
                "discarding stale pooled socket for {}:{}",
                target.host,
                target.port
            );
            pool.remove(&target);
        }
    }

    // Dial without holding the pool lock; a racing checkout may replace our
    // entry, which only costs one extra socket.
    let socket = Arc::new(Mutex::new(dial(&target)?));
    POOL.lock().insert(target.clone(), Arc::clone(&socket));
    Ok(PooledConnection { target, socket })
}

fn evict(target: &Target, socket: &SharedSocket) {
    let mut pool = POOL.lock();
    if pool
        .get(target)
        .is_some_and(|pooled| Arc::ptr_eq(pooled, socket))
    {
        pool.remove(target);
    }
}

#[cfg(test)]
pub(crate) fn is_pooled(target: &Target) -> bool {
    POOL.lock().contains_key(target)
}

/// A writer's handle on a pooled socket.
pub(crate) struct PooledConnection {
    target: Target,
    socket: SharedSocket,
}

impl PooledConnection {
    #[cfg(test)]
    pub(crate) fn shares_socket_with(&self, other: &PooledConnection) -> bool {
        Arc::ptr_eq(&self.socket, &other.socket)
    }
}

impl Connection for PooledConnection {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let result = self.socket.lock().write_all(buf);
        if result.is_err() {
            evict(&self.target, &self.socket);
        }
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.socket.lock().flush()
    }

    fn is_open(&self) -> bool {
        !self.socket.lock().at_eof()
    }

    fn close(&mut self) {}
}
