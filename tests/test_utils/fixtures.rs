//! Loopback listeners used by the integration tests.

use std::{
    io::{BufRead, BufReader},
    net::{SocketAddr, TcpListener},
    sync::mpsc::{self, Receiver},
    thread,
    time::Duration,
};

use rstest::fixture;

/// A listener that accepts any number of connections and reports every
/// received line, terminator included.
pub struct LineServer {
    addr: SocketAddr,
    lines: Receiver<String>,
}

impl LineServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait up to two seconds for the next line.
    pub fn next_line(&self) -> String {
        self.lines
            .recv_timeout(Duration::from_secs(2))
            .expect("line should arrive")
    }

    /// Assert no further line arrives within `wait`.
    pub fn assert_quiet(&self, wait: Duration) {
        if let Ok(line) = self.lines.recv_timeout(wait) {
            panic!("unexpected line {line:?}");
        }
    }
}

#[fixture]
pub fn line_server() -> LineServer {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    let (tx, lines) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { return };
            let tx = tx.clone();
            thread::spawn(move || {
                let mut reader = BufReader::new(stream);
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line) {
                        Ok(0) | Err(_) => return,
                        Ok(_) => {
                            if tx.send(line).is_err() {
                                return;
                            }
                        }
                    }
                }
            });
        }
    });
    LineServer { addr, lines }
}

/// An address nothing listens on.
#[fixture]
pub fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    listener.local_addr().expect("listener has address")
}
