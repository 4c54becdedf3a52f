//! Scripted network capability for lifecycle tests.
//!
//! Every socket open/close, handshake, and session release is recorded in a
//! shared ledger so tests can assert exact resource counts and release order.

use bytes::BytesMut;
use linewire::{Net, Probe, Resolver, Wire};
use std::collections::{HashSet, VecDeque};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Initialize test logging once; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared resource-accounting ledger
#[derive(Default)]
pub struct Ledger {
    pub sockets_opened: AtomicUsize,
    pub sockets_closed: AtomicUsize,
    pub sessions_released: AtomicUsize,
    pub handshakes: AtomicUsize,
    events: Mutex<Vec<String>>,
}

impl Ledger {
    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.sockets_opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.sockets_closed.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> usize {
        self.sessions_released.load(Ordering::SeqCst)
    }

    pub fn handshake_count(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }
}

/// Scripted resolver: either a fixed candidate list or outright failure
pub enum MockResolver {
    Fail,
    Addrs(Vec<SocketAddr>),
}

impl Resolver for MockResolver {
    async fn resolve(&self, _host: &str, _port: u16) -> io::Result<Vec<SocketAddr>> {
        match self {
            MockResolver::Fail => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "name resolution failed",
            )),
            MockResolver::Addrs(addrs) => Ok(addrs.clone()),
        }
    }
}

/// Scripted network capability
pub struct MockNet {
    ledger: Arc<Ledger>,
    refuse: HashSet<SocketAddr>,
    fail_open: HashSet<SocketAddr>,
    fail_handshake: bool,
    fail_reads: bool,
    fail_writes: bool,
    probe_definite: Arc<AtomicBool>,
    script: Vec<Vec<u8>>,
}

impl MockNet {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            refuse: HashSet::new(),
            fail_open: HashSet::new(),
            fail_handshake: false,
            fail_reads: false,
            fail_writes: false,
            probe_definite: Arc::new(AtomicBool::new(false)),
            script: Vec::new(),
        }
    }

    /// Candidates whose connect attempt is refused
    pub fn refuse(mut self, addr: SocketAddr) -> Self {
        self.refuse.insert(addr);
        self
    }

    /// Candidates whose socket creation fails
    pub fn fail_open(mut self, addr: SocketAddr) -> Self {
        self.fail_open.insert(addr);
        self
    }

    /// Make every handshake fail
    pub fn fail_handshake(mut self) -> Self {
        self.fail_handshake = true;
        self
    }

    /// Make every read on the connected stream fail
    pub fn fail_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Make every write on the connected stream fail
    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Bytes the connected stream will serve to readers, chunk by chunk
    pub fn script(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.script = chunks;
        self
    }

    /// Handle for flipping the probe verdict mid-test
    pub fn probe_handle(&self) -> Arc<AtomicBool> {
        self.probe_definite.clone()
    }
}

/// Unconnected socket; drop without a connect records a close
pub struct MockSocket {
    ledger: Option<Arc<Ledger>>,
}

impl MockSocket {
    fn into_ledger(mut self) -> Arc<Ledger> {
        self.ledger.take().expect("socket consumed twice")
    }
}

impl Drop for MockSocket {
    fn drop(&mut self) {
        if let Some(ledger) = self.ledger.take() {
            ledger.sockets_closed.fetch_add(1, Ordering::SeqCst);
            ledger.record("socket_closed");
        }
    }
}

/// Connected stream; drop records the socket close
pub struct MockStream {
    ledger: Option<Arc<Ledger>>,
    probe_definite: Arc<AtomicBool>,
    fail_reads: bool,
    fail_writes: bool,
    script: VecDeque<Vec<u8>>,
}

impl Drop for MockStream {
    fn drop(&mut self) {
        if let Some(ledger) = self.ledger.take() {
            ledger.sockets_closed.fetch_add(1, Ordering::SeqCst);
            ledger.record("socket_closed");
        }
    }
}

impl Wire for MockStream {
    async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        if self.fail_reads {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "read failed",
            ));
        }
        match self.script.pop_front() {
            Some(chunk) => {
                buf.extend_from_slice(&chunk);
                Ok(chunk.len())
            }
            None => Ok(0),
        }
    }

    async fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
        }
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn probe(&self) -> Probe {
        if self.probe_definite.load(Ordering::SeqCst) {
            Probe::Definite
        } else {
            Probe::Quiet
        }
    }
}

/// Secured session wrapping the stream it was bound to; drop records the
/// session release before the inner socket close
pub struct MockSession {
    ledger: Arc<Ledger>,
    inner: MockStream,
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.ledger.sessions_released.fetch_add(1, Ordering::SeqCst);
        self.ledger.record("session_released");
        // self.inner drops next, recording the socket close
    }
}

impl Wire for MockSession {
    async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        self.inner.read_buf(buf).await
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }

    fn probe(&self) -> Probe {
        self.inner.probe()
    }
}

impl Net for MockNet {
    type Socket = MockSocket;
    type Stream = MockStream;
    type Session = MockSession;

    fn open(&self, addr: &SocketAddr) -> io::Result<MockSocket> {
        if self.fail_open.contains(addr) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "too many open files",
            ));
        }
        self.ledger.sockets_opened.fetch_add(1, Ordering::SeqCst);
        self.ledger.record("socket_opened");
        Ok(MockSocket {
            ledger: Some(self.ledger.clone()),
        })
    }

    async fn connect(&self, socket: MockSocket, addr: SocketAddr) -> io::Result<MockStream> {
        if self.refuse.contains(&addr) {
            // socket drops here, recording the close of the failed candidate
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
        }
        Ok(MockStream {
            ledger: Some(socket.into_ledger()),
            probe_definite: self.probe_definite.clone(),
            fail_reads: self.fail_reads,
            fail_writes: self.fail_writes,
            script: self.script.iter().cloned().collect(),
        })
    }

    async fn handshake(
        &self,
        stream: MockStream,
        _host: &str,
    ) -> Result<MockSession, (io::Error, MockStream)> {
        if self.fail_handshake {
            return Err((
                io::Error::new(io::ErrorKind::InvalidData, "handshake refused by peer"),
                stream,
            ));
        }
        self.ledger.handshakes.fetch_add(1, Ordering::SeqCst);
        self.ledger.record("handshake");
        Ok(MockSession {
            ledger: stream.ledger.clone().expect("stream already released"),
            inner: stream,
        })
    }
}
