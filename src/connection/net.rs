//! Socket and TLS capability
//!
//! Socket creation, connection, and the TLS handshake are bundled behind one
//! trait and injected into the client, rather than reached for as process
//! globals. The connection establisher only sees this interface, which keeps
//! the candidate loop and the teardown accounting testable against fakes.

use super::tls::{parse_server_name, TlsConfig};
use super::transport::Wire;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpSocket, TcpStream};
use tokio_rustls::TlsConnector;

/// Network capability: create sockets, connect them, and upgrade to TLS.
///
/// `open` and `connect` are separate on purpose — the establisher treats a
/// socket-creation failure as fatal (descriptor exhaustion) while a connect
/// failure merely skips to the next candidate, and the two cannot be told
/// apart once fused.
#[allow(async_fn_in_trait)]
pub trait Net {
    /// An unconnected socket for one candidate endpoint
    type Socket;
    /// A connected plain stream
    type Stream: Wire;
    /// A TLS session layered over a connected stream
    type Session: Wire;

    /// Create a socket suitable for connecting to `addr`.
    ///
    /// Failure here aborts the whole connection attempt.
    fn open(&self, addr: &SocketAddr) -> io::Result<Self::Socket>;

    /// Attempt to connect `socket` to `addr`, consuming the socket.
    ///
    /// On failure the socket is dropped (closed) and the caller advances to
    /// the next candidate.
    async fn connect(&self, socket: Self::Socket, addr: SocketAddr) -> io::Result<Self::Stream>;

    /// Perform a TLS client handshake over `stream`, with SNI for `host`.
    ///
    /// On failure the original stream is handed back so the socket stays
    /// usable (and closeable) by the caller.
    async fn handshake(
        &self,
        stream: Self::Stream,
        host: &str,
    ) -> Result<Self::Session, (io::Error, Self::Stream)>;
}

/// System-backed capability: tokio sockets and rustls sessions.
///
/// When no [`TlsConfig`] is supplied, one is built from the system root
/// store at the first handshake.
#[derive(Debug, Default, Clone)]
pub struct SystemNet {
    tls: Option<TlsConfig>,
}

impl SystemNet {
    /// Capability with TLS deferred to system defaults
    pub fn new() -> Self {
        Self { tls: None }
    }

    /// Capability carrying an explicit TLS configuration
    pub fn with_tls(tls: TlsConfig) -> Self {
        Self { tls: Some(tls) }
    }
}

impl Net for SystemNet {
    type Socket = TcpSocket;
    type Stream = TcpStream;
    type Session = tokio_rustls::client::TlsStream<TcpStream>;

    fn open(&self, addr: &SocketAddr) -> io::Result<TcpSocket> {
        match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
    }

    async fn connect(&self, socket: TcpSocket, addr: SocketAddr) -> io::Result<TcpStream> {
        socket.connect(addr).await
    }

    async fn handshake(
        &self,
        stream: TcpStream,
        host: &str,
    ) -> Result<Self::Session, (io::Error, TcpStream)> {
        let client_config = match &self.tls {
            Some(tls) => tls.client_config(),
            None => match TlsConfig::builder().build() {
                Ok(tls) => tls.client_config(),
                Err(e) => return Err((io::Error::new(io::ErrorKind::Other, e), stream)),
            },
        };

        let server_name = match parse_server_name(host) {
            Ok(name) => name,
            Err(e) => return Err((e, stream)),
        };
        let server_name = match rustls_pki_types::ServerName::try_from(server_name) {
            Ok(name) => name,
            Err(e) => {
                return Err((io::Error::new(io::ErrorKind::InvalidInput, e), stream));
            }
        };

        let connector = TlsConnector::from(client_config);
        // The fallible variant returns the TCP stream on handshake failure,
        // so a failed upgrade leaves the client with its socket intact.
        connector
            .connect(server_name, stream)
            .into_fallible()
            .await
    }
}
