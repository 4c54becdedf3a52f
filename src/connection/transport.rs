//! Transport abstraction (plain TCP vs TLS-layered)

use super::status::Probe;
use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Byte-stream interface shared by the plain socket and the secured session.
///
/// Everything the client needs from a connected stream: buffered reads, raw
/// writes, shutdown, and a non-blocking status probe. Implemented for the
/// system types here and for counting fakes in the test suite.
#[allow(async_fn_in_trait)]
pub trait Wire {
    /// Read bytes into the spare capacity of `buf`, returning the count.
    /// Zero means the peer closed the stream.
    async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize>;

    /// Write all of `data` to the stream
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush buffered writes
    async fn flush(&mut self) -> io::Result<()>;

    /// Shut down the stream (sends close_notify on TLS streams)
    async fn shutdown(&mut self) -> io::Result<()>;

    /// Probe the stream for a status change without performing I/O
    fn probe(&self) -> Probe;
}

impl Wire for TcpStream {
    async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        AsyncReadExt::read_buf(self, buf).await
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(self, data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        AsyncWriteExt::flush(self).await
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        AsyncWriteExt::shutdown(self).await
    }

    fn probe(&self) -> Probe {
        // A pending SO_ERROR is a definite report; an empty error queue says
        // nothing new about the connection.
        match self.take_error() {
            Ok(None) => Probe::Quiet,
            Ok(Some(_)) | Err(_) => Probe::Definite,
        }
    }
}

impl Wire for tokio_rustls::client::TlsStream<TcpStream> {
    async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        AsyncReadExt::read_buf(self, buf).await
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(self, data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        AsyncWriteExt::flush(self).await
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        AsyncWriteExt::shutdown(self).await
    }

    fn probe(&self) -> Probe {
        // The session sits on the socket it was bound to; that socket's error
        // queue is authoritative for the secured layer as well.
        let (tcp, _conn) = self.get_ref();
        tcp.probe()
    }
}

/// Active transport of a client: the raw socket, or the TLS session that
/// wraps (and owns) it after a successful upgrade.
pub enum Transport<S, T> {
    /// Plain TCP stream
    Plain(S),
    /// TLS session layered over the stream
    Secured(T),
}

impl<S, T> Transport<S, T> {
    /// Whether the transport has been upgraded to TLS
    pub fn is_secured(&self) -> bool {
        matches!(self, Transport::Secured(_))
    }
}

impl<S: Wire, T: Wire> Transport<S, T> {
    /// Read into `buf` through the active layer
    pub async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        match self {
            Transport::Plain(stream) => stream.read_buf(buf).await,
            Transport::Secured(session) => session.read_buf(buf).await,
        }
    }

    /// Write through the active layer
    pub async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Transport::Plain(stream) => stream.write_all(data).await,
            Transport::Secured(session) => session.write_all(data).await,
        }
    }

    /// Flush the active layer
    pub async fn flush(&mut self) -> io::Result<()> {
        match self {
            Transport::Plain(stream) => stream.flush().await,
            Transport::Secured(session) => session.flush().await,
        }
    }

    /// Shut down the active layer
    pub async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Transport::Plain(stream) => stream.shutdown().await,
            Transport::Secured(session) => session.shutdown().await,
        }
    }

    /// Probe whichever layer is authoritative
    pub fn probe(&self) -> Probe {
        match self {
            Transport::Plain(stream) => stream.probe(),
            Transport::Secured(session) => session.probe(),
        }
    }
}

impl<S, T> std::fmt::Debug for Transport<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Plain(_) => f.write_str("Transport::Plain(..)"),
            Transport::Secured(_) => f.write_str("Transport::Secured(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_healthy_socket_probes_quiet() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let stream = TcpStream::connect(addr).await.expect("connect");

        assert_eq!(stream.probe(), Probe::Quiet);
    }

    #[tokio::test]
    async fn test_transport_debug_hides_stream_internals() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let stream = TcpStream::connect(addr).await.expect("connect");

        let transport: Transport<TcpStream, tokio_rustls::client::TlsStream<TcpStream>> =
            Transport::Plain(stream);
        assert_eq!(format!("{:?}", transport), "Transport::Plain(..)");
        assert!(!transport.is_secured());
    }
}
