//! Outbound client connection
//!
//! One [`Client`] owns one outbound connection: the socket (or the TLS
//! session wrapping it), the captured peer address, the sticky status value,
//! and the 8 KiB read buffer the line primitives fill. Protocol drivers layer
//! command/reply sequencing on top of [`read_line`](Client::read_line) and
//! the write primitives; this type never interprets reply contents.

use crate::connection::establish::establish;
use crate::connection::status::{multiplex, Status};
use crate::connection::{Net, SystemNet, TlsConfig, Transport};
use crate::error::{ConnectError, Error, Result, SecureError};
use crate::resolve::{Resolver, SystemResolver};
use bytes::{Bytes, BytesMut};
use std::net::IpAddr;
use tracing::Instrument;

/// Fixed read-buffer capacity, allocated once at connect time
pub const READ_BUF_SIZE: usize = 8192;

/// An outbound client connection, plain or TLS-secured.
///
/// Intended for exclusive use by one protocol session at a time; the `&mut`
/// receivers make concurrent use of one client unrepresentable. The client
/// sets no timeouts of its own — callers wanting bounded latency wrap the
/// futures externally.
pub struct Client<N: Net = SystemNet> {
    net: N,
    host: String,
    transport: Option<Transport<N::Stream, N::Session>>,
    peer: Option<IpAddr>,
    status: Status,
    read_buf: BytesMut,
    line: Option<Bytes>,
}

impl Client {
    /// Connect to `host:port` using the system resolver and socket stack.
    ///
    /// Candidates are attempted in resolver order. A refused or unreachable
    /// candidate closes its socket and the next one is tried; failure to
    /// create a socket at all aborts the whole attempt.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example() -> linewire::Result<()> {
    /// use linewire::Client;
    ///
    /// let mut client = Client::connect("mail.example.com", 25).await?;
    /// assert_eq!(client.status_code(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(host: &str, port: u16) -> std::result::Result<Self, ConnectError> {
        Self::connect_with(&SystemResolver, SystemNet::new(), host, port).await
    }

    /// Connect like [`connect`](Client::connect), carrying a TLS
    /// configuration for a later [`secure`](Client::secure) call.
    pub async fn connect_with_tls_config(
        host: &str,
        port: u16,
        tls: TlsConfig,
    ) -> std::result::Result<Self, ConnectError> {
        Self::connect_with(&SystemResolver, SystemNet::with_tls(tls), host, port).await
    }
}

impl<N: Net> Client<N> {
    /// Connect with injected resolution and network capabilities.
    ///
    /// This is the full entry point; [`Client::connect`] delegates here with
    /// the system-backed implementations.
    pub async fn connect_with<R: Resolver>(
        resolver: &R,
        net: N,
        host: &str,
        port: u16,
    ) -> std::result::Result<Self, ConnectError> {
        async {
            let candidates = match resolver.resolve(host, port).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    return Err(ConnectError::ResolutionFailed {
                        host: host.to_string(),
                        port,
                        source: Some(e),
                    });
                }
            };

            if candidates.is_empty() {
                return Err(ConnectError::ResolutionFailed {
                    host: host.to_string(),
                    port,
                    source: None,
                });
            }

            let (stream, peer) = establish(&net, host, port, &candidates).await?;

            // If the buffer cannot be reserved, the stream drops here and the
            // socket closes with it; no partial client escapes.
            let read_buf = alloc_read_buf()?;

            tracing::debug!(host, port, %peer, "client connected");

            Ok(Self {
                net,
                host: host.to_string(),
                transport: Some(Transport::Plain(stream)),
                peer: Some(peer),
                status: Status::Connected,
                read_buf,
                line: None,
            })
        }
        .instrument(tracing::debug_span!("connect", host = %host, port = port))
        .await
    }

    /// Upgrade the connection to TLS.
    ///
    /// Idempotent: a client that is already secured returns `Ok` without a
    /// new handshake and without touching the existing session. A failed
    /// handshake leaves the plain socket in place for teardown, latches the
    /// status to [`Status::Error`], and surfaces
    /// [`SecureError::HandshakeFailed`].
    pub async fn secure(&mut self) -> std::result::Result<(), SecureError> {
        match self.transport.take() {
            None => Err(SecureError::InvalidClient),
            Some(Transport::Secured(session)) => {
                // Already secured: report success, session untouched.
                self.transport = Some(Transport::Secured(session));
                Ok(())
            }
            Some(Transport::Plain(stream)) => {
                match self.net.handshake(stream, &self.host).await {
                    Ok(session) => {
                        tracing::info!(host = %self.host, "TLS connection established");
                        self.transport = Some(Transport::Secured(session));
                        self.status = Status::Connected;
                        Ok(())
                    }
                    Err((e, stream)) => {
                        tracing::debug!(host = %self.host, error = %e, "TLS handshake failed");
                        self.transport = Some(Transport::Plain(stream));
                        self.status = Status::Error;
                        Err(SecureError::HandshakeFailed(e))
                    }
                }
            }
        }
    }

    /// Current connection status, derived from whichever layer is active.
    ///
    /// A probe that reports nothing new leaves the cached status standing;
    /// any definite report (or a missing transport) latches the status to
    /// [`Status::Error`] permanently. The result therefore depends on
    /// history, not just on current transport health.
    pub fn status(&mut self) -> Status {
        let probe = self.transport.as_ref().map(Transport::probe);
        self.status = multiplex(self.status, probe);
        self.status
    }

    /// Numeric form of [`status`](Client::status): `-1`, `0`, `1`, or `2`
    pub fn status_code(&mut self) -> i8 {
        self.status().code()
    }

    /// Close the connection, releasing the session, socket, peer address,
    /// and read buffer.
    ///
    /// Teardown is best-effort: a failing shutdown of the underlying stream
    /// is logged and swallowed. On a secured client the shutdown terminates
    /// the TLS session at the protocol level (close_notify) before the
    /// socket it wraps is released.
    pub async fn close(mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.shutdown().await {
                tracing::debug!(host = %self.host, error = %e, "shutdown failed during close");
            }
        }
        self.line = None;
        self.peer = None;
        // read_buf and the client record drop here
    }

    /// Read one protocol line into the buffer.
    ///
    /// Fills the read buffer from the active layer until a `\n` arrives, then
    /// exposes the terminated line (terminator included) through
    /// [`line`](Client::line) and returns its length. A clean end-of-stream
    /// sets [`Status::GracefulShutdown`] and returns whatever unterminated
    /// bytes remained (possibly zero); an I/O error latches
    /// [`Status::Error`]. Lines longer than the buffer are rejected rather
    /// than grown.
    pub async fn read_line(&mut self) -> Result<usize> {
        // Release the previous line view so its buffer region can be
        // reclaimed before more data arrives.
        self.line = None;

        loop {
            if let Some(pos) = self.read_buf.iter().position(|&b| b == b'\n') {
                let line = self.read_buf.split_to(pos + 1).freeze();
                let len = line.len();
                self.line = Some(line);
                return Ok(len);
            }

            if self.read_buf.len() >= READ_BUF_SIZE {
                return Err(Error::LineTooLong(READ_BUF_SIZE));
            }

            let transport = self.transport.as_mut().ok_or(Error::NotConnected)?;
            match transport.read_buf(&mut self.read_buf).await {
                Ok(0) => {
                    self.status = Status::GracefulShutdown;
                    let len = self.read_buf.len();
                    if len > 0 {
                        self.line = Some(self.read_buf.split().freeze());
                    }
                    return Ok(len);
                }
                Ok(_) => continue,
                Err(e) => {
                    self.status = Status::Error;
                    return Err(Error::Io(e));
                }
            }
        }
    }

    /// Write raw bytes through the active layer and flush them
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::NotConnected)?;

        let result = async {
            transport.write_all(data).await?;
            transport.flush().await
        }
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                self.status = Status::Error;
                Err(Error::Io(e))
            }
        }
    }

    /// Write formatted text through the active layer.
    ///
    /// ```no_run
    /// # async fn example(client: &mut linewire::Client) -> linewire::Result<()> {
    /// client.write_fmt(format_args!("MAIL FROM: <{}>\r\n", "a@example.com")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn write_fmt(&mut self, args: std::fmt::Arguments<'_>) -> Result<()> {
        let data = std::fmt::format(args);
        self.write_all(data.as_bytes()).await
    }

    /// The most recently read line, terminator included.
    ///
    /// A view into the read buffer's allocation; replaced by the next
    /// [`read_line`](Client::read_line) call.
    pub fn line(&self) -> Option<&[u8]> {
        self.line.as_deref()
    }

    /// Peer address of the candidate that won the connect
    pub fn peer(&self) -> Option<IpAddr> {
        self.peer
    }

    /// Hostname this client was connected to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether the connection has been upgraded to TLS
    pub fn is_secured(&self) -> bool {
        self.transport
            .as_ref()
            .map(Transport::is_secured)
            .unwrap_or(false)
    }
}

impl<N: Net> std::fmt::Debug for Client<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("transport", &self.transport)
            .field("peer", &self.peer)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Allocate the fixed-size read buffer.
///
/// `BytesMut` aborts the process when the allocator fails, so the capacity is
/// reserved through a fallible `Vec` first and only then handed to the
/// buffer, keeping exhaustion reportable.
fn alloc_read_buf() -> std::result::Result<BytesMut, ConnectError> {
    let mut reservation: Vec<u8> = Vec::new();
    reservation
        .try_reserve_exact(READ_BUF_SIZE)
        .map_err(|_| ConnectError::AllocationFailed)?;
    drop(reservation);
    Ok(BytesMut::with_capacity(READ_BUF_SIZE))
}
