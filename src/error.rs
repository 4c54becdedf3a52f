//! Error types

use thiserror::Error;

/// Result type alias for linewire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for client I/O operations
#[derive(Debug, Error)]
pub enum Error {
    /// Connection establishment failed
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// TLS upgrade failed
    #[error(transparent)]
    Secure(#[from] SecureError),

    /// I/O failure on the active transport
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation requires a live connection but the client has none
    #[error("client is not connected")]
    NotConnected,

    /// A protocol line did not fit in the read buffer
    #[error("line exceeds the {0}-byte read buffer")]
    LineTooLong(usize),
}

/// Failure modes of [`Client::connect`](crate::Client::connect)
///
/// `SocketCreateFailed` and `AllCandidatesFailed` are deliberately distinct:
/// socket creation failure signals process-wide descriptor exhaustion and
/// aborts the whole attempt, while a refused/unreachable candidate merely
/// advances the loop to the next resolved address.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The host/port did not resolve to any usable stream endpoint
    #[error("unable to resolve {host}:{port}")]
    ResolutionFailed {
        /// Hostname passed to the resolver
        host: String,
        /// Numeric port
        port: u16,
        /// Underlying resolver error, when one was reported
        #[source]
        source: Option<std::io::Error>,
    },

    /// Socket creation failed; aborts the whole attempt without trying
    /// further candidates
    #[error("unable to create a socket")]
    SocketCreateFailed(#[source] std::io::Error),

    /// Every resolved candidate refused or failed the connection attempt
    #[error("unable to connect to {host}:{port} ({tried} candidate(s) tried)")]
    AllCandidatesFailed {
        /// Hostname the candidates were resolved from
        host: String,
        /// Numeric port
        port: u16,
        /// Number of candidates attempted
        tried: usize,
        /// Error from the last attempted candidate
        #[source]
        source: std::io::Error,
    },

    /// The read buffer could not be allocated after a successful connect
    #[error("unable to allocate the client read buffer")]
    AllocationFailed,
}

/// Failure modes of [`Client::secure`](crate::Client::secure)
#[derive(Debug, Error)]
pub enum SecureError {
    /// The client has no live socket to upgrade
    #[error("client has no active connection to secure")]
    InvalidClient,

    /// TLS negotiation with the peer failed
    #[error("TLS handshake failed")]
    HandshakeFailed(#[source] std::io::Error),
}
