//! Connection establishment
//!
//! Iterates resolved candidates in resolver order. Socket creation failure is
//! fatal for the whole attempt; a failed connect closes that candidate's
//! socket and advances to the next one. The peer address of the winning
//! candidate is captured alongside the stream.

use super::net::Net;
use crate::error::ConnectError;
use std::io;
use std::net::{IpAddr, SocketAddr};

/// Attempt each candidate in order until one connects.
///
/// Returns the connected stream and the candidate address it came from.
/// `candidates` must be non-empty; the caller treats an empty resolution as
/// `ResolutionFailed` before reaching this loop.
pub(crate) async fn establish<N: Net>(
    net: &N,
    host: &str,
    port: u16,
    candidates: &[SocketAddr],
) -> Result<(N::Stream, IpAddr), ConnectError> {
    let mut last_err: Option<io::Error> = None;

    for addr in candidates {
        // Fatal: a socket we cannot even create points at descriptor
        // exhaustion, not at this particular address.
        let socket = net.open(addr).map_err(|e| {
            tracing::debug!(host, port, %addr, error = %e, "socket creation failed");
            ConnectError::SocketCreateFailed(e)
        })?;

        match net.connect(socket, *addr).await {
            Ok(stream) => {
                tracing::debug!(host, port, peer = %addr, "connection established");
                return Ok((stream, addr.ip()));
            }
            Err(e) => {
                // The socket is consumed (and closed) by the failed attempt.
                tracing::debug!(host, port, %addr, error = %e, "candidate failed, advancing");
                last_err = Some(e);
            }
        }
    }

    Err(ConnectError::AllCandidatesFailed {
        host: host.to_string(),
        port,
        tried: candidates.len(),
        source: last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no candidate endpoints")
        }),
    })
}
