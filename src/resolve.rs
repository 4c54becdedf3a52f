//! Address resolution capability
//!
//! Resolution is injected into the connection establisher as a trait rather
//! than reached for ambiently, so the candidate-iteration logic can be
//! exercised against scripted address lists in tests.

use std::io;
use std::net::SocketAddr;

/// Resolves a hostname/port pair to an ordered list of candidate endpoints.
///
/// The returned order is significant: the establisher attempts candidates
/// front to back and stops at the first successful connect. The port is
/// numeric by construction (`u16`), so symbolic service names are rejected at
/// the type level.
#[allow(async_fn_in_trait)]
pub trait Resolver {
    /// Resolve `host:port` to stream-socket candidates.
    ///
    /// An empty list and an `Err` are both treated as resolution failure by
    /// the caller.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;
}

/// System resolver backed by `tokio::net::lookup_host`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?.collect();
        Ok(addrs)
    }
}
