//! # linewire
//!
//! Outbound TCP/TLS client transport for line-oriented protocols (SMTP, IMAP,
//! POP and friends). This crate owns the transport layer only: it resolves a
//! host/port to candidate endpoints, establishes a TCP connection, optionally
//! upgrades it to TLS, multiplexes one coherent status value across the plain
//! and secured layers, and releases every resource it acquired exactly once.
//! Command/reply framing stays with the protocol driver built on top.
//!
//! ## Quick start
//!
//! ```no_run
//! # async fn example() -> linewire::Result<()> {
//! use linewire::Client;
//!
//! let mut client = Client::connect("mail.example.com", 587).await?;
//!
//! // Read the greeting; the protocol driver on top interprets it.
//! let n = client.read_line().await?;
//! assert!(n > 0);
//!
//! client.write_all(b"STARTTLS\r\n").await?;
//! client.read_line().await?;
//! client.secure().await?;
//! client.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Status semantics
//!
//! [`Client::status`] is not a pure function of current transport health: it
//! returns the cached status while the active layer reports nothing new, and
//! latches to [`Status::Error`] permanently on any definite failure. See
//! [`connection::status`] for the exact rule.
//!
//! ## Capability injection
//!
//! DNS resolution ([`resolve::Resolver`]) and socket/TLS plumbing
//! ([`connection::Net`]) are traits with system-backed defaults, so the whole
//! connection lifecycle can run against in-memory fakes in tests.

pub mod client;
pub mod connection;
pub mod error;
pub mod resolve;

pub use client::{Client, READ_BUF_SIZE};
pub use connection::{Net, Probe, Status, SystemNet, TlsConfig, Transport, Wire};
pub use error::{ConnectError, Error, Result, SecureError};
pub use resolve::{Resolver, SystemResolver};
