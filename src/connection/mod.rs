//! Connection management
//!
//! This module handles:
//! * Candidate-endpoint establishment with partial-failure recovery
//! * Transport abstraction (plain TCP vs TLS-layered)
//! * The sticky status multiplexer shared by both layers
//! * TLS configuration and the injected socket/TLS capability

pub(crate) mod establish;
mod net;
pub mod status;
mod tls;
mod transport;

pub use net::{Net, SystemNet};
#[cfg(test)]
pub(crate) use tls::TEST_CA_PEM;
pub use status::{Probe, Status};
pub use tls::{parse_server_name, TlsConfig, TlsConfigBuilder, TlsConfigError};
pub use transport::{Transport, Wire};
