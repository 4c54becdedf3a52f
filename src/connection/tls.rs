//! TLS configuration for secured client sessions.
//!
//! TLS is recommended for all non-local connections to prevent credential
//! interception on protocols that authenticate in cleartext (SMTP AUTH,
//! IMAP LOGIN, and friends).

use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls_pemfile::Item;
use std::fs;
use std::io;
use std::sync::Arc;

/// TLS configuration for secured connections.
///
/// By default, server certificates are validated against the system root
/// store. A custom CA may be supplied for servers with private PKI.
///
/// # Examples
///
/// ```ignore
/// use linewire::TlsConfig;
///
/// // System root certificates (production)
/// let tls = TlsConfig::builder().build()?;
///
/// // Custom CA certificate
/// let tls = TlsConfig::builder()
///     .ca_cert_path("/path/to/ca.pem")
///     .build()?;
/// ```
#[derive(Clone)]
pub struct TlsConfig {
    /// Path to CA certificate file (None = system roots)
    ca_cert_path: Option<String>,
    /// Compiled rustls ClientConfig
    client_config: Arc<ClientConfig>,
}

impl TlsConfig {
    /// Create a new TLS configuration builder
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }

    /// Get the rustls `ClientConfig` for this TLS configuration
    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("ca_cert_path", &self.ca_cert_path)
            .field("client_config", &"<ClientConfig>")
            .finish()
    }
}

/// Builder for TLS configuration
#[derive(Default)]
pub struct TlsConfigBuilder {
    ca_cert_path: Option<String>,
}

/// Errors raised while assembling a TLS configuration
#[derive(Debug, thiserror::Error)]
pub enum TlsConfigError {
    /// The CA certificate file could not be read
    #[error("failed to read CA certificate file '{path}'")]
    CaRead {
        /// Path that was attempted
        path: String,
        /// Underlying filesystem error
        #[source]
        source: io::Error,
    },

    /// The CA certificate file held no parseable certificate
    #[error("no valid certificates found in '{0}'")]
    CaEmpty(String),

    /// No usable root certificate could be loaded from the system store
    #[error("failed to load any system root certificates")]
    NoSystemRoots,
}

impl TlsConfigBuilder {
    /// Set the path to a custom CA certificate file (PEM format).
    ///
    /// If not set, system root certificates will be used.
    pub fn ca_cert_path(mut self, path: impl Into<String>) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    /// Build the TLS configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA file cannot be read or parsed, or if no
    /// system root certificate could be loaded.
    pub fn build(self) -> Result<TlsConfig, TlsConfigError> {
        let root_store = if let Some(ca_path) = &self.ca_cert_path {
            load_custom_ca(ca_path)?
        } else {
            // System root certificates via rustls-native-certs. Individual
            // parse errors are tolerated as long as something loaded.
            let result = rustls_native_certs::load_native_certs();

            let mut store = RootCertStore::empty();
            for cert in result.certs {
                let _ = store.add_parsable_certificates(std::iter::once(cert));
            }

            if store.is_empty() {
                return Err(TlsConfigError::NoSystemRoots);
            }

            store
        };

        let client_config = Arc::new(
            ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );

        Ok(TlsConfig {
            ca_cert_path: self.ca_cert_path,
            client_config,
        })
    }
}

/// Load a custom CA certificate from a PEM file
fn load_custom_ca(ca_path: &str) -> Result<RootCertStore, TlsConfigError> {
    let ca_cert_data = fs::read(ca_path).map_err(|e| TlsConfigError::CaRead {
        path: ca_path.to_string(),
        source: e,
    })?;

    let mut reader = io::Cursor::new(&ca_cert_data);
    let mut root_store = RootCertStore::empty();
    let mut found_certs = 0;

    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(Item::X509Certificate(cert))) => {
                let _ = root_store.add_parsable_certificates(std::iter::once(cert));
                found_certs += 1;
            }
            Ok(Some(_)) => {
                // Skip non-certificate items (private keys, etc.)
            }
            Ok(None) => break,
            Err(_) => {
                return Err(TlsConfigError::CaEmpty(ca_path.to_string()));
            }
        }
    }

    if found_certs == 0 {
        return Err(TlsConfigError::CaEmpty(ca_path.to_string()));
    }

    Ok(root_store)
}

/// Parse a server name for TLS SNI (Server Name Indication).
///
/// Strips a trailing dot and rejects names that cannot appear in a
/// certificate.
pub fn parse_server_name(hostname: &str) -> io::Result<String> {
    let hostname = hostname.trim_end_matches('.');

    if hostname.is_empty() || hostname.len() > 253 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid hostname for TLS: '{}'", hostname),
        ));
    }

    if !hostname
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '.' || c == ':')
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid hostname for TLS: '{}'", hostname),
        ));
    }

    Ok(hostname.to_string())
}

/// Self-signed CA for tests that need a deterministic root store
#[cfg(test)]
pub(crate) const TEST_CA_PEM: &str = "-----BEGIN CERTIFICATE-----
MIIBizCCATGgAwIBAgIUKfKOm5eyGhAv4QBfJW7RaG3X8McwCgYIKoZIzj0EAwIw
GzEZMBcGA1UEAwwQbGluZXdpcmUgdGVzdCBDQTAeFw0yNjA4MjUxNzU5NTRaFw00
NjA4MjAxNzU5NTRaMBsxGTAXBgNVBAMMEGxpbmV3aXJlIHRlc3QgQ0EwWTATBgcq
hkjOPQIBBggqhkjOPQMBBwNCAATuF/q70ikqxBatw0N3oVrv+/voNtSYiuSSpEyR
CY/9k3/S4kWKObda/qbjcwazwQ//rJCmsziIdodiYd2tSQDpo1MwUTAdBgNVHQ4E
FgQUb8vTEoDwqh0tpX6C4w9JwFwxP64wHwYDVR0jBBgwFoAUb8vTEoDwqh0tpX6C
4w9JwFwxP64wDwYDVR0TAQH/BAUwAwEB/zAKBggqhkjOPQQDAgNIADBFAiEA3xRZ
PNPRJymndU6zd3EfY/wDS2t7eaz8HRQXH2+Kq+YCICO+tR0lyE2DU36Q+oCZR9rd
1ysXMX2KGhkHHCNfg4ZV
-----END CERTIFICATE-----
";
