//! TLS configuration and certificate material handling.

use std::io;
use std::sync::Once;

use axum_server::tls_rustls::RustlsConfig;

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the process-wide rustls crypto provider. Safe to call repeatedly.
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Materialized transport-encryption settings for an active TLS listener.
///
/// The public certificate bytes are retained alongside the derived rustls
/// config: that PEM block is the only trust anchor the readiness gate and
/// any verifying client may use.
#[derive(Clone)]
pub struct TlsContext {
    config: RustlsConfig,
    cert_pem: Vec<u8>,
}

impl TlsContext {
    /// Derive server TLS settings from an injected PEM certificate/key pair.
    ///
    /// The key material content is opaque to this crate; malformed PEM is
    /// reported as an error without touching the listener.
    pub async fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> io::Result<Self> {
        ensure_crypto_provider();

        let config = RustlsConfig::from_pem(cert_pem.to_vec(), key_pem.to_vec()).await?;

        Ok(Self {
            config,
            cert_pem: cert_pem.to_vec(),
        })
    }

    /// The derived rustls server configuration.
    pub fn config(&self) -> RustlsConfig {
        self.config.clone()
    }

    /// Public certificate bytes, usable as a client trust anchor.
    pub fn trust_anchor(&self) -> &[u8] {
        &self.cert_pem
    }
}
