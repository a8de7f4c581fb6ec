//! Listener setup and lifecycle.
//!
//! # Responsibilities
//! - Bind the configured address, plaintext or TLS
//! - Serve the dispatch router indefinitely on a background task
//! - Expose the active TLS trust anchor to introspection callers
//! - Coordinate graceful shutdown with an in-flight serve loop
//!
//! The serve calls return `Ok(())` only when the listener was closed by an
//! explicit [`Server::shutdown`]; that is the closed sentinel owners must
//! treat as expected. Every other return is a genuine setup or transport
//! failure.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use axum_server::Handle;
use axum::Router;
use thiserror::Error;

use crate::config::{MuxConfig, ReadinessConfig};
use crate::http::dispatch;
use crate::net::{self, TlsContext};

/// How long in-flight exchanges may drain before shutdown aborts them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Error type for server setup and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid bind address {addr:?}: {source}")]
    Address {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("invalid TLS material: {0}")]
    InvalidTlsMaterial(std::io::Error),

    #[error("server is already serving")]
    AlreadyServing,

    #[error("transport failure while serving: {0}")]
    Serve(std::io::Error),
}

/// Long-lived owner of the listening socket and dispatch configuration.
///
/// At most one of {cleartext listener, TLS listener} is active per instance;
/// a second serve call is rejected with [`ServerError::AlreadyServing`]. The
/// TLS context is the only cross-task shared mutable state: it is written
/// once during secure setup and read thereafter by the readiness gate and
/// introspection callers, always under the mutex.
pub struct Server {
    addr: SocketAddr,
    readiness: ReadinessConfig,
    router: Router,
    handle: Handle,
    tls: Mutex<Option<TlsContext>>,
    serving: AtomicBool,
}

impl Server {
    /// Create a server from configuration. Does not bind anything yet.
    pub fn new(config: &MuxConfig) -> Result<Self, ServerError> {
        let addr = config
            .listener
            .bind_address
            .parse()
            .map_err(|source| ServerError::Address {
                addr: config.listener.bind_address.clone(),
                source,
            })?;

        Ok(Self {
            addr,
            readiness: config.readiness.clone(),
            router: dispatch::router(),
            handle: Handle::new(),
            tls: Mutex::new(None),
            serving: AtomicBool::new(false),
        })
    }

    /// Bind the address as a plain TCP listener and serve indefinitely.
    ///
    /// Cleartext HTTP/2 (h2c prior knowledge) and HTTP/1.1 are both accepted
    /// on the same port. Returns `Ok(())` once [`Server::shutdown`] closes
    /// the listener.
    pub async fn serve(&self) -> Result<(), ServerError> {
        self.begin_serving()?;

        let listener = {
            let _guard = self.tls.lock().expect("tls context mutex poisoned");
            net::listener::bind(self.addr)
        }
        .map_err(|source| {
            self.abort_setup();
            ServerError::Bind {
                addr: self.addr,
                source,
            }
        })?;

        axum_server::from_tcp(listener)
            .handle(self.handle.clone())
            .serve(self.router.clone().into_make_service())
            .await
            .map_err(ServerError::Serve)
    }

    /// Derive TLS settings from the PEM pair, then bind and serve over TLS.
    ///
    /// The TLS context is stored under the mutex before the listener starts
    /// accepting, so the readiness gate observes it on its next probe. ALPN
    /// offers h2 and http/1.1. Returns `Ok(())` once [`Server::shutdown`]
    /// closes the listener.
    pub async fn serve_secure(&self, cert_pem: &[u8], key_pem: &[u8]) -> Result<(), ServerError> {
        self.begin_serving()?;

        let tls = TlsContext::from_pem(cert_pem, key_pem)
            .await
            .map_err(|source| {
                self.abort_setup();
                ServerError::InvalidTlsMaterial(source)
            })?;
        let rustls_config = tls.config();

        let listener = {
            let mut guard = self.tls.lock().expect("tls context mutex poisoned");
            *guard = Some(tls);
            net::listener::bind(self.addr)
        }
        .map_err(|source| {
            self.abort_setup();
            ServerError::Bind {
                addr: self.addr,
                source,
            }
        })?;

        axum_server::from_tcp_rustls(listener, rustls_config)
            .handle(self.handle.clone())
            .serve(self.router.clone().into_make_service())
            .await
            .map_err(ServerError::Serve)
    }

    /// Stop accepting new exchanges and drain in-flight ones.
    ///
    /// Idempotent and safe to call concurrently with an in-progress serve
    /// loop, or after serve has already exited. Connections still open after
    /// the grace period are aborted.
    pub fn shutdown(&self) {
        tracing::info!("shutdown requested");
        self.handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    }

    /// The address this server binds.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Interval between readiness probes.
    pub fn tick_interval(&self) -> Duration {
        self.readiness.tick_interval()
    }

    /// Configured startup deadline.
    pub fn startup_timeout(&self) -> Duration {
        self.readiness.startup_timeout()
    }

    /// The active TLS trust anchor, if a TLS listener has been established.
    ///
    /// Mutex-guarded read; `None` while serving cleartext.
    pub fn tls_trust_anchor(&self) -> Option<Vec<u8>> {
        self.tls
            .lock()
            .expect("tls context mutex poisoned")
            .as_ref()
            .map(|tls| tls.trust_anchor().to_vec())
    }

    fn begin_serving(&self) -> Result<(), ServerError> {
        if self
            .serving
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ServerError::AlreadyServing);
        }
        Ok(())
    }

    /// Roll back a failed setup so the server is not left partially serving.
    fn abort_setup(&self) {
        if let Ok(mut guard) = self.tls.lock() {
            *guard = None;
        }
        self.serving.store(false, Ordering::SeqCst);
    }
}

impl Drop for Server {
    /// An abandoned server must not strand its listener.
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_bind_address() {
        let mut config = MuxConfig::default();
        config.listener.bind_address = "nope".to_string();

        assert!(matches!(
            Server::new(&config),
            Err(ServerError::Address { .. })
        ));
    }

    #[tokio::test]
    async fn serve_secure_rejects_bad_material_without_marking_serving() {
        let server = Server::new(&MuxConfig::default()).unwrap();

        let result = server.serve_secure(b"garbage", b"garbage").await;
        assert!(matches!(result, Err(ServerError::InvalidTlsMaterial(_))));

        // Setup failure must fully roll back: no TLS context, not serving.
        assert!(server.tls_trust_anchor().is_none());
        assert!(!server.serving.load(Ordering::SeqCst));
    }
}
