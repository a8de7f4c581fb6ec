//! Startup readiness gate.
//!
//! # Responsibilities
//! - Poll the liveness path at a fixed sub-timeout interval
//! - Match the probe transport to the listener (plain HTTP, or TLS trusting
//!   exactly the server's own certificate)
//! - Report success, a distinct timeout error, or a fatal client error
//!
//! The gate runs on the calling task and blocks only that task. It probes
//! the liveness path alone, never the RPC engine: a wedged RPC handler with
//! a healthy liveness path is reported as ready.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Certificate, StatusCode};
use thiserror::Error;
use tokio::time::{interval, timeout_at, Instant, MissedTickBehavior};

use crate::http::{Server, HEALTH_PATH};

/// Error type for the readiness gate.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// The deadline elapsed with no successful probe. Recoverable: callers
    /// may retry setup or abort startup.
    #[error("timed out after {0:?} before the server passed its health check")]
    Timeout(Duration),

    /// Probe client construction failed (e.g., malformed trust material).
    /// Fatal; never masked as a timeout.
    #[error("failed to construct health probe client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Block until `server` answers its liveness probe, or until `timeout`.
///
/// The probe interval is `min(tick interval, timeout)`, so a very small
/// timeout still yields at least one probe. The TLS trust anchor is re-read
/// from the server on every tick: a gate started before `serve_secure` has
/// stored its context simply fails a few cleartext probes and then follows
/// the listener onto TLS.
pub async fn block_until_ready(server: &Server, timeout: Duration) -> Result<(), ReadinessError> {
    // interval() panics on a zero period; clamp for degenerate timeouts.
    let tick = server
        .tick_interval()
        .min(timeout)
        .max(Duration::from_millis(1));
    let deadline = Instant::now() + timeout;

    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if timeout_at(deadline, ticker.tick()).await.is_err() {
            return Err(ReadinessError::Timeout(timeout));
        }

        match timeout_at(deadline, probe(server.local_addr(), server.tls_trust_anchor())).await {
            Ok(ready) => {
                if ready? {
                    return Ok(());
                }
            }
            Err(_) => return Err(ReadinessError::Timeout(timeout)),
        }
    }
}

/// Issue one GET against the liveness path.
///
/// Only an exact 200 counts as ready. Any other status or transport error is
/// "not ready yet"; only client construction errors propagate.
async fn probe(addr: SocketAddr, trust_anchor: Option<Vec<u8>>) -> Result<bool, ReadinessError> {
    let (scheme, client) = match trust_anchor {
        Some(pem) => {
            let anchor = Certificate::from_pem(&pem)?;
            let client = reqwest::Client::builder()
                .use_rustls_tls()
                .add_root_certificate(anchor)
                .build()?;
            ("https", client)
        }
        None => ("http", reqwest::Client::builder().build()?),
    };

    let url = format!("{scheme}://{addr}{HEALTH_PATH}");
    match client.get(&url).send().await {
        Ok(response) => Ok(response.status() == StatusCode::OK),
        Err(err) => {
            tracing::trace!(error = %err, "liveness probe not ready");
            Ok(false)
        }
    }
}
