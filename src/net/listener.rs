//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind the configured address eagerly so setup failures (port in use,
//!   bad address) surface synchronously, not from inside the serve loop.

use std::net::{SocketAddr, TcpListener};

/// Bind `addr` as a plain TCP listener in nonblocking mode.
pub fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;

    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "listener bound");

    Ok(listener)
}
