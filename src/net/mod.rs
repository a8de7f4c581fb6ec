//! Network primitives: listener binding and TLS material handling.

pub mod listener;
pub mod tls;

pub use tls::TlsContext;
