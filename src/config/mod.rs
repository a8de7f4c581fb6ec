//! Configuration for the multiplexer.

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, MuxConfig, ReadinessConfig, TlsConfig};
