//! Configuration loading from disk.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::MuxConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MuxConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: MuxConfig = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &MuxConfig) -> Result<(), ConfigError> {
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation(format!(
            "bind_address {:?} is not a host:port pair",
            config.listener.bind_address
        )));
    }

    if config.readiness.tick_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "tick_interval_ms must be nonzero".to_string(),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            return Err(ConfigError::Validation(
                "tls requires both cert_path and key_path".to_string(),
            ));
        }
    }

    Ok(())
}
