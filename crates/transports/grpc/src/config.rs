//! Configuration for the inference client
//!
//! Configuration can be loaded from a TOML file and/or environment variables.
//!
//! A port of 0 selects the Unix domain socket at `host`. TOML has no null,
//! so a file must spell this as `port = 0`:
//!
//! ```toml
//! host = "unix:///run/tfserving.sock"
//! port = 0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Connection settings for a TensorFlow Serving endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Host name, or a socket path when `port` is unset
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port; `None` (or 0) selects a Unix domain socket at `host`
    #[serde(default = "default_port")]
    pub port: Option<u16>,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> Option<u16> {
    Some(8500) // TensorFlow Serving gRPC port
}

fn default_timeout_ms() -> u64 {
    3000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Per-call timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        let mut config: ClientConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.port = config.port.filter(|&p| p != 0);
        Ok(config)
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = ClientConfig::default();

        if let Ok(host) = std::env::var("TFSERVING_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("TFSERVING_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                config.port = Some(p).filter(|&p| p != 0);
            }
        }
        if let Ok(timeout) = std::env::var("TFSERVING_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                config.timeout_ms = t;
            }
        }

        config
    }

    /// Load configuration from file if it exists, otherwise from environment
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        if let Some(p) = path {
            if p.as_ref().exists() {
                return Self::from_file(p);
            }
        }
        Ok(Self::from_env())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
