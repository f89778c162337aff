//! HTTP bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP port for the REST bridge.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Seconds a bridged request waits for the engine reply.
    #[serde(default = "default_bridge_timeout_secs")]
    pub bridge_timeout_secs: u64,
}

impl ServerConfig {
    /// Reply timeout of the command bridge.
    #[must_use]
    pub const fn bridge_timeout(&self) -> Duration {
        Duration::from_secs(self.bridge_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            bind_address: default_bind_address(),
            bridge_timeout_secs: default_bridge_timeout_secs(),
        }
    }
}

pub(crate) const fn default_http_port() -> u16 {
    8080
}

pub(crate) fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

pub(crate) const fn default_bridge_timeout_secs() -> u64 {
    10
}
