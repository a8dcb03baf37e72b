//! HTTP server configuration

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Configuration for the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 7070)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on /kv routes; `None` disables auth
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Largest accepted value payload in bytes
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7070
}

fn default_max_value_bytes() -> usize {
    1024 * 1024
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_token: None,
            max_value_bytes: default_max_value_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpServerConfig {
    /// Extracts the HTTP-facing subset of the service configuration.
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            auth_token: config.auth_token.clone(),
            max_value_bytes: config.max_value_bytes,
            cors_origins: config.cors_origins.clone(),
        }
    }

    /// Socket address string for the listener.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
