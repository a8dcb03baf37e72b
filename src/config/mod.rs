//! Service configuration
//!
//! One JSON config file with serde-supplied defaults, overridable field
//! by field through `COFFER_*` environment variables. A missing config
//! file is not an error; every field has a usable default.

use std::env;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path of the SQLite database file. The transaction log lives next
    /// to it as `<db-path-without-extension>.txn.log`.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Host to bind the HTTP server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the HTTP server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on every /kv request. `None` disables auth.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Largest accepted value payload in bytes.
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,

    /// CORS allowed origins. Empty means allow any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./coffer.sqlite")
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            auth_token: None,
            max_value_bytes: default_max_value_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, then applies environment
    /// overrides. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|err| {
                ConfigError::new(format!("failed to read config file {}", path.display()), err)
            })?;
            serde_json::from_str(&content).map_err(|err| {
                ConfigError::new(format!("invalid config file {}", path.display()), err)
            })?
        } else {
            Self::default()
        };
        config.apply_env_from(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `COFFER_*` overrides supplied by `lookup`.
    fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup("COFFER_DB_PATH") {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(host) = lookup("COFFER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("COFFER_PORT") {
            self.port = port.parse().map_err(|err| {
                ConfigError::new(format!("invalid COFFER_PORT value {port:?}"), err)
            })?;
        }
        if let Some(token) = lookup("COFFER_AUTH_TOKEN") {
            self.auth_token = if token.is_empty() { None } else { Some(token) };
        }
        if let Some(max) = lookup("COFFER_MAX_VALUE_BYTES") {
            self.max_value_bytes = max.parse().map_err(|err| {
                ConfigError::new(format!("invalid COFFER_MAX_VALUE_BYTES value {max:?}"), err)
            })?;
        }
        Ok(())
    }

    /// Socket address string for the HTTP listener.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration loading or parsing failure.
#[derive(Debug)]
pub struct ConfigError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ConfigError {
    fn new(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref source) = self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, Path::new("./coffer.sqlite"));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7070);
        assert!(config.auth_token.is_none());
        assert_eq!(config.max_value_bytes, 1024 * 1024);
        assert_eq!(config.socket_addr(), "127.0.0.1:7070");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.port, 7070);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coffer.json");
        fs::write(&path, r#"{"port": 9090, "auth_token": "secret"}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coffer.json");
        fs::write(&path, "{not json").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env_from(|key| match key {
                "COFFER_DB_PATH" => Some("/data/store.sqlite".to_string()),
                "COFFER_PORT" => Some("8081".to_string()),
                "COFFER_AUTH_TOKEN" => Some("tok".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.db_path, Path::new("/data/store.sqlite"));
        assert_eq!(config.port, 8081);
        assert_eq!(config.auth_token.as_deref(), Some("tok"));
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_empty_token_override_disables_auth() {
        let mut config = AppConfig {
            auth_token: Some("configured".to_string()),
            ..AppConfig::default()
        };
        config
            .apply_env_from(|key| {
                (key == "COFFER_AUTH_TOKEN").then(String::new)
            })
            .unwrap();
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_invalid_port_override_is_an_error() {
        let mut config = AppConfig::default();
        let result =
            config.apply_env_from(|key| (key == "COFFER_PORT").then(|| "not-a-port".to_string()));
        assert!(result.is_err());
    }
}
