//! CLI command implementations
//!
//! Boot sequence for `serve`: load config, open the transaction logger
//! and store, then hand the store to the HTTP server inside a fresh
//! tokio runtime. `init` only touches the config file.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::kvstore::KvStore;
use crate::observability::Logger;
use crate::txnlog::JsonLinesTxnLogger;

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Dispatches a parsed command.
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
    }
}

/// Writes a default config file, refusing to overwrite an existing one.
fn init(config_path: &Path) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(format!(
            "config file already exists at {}",
            config_path.display()
        )));
    }

    let config = AppConfig::default();
    let content = serde_json::to_string_pretty(&config)
        .map_err(|err| CliError::config_error(format!("failed to render config: {err}")))?;
    fs::write(config_path, content).map_err(|err| {
        CliError::io_error(format!(
            "failed to write config file {}: {err}",
            config_path.display()
        ))
    })?;

    Logger::info(
        "CONFIG_INITIALIZED",
        &[("path", &config_path.display().to_string())],
    );
    Ok(())
}

/// Opens the store and serves HTTP until the process is stopped.
fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = AppConfig::load(config_path)
        .map_err(|err| CliError::config_error(err.to_string()))?;
    if let Some(port) = port {
        config.port = port;
    }

    let logger = Arc::new(JsonLinesTxnLogger::for_db_path(&config.db_path));
    let txn_log_path = logger.active_path().display().to_string();
    let store = KvStore::open(&config.db_path, logger)
        .map_err(|err| CliError::boot_failed(format!("failed to open store: {err}")))?;

    Logger::info(
        "SERVER_STARTING",
        &[
            ("addr", &config.socket_addr()),
            ("db_path", &config.db_path.display().to_string()),
            ("txn_log", &txn_log_path),
        ],
    );

    let server = HttpServer::new(Arc::new(store), HttpServerConfig::from_app(&config));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|err| CliError::boot_failed(format!("failed to create tokio runtime: {err}")))?;
    rt.block_on(server.start())
        .map_err(|err| CliError::boot_failed(format!("server exited with error: {err}")))
}
