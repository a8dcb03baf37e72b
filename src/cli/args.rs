//! CLI argument definitions using clap
//!
//! Commands:
//! - coffer init --config <path>
//! - coffer serve --config <path> [--port <port>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// coffer - a small, self-hosted, typed key-value service
#[derive(Parser, Debug)]
#[command(name = "coffer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse arguments from the process environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init {
        /// Path of the configuration file to create
        #[arg(long, default_value = "./coffer.json")]
        config: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to the configuration file
        #[arg(long, default_value = "./coffer.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_parses_with_defaults() {
        let cli = Cli::try_parse_from(["coffer", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("./coffer.json"));
                assert!(port.is_none());
            }
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn test_serve_accepts_port_override() {
        let cli = Cli::try_parse_from(["coffer", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Command::Serve { port, .. } => assert_eq!(port, Some(9000)),
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn test_init_parses() {
        let cli = Cli::try_parse_from(["coffer", "init", "--config", "/tmp/c.json"]).unwrap();
        match cli.command {
            Command::Init { config } => assert_eq!(config, PathBuf::from("/tmp/c.json")),
            _ => panic!("expected init command"),
        }
    }
}
