//! coffer CLI entry point
//!
//! Parses arguments and dispatches to the CLI layer; subsystems are
//! never called from here.

use std::process::ExitCode;

use coffer::cli::{run_command, Cli, CliError};

fn main() -> ExitCode {
    match run_command(Cli::parse_args().command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

/// Renders a CLI failure as a single JSON object on stderr.
fn report_failure(err: &CliError) {
    eprintln!(
        "{}",
        serde_json::json!({
            "status": "error",
            "code": err.code_str(),
            "message": err.message(),
        })
    );
}
