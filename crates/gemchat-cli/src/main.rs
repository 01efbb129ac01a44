mod cli;
mod logging;

use std::process::ExitCode;

fn main() -> ExitCode {
    // Dropped on return, after the last log line, so buffered lines get written.
    let _log_guard = logging::init();
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            eprintln!("{e:#}"); // pretty anyhow chain
            ExitCode::FAILURE
        }
    }
}
