//! File logging.
//!
//! Logs go to `$GEMCHAT_HOME/logs/gemchat.log`, never to the terminal the
//! chat screen draws on. `GEMCHAT_LOG` takes an `EnvFilter` directive.

use std::fs;

use gemchat_core::config::paths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE: &str = "gemchat.log";
const FILTER_ENV: &str = "GEMCHAT_LOG";

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines get flushed.
///
/// Returns `None`, leaving logging off, when the log file cannot be opened.
pub fn init() -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let dir = paths::logs_dir();
    fs::create_dir_all(&dir).ok()?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(&dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(env_filter)
        .try_init()
        .ok()?;

    tracing::info!(path = %dir.join(LOG_FILE).display(), "logging initialized");
    Some(guard)
}
