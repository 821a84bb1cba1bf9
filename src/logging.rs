//! Tracing subscriber setup.
//!
//! Console commands log to stderr. The TUI owns the terminal, so it logs to a
//! file instead.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::error::AppError;

pub const TUI_LOG_FILE: &str = "compras-dash.log";

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

/// `RUST_LOG` wins; otherwise `info` for this crate, `debug` with `-v`.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "compras_dash=debug" } else { "compras_dash=info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(target: LogTarget<'_>, verbose: bool) -> Result<(), AppError> {
    let builder = fmt().with_env_filter(env_filter(verbose)).with_target(false);

    let result = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::new(2, format!("Failed to open log file '{}': {e}", path.display())))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "subscriber already installed");
    }
    Ok(())
}
