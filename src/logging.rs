//! Logging configuration for sqlrun.
//!
//! Logs go to stderr so they never mix with the progress lines on stdout, or
//! to a file when `--log-file` is given. `RUST_LOG` overrides the verbosity flag.

use crate::error::{Result, SqlRunError};
use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Returns the default filter directive for a `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to a file, truncated on each run.
pub fn init_file_logging(path: &Path, verbosity: u8) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            SqlRunError::config(format!("Could not create log directory: {e}"))
        })?;
    }

    let log_file = File::create(path)
        .map_err(|e| SqlRunError::config(format!("Could not create log file: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(log_file)
        .with_ansi(false) // No ANSI colors in file output
        .init();

    Ok(())
}
