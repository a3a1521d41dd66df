//! Error types for sqlrun.
//!
//! Defines the main error enum used throughout the application.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for sqlrun operations.
#[derive(Error, Debug)]
pub enum SqlRunError {
    /// The script directory is missing, not a directory, or unreadable.
    #[error("Script directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Database connection errors (host unreachable, auth failed, connection lost, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database rejected a statement. Carries no script path; the batch
    /// executor turns it into [`SqlRunError::Execution`].
    #[error("Query error: {0}")]
    Query(String),

    /// A script was rejected by the database (syntax errors, constraint violations, etc.)
    #[error("Execution error in {}: {message}", .path.display())]
    Execution { path: PathBuf, message: String },

    /// A script file could not be read.
    #[error("Cannot read {}: {message}", .path.display())]
    ScriptRead { path: PathBuf, message: String },

    /// An output artifact could not be written.
    #[error("Cannot write {}: {message}", .path.display())]
    OutputWrite { path: PathBuf, message: String },

    /// Configuration errors (invalid config file, unknown instance, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operator console errors (closed stdin, broken terminal).
    #[error("Console error: {0}")]
    Io(String),
}

impl SqlRunError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an execution error for the given script.
    pub fn execution(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::Execution {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Creates a read error for the given script.
    pub fn script_read(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::ScriptRead {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Creates a write error for the given artifact.
    pub fn output_write(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::OutputWrite {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a console error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::DirectoryNotFound(_) => "Directory Not Found",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Execution { .. } => "Execution Fault",
            Self::ScriptRead { .. } => "Script Read Error",
            Self::OutputWrite { .. } => "Output Write Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "Console Error",
        }
    }

    /// Returns true for errors that are confined to a single script file.
    ///
    /// Everything else ends the run.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::Query(_)
                | Self::Execution { .. }
                | Self::ScriptRead { .. }
                | Self::OutputWrite { .. }
        )
    }
}

/// Result type alias using SqlRunError.
pub type Result<T> = std::result::Result<T, SqlRunError>;
