//! Configuration management for sqlrun.
//!
//! Loads optional defaults from a TOML file and resolves them, together with
//! command-line overrides and environment variables, into the immutable
//! [`RunConfig`] every component receives.

use crate::error::{Result, SqlRunError};
use crate::operator::Operator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Output artifact format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Delimited text with a header row.
    #[default]
    Csv,
    /// Fixed-width human-readable table.
    Table,
}

impl OutputFormat {
    /// Returns the format name as used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Table => "table",
        }
    }

    /// Returns the artifact file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Table => "txt",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "table" => Ok(Self::Table),
            _ => Err(format!("Invalid output format: {s}. Expected: csv or table")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the batch does after a single script fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Report the failure and move on to the next script.
    #[default]
    Continue,
    /// Stop the batch at the first failing script.
    Abort,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Abort => "abort",
        }
    }
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            _ => Err(format!("Invalid error policy: {s}. Expected: continue or abort")),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the runner authenticates against the server.
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectionAuth {
    /// The host's identity, as resolved by the driver (OS user, PGUSER, PGPASSWORD, .pgpass).
    Integrated,
    /// Explicit username and password, prompted from the operator.
    Credentials { username: String, password: String },
}

impl ConnectionAuth {
    /// Returns a display-safe description (no password).
    pub fn describe(&self) -> String {
        match self {
            Self::Integrated => "integrated".to_string(),
            Self::Credentials { username, .. } => format!("credentials ({username})"),
        }
    }

    /// Returns the explicit username, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Integrated => None,
            Self::Credentials { username, .. } => Some(username),
        }
    }
}

impl fmt::Debug for ConnectionAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integrated => f.write_str("Integrated"),
            Self::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .field("password", &"********")
                .finish(),
        }
    }
}

/// Where the scripts are executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// Server host name or address.
    pub server: String,
    /// Instance name from `host\instance`, if given.
    pub instance: Option<String>,
    /// TCP port the instance listens on.
    pub port: u16,
    /// Database name.
    pub database: String,
}

impl ConnectionTarget {
    /// Returns the server as the operator typed it (`host` or `host\instance`).
    pub fn server_display(&self) -> String {
        match &self.instance {
            Some(instance) => format!("{}\\{}", self.server, instance),
            None => self.server.clone(),
        }
    }

    /// Returns a display-safe string for UI purposes.
    pub fn display_string(&self) -> String {
        format!("{} @ {}:{}", self.database, self.server_display(), self.port)
    }

    /// Names server, instance, port, database and user, but never the password.
    pub fn summary(&self, auth: &ConnectionAuth) -> String {
        let user = auth.username().unwrap_or("integrated identity");
        format!("{} as {}", self.display_string(), user)
    }
}

/// Immutable settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub script_dir: PathBuf,
    pub target: ConnectionTarget,
    pub auth: ConnectionAuth,
    pub format: OutputFormat,
    pub on_error: ErrorPolicy,
    /// Per-script execution timeout. `None` leaves the driver defaults in place.
    pub query_timeout: Option<Duration>,
}

impl RunConfig {
    /// Returns a display-safe description of the connection (no password).
    pub fn connection_summary(&self) -> String {
        self.target.summary(&self.auth)
    }
}

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub script_dir: PathBuf,
    pub server: String,
    pub database: String,
    pub port: Option<u16>,
    pub format: Option<OutputFormat>,
    pub on_error: Option<ErrorPolicy>,
    pub query_timeout_secs: Option<u64>,
    pub credentials: bool,
    pub user: Option<String>,
}

/// Contents of the optional TOML config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Defaults applied when the command line leaves a value out.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named instances mapped to the port they listen on.
    #[serde(default)]
    pub instances: HashMap<String, u16>,
}

/// The `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Defaults {
    pub port: Option<u16>,
    pub format: Option<OutputFormat>,
    pub on_error: Option<ErrorPolicy>,
    pub query_timeout_secs: Option<u64>,
    /// Username offered in credential mode.
    pub user: Option<String>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlrun")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SqlRunError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            SqlRunError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Resolves the port for a named or numeric instance.
    fn instance_port(&self, instance: &str) -> Result<u16> {
        if let Ok(port) = instance.parse::<u16>() {
            return Ok(port);
        }
        self.instances.get(instance).copied().ok_or_else(|| {
            SqlRunError::config(format!(
                "Unknown instance '{instance}'. Add it to the [instances] table of the config file"
            ))
        })
    }
}

/// Splits `host\instance` into its parts.
pub fn parse_server(server: &str) -> Result<(String, Option<String>)> {
    let (host, instance) = match server.split_once('\\') {
        Some((host, instance)) => (host.trim(), Some(instance.trim())),
        None => (server.trim(), None),
    };

    if host.is_empty() {
        return Err(SqlRunError::config(format!(
            "Invalid server '{server}'. Expected host or host\\instance"
        )));
    }
    if let Some(instance) = instance {
        if instance.is_empty() || instance.contains('\\') {
            return Err(SqlRunError::config(format!(
                "Invalid instance in server '{server}'"
            )));
        }
    }

    Ok((host.to_string(), instance.map(String::from)))
}

/// Builds the run configuration with precedence:
/// 1. Command-line values (highest)
/// 2. Config file `[defaults]`
/// 3. Environment variables (`PGPORT`)
/// 4. Built-in defaults
///
/// The authentication mode is resolved separately by [`resolve_auth`].
pub fn resolve(overrides: &Overrides, config: &Config, auth: ConnectionAuth) -> Result<RunConfig> {
    let (server, instance) = parse_server(&overrides.server)?;

    if overrides.database.trim().is_empty() {
        return Err(SqlRunError::config("Database name is required"));
    }

    let port = match &instance {
        Some(name) => {
            let port = config.instance_port(name)?;
            if let Some(explicit) = overrides.port {
                if explicit != port {
                    return Err(SqlRunError::config(format!(
                        "Instance '{name}' listens on port {port}, but --port {explicit} was given"
                    )));
                }
            }
            port
        }
        None => overrides
            .port
            .or(config.defaults.port)
            .or_else(env_port)
            .unwrap_or(DEFAULT_PORT),
    };

    let query_timeout = overrides
        .query_timeout_secs
        .or(config.defaults.query_timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    Ok(RunConfig {
        script_dir: overrides.script_dir.clone(),
        target: ConnectionTarget {
            server,
            instance,
            port,
            database: overrides.database.trim().to_string(),
        },
        auth,
        format: overrides
            .format
            .or(config.defaults.format)
            .unwrap_or_default(),
        on_error: overrides
            .on_error
            .or(config.defaults.on_error)
            .unwrap_or_default(),
        query_timeout,
    })
}

/// Resolves the authentication mode, prompting the operator in credential mode.
pub fn resolve_auth(
    overrides: &Overrides,
    config: &Config,
    operator: &mut dyn Operator,
) -> Result<ConnectionAuth> {
    if !overrides.credentials {
        return Ok(ConnectionAuth::Integrated);
    }

    let preset = overrides.user.clone().or_else(|| config.defaults.user.clone());
    let username = match preset {
        Some(user) => user,
        None => operator.prompt("Username: ")?.trim().to_string(),
    };
    if username.is_empty() {
        return Err(SqlRunError::config("A username is required in credential mode"));
    }

    let password = operator.prompt_secret(&format!("Password for {username}: "))?;

    Ok(ConnectionAuth::Credentials { username, password })
}

fn env_port() -> Option<u16> {
    std::env::var("PGPORT").ok().and_then(|p| p.parse().ok())
}
