//! Command-line argument parsing for sqlrun.

use crate::config::{ErrorPolicy, OutputFormat, Overrides};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Run every .sql script in a directory and write each result set next to its script.
#[derive(Parser, Debug)]
#[command(name = "sqlrun")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the .sql scripts
    #[arg(value_name = "SCRIPT_DIR")]
    pub script_dir: PathBuf,

    /// Server to connect to: host or host\instance
    #[arg(short = 'S', long, value_name = "SERVER")]
    pub server: String,

    /// Database name
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: String,

    /// Artifact format: csv or table
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Prompt for a username and password instead of using the integrated identity
    #[arg(short = 'C', long)]
    pub credentials: bool,

    /// Username for --credentials (prompted when omitted)
    #[arg(short = 'U', long, value_name = "USER", requires = "credentials")]
    pub user: Option<String>,

    /// Database port
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// What to do after a script fails: continue or abort
    #[arg(long, value_name = "POLICY")]
    pub on_error: Option<ErrorPolicy>,

    /// Per-script timeout in seconds (none by default)
    #[arg(long, value_name = "SECS")]
    pub query_timeout: Option<u64>,

    /// Config file path
    #[arg(long, value_name = "PATH", env = "SQLRUN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Converts CLI arguments to configuration overrides.
    pub fn to_overrides(&self) -> Overrides {
        Overrides {
            script_dir: self.script_dir.clone(),
            server: self.server.clone(),
            database: self.database.clone(),
            port: self.port,
            format: self.format,
            on_error: self.on_error,
            query_timeout_secs: self.query_timeout,
            credentials: self.credentials,
            user: self.user.clone(),
        }
    }
}
