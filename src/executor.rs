//! Batch execution.
//!
//! Runs the scripts one at a time in discovery order. Each script gets its
//! own connection, and its artifact is written before the next script is
//! read.

use crate::config::{ErrorPolicy, RunConfig};
use crate::db::{Connector, DatabaseClient, QueryResult};
use crate::discovery::ScriptFile;
use crate::error::{Result, SqlRunError};
use crate::operator::Operator;
use crate::output;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A script that did not produce an artifact.
#[derive(Debug)]
pub struct ScriptFailure {
    pub script: PathBuf,
    pub error: SqlRunError,
}

/// Outcome of a batch that ran to its end.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Artifacts written, in order.
    pub artifacts: Vec<PathBuf>,
    /// Scripts that failed, in order.
    pub failures: Vec<ScriptFailure>,
}

impl BatchReport {
    /// Returns true if every script produced its artifact.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs every script in `files`.
///
/// Per-script failures are shown and recorded; with [`ErrorPolicy::Abort`]
/// the first one ends the batch and is returned as the error. Failing to
/// open a connection, or losing one mid-script, always ends the batch.
pub async fn run_batch(
    connector: &dyn Connector,
    config: &RunConfig,
    files: &[ScriptFile],
    operator: &mut dyn Operator,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for (index, script) in files.iter().enumerate() {
        debug!(
            "Script {}/{}: {}",
            index + 1,
            files.len(),
            script.path.display()
        );

        match run_script(connector, config, script).await {
            Ok(path) => {
                operator.show(&path.display().to_string());
                report.artifacts.push(path);
            }
            Err(error) if error.is_per_file() => {
                let error = attach_path(error, script);
                warn!("{}", error);
                operator.show(&format!("{}: {}", script.path.display(), error));

                if config.on_error == ErrorPolicy::Abort {
                    return Err(error);
                }
                report.failures.push(ScriptFailure {
                    script: script.path.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    info!(
        "Batch finished: {} artifact(s), {} failure(s)",
        report.artifacts.len(),
        report.failures.len()
    );

    Ok(report)
}

/// Reads, executes and serializes one script.
async fn run_script(
    connector: &dyn Connector,
    config: &RunConfig,
    script: &ScriptFile,
) -> Result<PathBuf> {
    let text = std::fs::read_to_string(&script.path)
        .map_err(|e| SqlRunError::script_read(&script.path, e.to_string()))?;
    let sql = strip_bom(&text);

    let mut client = connector.connect(&config.target, &config.auth).await?;
    let executed = execute(client.as_mut(), config, sql).await;
    let closed = client.close().await;

    let result = executed?;
    if let Err(e) = closed {
        warn!("{}", e);
    }

    debug!(
        "{} returned {} row(s) in {:?}",
        script.file_name(),
        result.row_count(),
        result.execution_time
    );

    output::write_artifact(script, &result, config.format)
}

async fn execute(
    client: &mut dyn DatabaseClient,
    config: &RunConfig,
    sql: &str,
) -> Result<QueryResult> {
    match config.query_timeout {
        None => client.execute_script(sql).await,
        Some(timeout) => tokio::time::timeout(timeout, client.execute_script(sql))
            .await
            .map_err(|_| {
                SqlRunError::query(format!(
                    "Script timed out after {} seconds",
                    timeout.as_secs()
                ))
            })?,
    }
}

/// Drops a leading UTF-8 byte order mark, which the server would reject.
fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Gives path-less query errors the script they came from.
fn attach_path(error: SqlRunError, script: &ScriptFile) -> SqlRunError {
    match error {
        SqlRunError::Query(message) => SqlRunError::execution(&script.path, message),
        other => other,
    }
}
