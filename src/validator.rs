//! Connection validation.
//!
//! Proves the configured connection works before any script is touched.

use crate::config::RunConfig;
use crate::db::{Connector, Value};
use crate::error::{Result, SqlRunError};
use tracing::{debug, info};

/// Probe query. Only its success matters.
pub const PROBE_QUERY: &str = "SELECT version()";

/// Opens one connection, runs the probe query and closes the connection again.
///
/// Returns the server identity reported by the probe. Any failure is a
/// [`SqlRunError::Connection`] naming the target but never the password.
pub async fn validate_connection(connector: &dyn Connector, config: &RunConfig) -> Result<String> {
    let mut client = connector.connect(&config.target, &config.auth).await?;

    let probe = client.execute_script(PROBE_QUERY).await;
    // The connection must not outlive this call, whatever the probe returned.
    let closed = client.close().await;

    let result = probe.map_err(|e| {
        SqlRunError::connection(format!(
            "Probe query failed on {}: {}",
            config.connection_summary(),
            e
        ))
    })?;
    closed?;

    let identity = result
        .rows
        .first()
        .and_then(|row| row.first())
        .filter(|value| !value.is_null())
        .map(Value::to_display_string)
        .unwrap_or_else(|| "unknown server".to_string());

    debug!("Probe returned: {}", identity);
    info!("Connection validated: {}", config.connection_summary());

    Ok(identity)
}
