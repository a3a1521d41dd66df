//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::config::{ConnectionAuth, ConnectionTarget};
use crate::db::{ColumnInfo, Connector, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Result, SqlRunError};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Column as SqlxColumn, Connection, Either, Row as SqlxRow, TypeInfo};
use std::time::Instant;
use tracing::debug;

/// Reported to the server as `application_name`.
const APPLICATION_NAME: &str = "sqlrun";

/// PostgreSQL database client holding a single connection.
#[derive(Debug)]
pub struct PostgresClient {
    conn: Option<PgConnection>,
}

impl PostgresClient {
    /// Opens a connection to the target. No retries are attempted.
    pub async fn connect(target: &ConnectionTarget, auth: &ConnectionAuth) -> Result<Self> {
        let options = connect_options(target, auth);

        debug!(
            "Connecting to {} as {}",
            target.display_string(),
            auth.describe()
        );

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| map_connection_error(e, target, auth))?;

        Ok(Self { conn: Some(conn) })
    }
}

/// Builds the driver options for a target.
///
/// Integrated mode leaves the username and password to the driver, which
/// falls back to `PGUSER`, `PGPASSWORD`, `~/.pgpass` and the OS user.
fn connect_options(target: &ConnectionTarget, auth: &ConnectionAuth) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&target.server)
        .port(target.port)
        .database(&target.database)
        .application_name(APPLICATION_NAME);

    match auth {
        ConnectionAuth::Integrated => options,
        ConnectionAuth::Credentials { username, password } => {
            options.username(username).password(password)
        }
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_script(&mut self, sql: &str) -> Result<QueryResult> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| SqlRunError::connection("Connection is already closed"))?;

        let start = Instant::now();
        let mut result = QueryResult::new();
        let mut pending: Vec<PgRow> = Vec::new();

        // raw_sql uses the simple query protocol, so a script may hold several
        // statements. A completion marker follows the rows of every statement.
        let mut stream = sqlx::raw_sql(sql).fetch_many(&mut *conn);
        while let Some(item) = stream.try_next().await.map_err(map_execution_error)? {
            match item {
                Either::Left(done) => {
                    debug!("Statement finished, {} row(s) affected", done.rows_affected());
                    flush_result_set(&mut result, &mut pending);
                }
                Either::Right(row) => pending.push(row),
            }
        }
        drop(stream);
        flush_result_set(&mut result, &mut pending);

        Ok(result.with_execution_time(start.elapsed()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| SqlRunError::connection(format!("Failed to close connection: {e}")))?;
        }
        Ok(())
    }
}

/// Opens a fresh `PostgresClient` for every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnector;

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(
        &self,
        target: &ConnectionTarget,
        auth: &ConnectionAuth,
    ) -> Result<Box<dyn DatabaseClient>> {
        let client = PostgresClient::connect(target, auth).await?;
        Ok(Box::new(client))
    }
}

/// Moves the rows of a finished statement into the result.
fn flush_result_set(result: &mut QueryResult, pending: &mut Vec<PgRow>) {
    let Some(first) = pending.first() else {
        return;
    };

    let columns: Vec<ColumnInfo> = first
        .columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect();
    let rows: Vec<Row> = pending.iter().map(convert_row).collect();
    pending.clear();

    result.append_result_set(columns, rows);
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
///
/// `raw_sql` uses the simple query protocol, so every value arrives in text
/// format. Numbers, dates and the rest keep the server's own rendering; only
/// booleans (`t`/`f`) and bytea (`\x...`) are decoded into typed values.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name {
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        _ => row
            .try_get_unchecked::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Splits driver errors into statement faults and connection failures.
fn map_execution_error(error: sqlx::Error) -> SqlRunError {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::WorkerCrashed => {
            SqlRunError::connection(format!("Connection lost: {error}"))
        }
        other => SqlRunError::query(format_query_error(other)),
    }
}

/// Maps sqlx connection errors to operator-facing messages.
///
/// Messages name the target and user but never the password.
fn map_connection_error(
    error: sqlx::Error,
    target: &ConnectionTarget,
    auth: &ConnectionAuth,
) -> SqlRunError {
    let summary = target.summary(auth);
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        SqlRunError::connection(format!(
            "Cannot connect to {summary}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        SqlRunError::connection(format!(
            "Authentication failed for {summary}. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        SqlRunError::connection(format!(
            "Database '{}' does not exist: {summary}",
            target.database
        ))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        SqlRunError::connection(format!(
            "Connection to {summary} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        SqlRunError::connection(format!("{summary}: {error}"))
    }
}

/// Formats a query error with hints if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(table) = pg_error.table() {
            result.push_str("\n  TABLE: ");
            result.push_str(table);
        }

        if let Some(column) = pg_error.column() {
            result.push_str("\n  COLUMN: ");
            result.push_str(column);
        }
    }

    result
}
