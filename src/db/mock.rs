//! Mock database client for testing.
//!
//! Provides an in-memory connector whose responses are configured up front
//! and whose activity (connections, executed scripts) can be inspected.

use super::{ColumnInfo, Connector, DatabaseClient, QueryResult, Value};
use crate::config::{ConnectionAuth, ConnectionTarget};
use crate::error::{Result, SqlRunError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Canned outcome for a script.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The script succeeds with this result.
    Rows(QueryResult),
    /// The server rejects the script.
    QueryError(String),
    /// The connection drops while the script runs.
    ConnectionLost(String),
    /// The script takes this long, then succeeds with an empty result.
    Delay(Duration),
}

#[derive(Debug, Default)]
struct MockState {
    refuse_connections: bool,
    /// Connections accepted before further attempts are refused.
    connection_limit: Option<usize>,
    responses: HashMap<String, MockResponse>,
    connections: usize,
    closed: usize,
    executed: Vec<String>,
}

/// A mock connector that hands out [`MockDatabaseClient`]s sharing one state.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Creates a connector that accepts every connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector that refuses every connection.
    pub fn unreachable() -> Self {
        let connector = Self::new();
        connector.lock().refuse_connections = true;
        connector
    }

    /// Accepts `limit` connections, then refuses the rest.
    pub fn with_connection_limit(self, limit: usize) -> Self {
        self.lock().connection_limit = Some(limit);
        self
    }

    /// Registers the response for a script (matched after trimming whitespace).
    pub fn with_response(self, sql: &str, response: MockResponse) -> Self {
        self.lock()
            .responses
            .insert(sql.trim().to_string(), response);
        self
    }

    /// Number of connections opened so far.
    pub fn connections(&self) -> usize {
        self.lock().connections
    }

    /// Number of connections closed so far.
    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    /// Scripts executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        target: &ConnectionTarget,
        auth: &ConnectionAuth,
    ) -> Result<Box<dyn DatabaseClient>> {
        let mut state = self.lock();
        let over_limit = state
            .connection_limit
            .is_some_and(|limit| state.connections >= limit);

        if state.refuse_connections || over_limit {
            return Err(SqlRunError::connection(format!(
                "Cannot connect to {}. Check that the server is running.",
                target.summary(auth)
            )));
        }

        state.connections += 1;
        Ok(Box::new(MockDatabaseClient {
            state: Arc::clone(&self.state),
            open: true,
        }))
    }
}

/// A mock database client that returns predefined results.
#[derive(Debug)]
pub struct MockDatabaseClient {
    state: Arc<Mutex<MockState>>,
    open: bool,
}

impl MockDatabaseClient {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Result for scripts without a registered response.
fn default_result(sql: &str) -> QueryResult {
    if sql.to_uppercase().starts_with("SELECT") {
        QueryResult::with_data(
            vec![ColumnInfo::new("result", "TEXT")],
            vec![vec![Value::String(format!("Mock result for: {sql}"))]],
        )
    } else {
        QueryResult::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_script(&mut self, sql: &str) -> Result<QueryResult> {
        if !self.open {
            return Err(SqlRunError::connection("Connection is already closed"));
        }

        let key = sql.trim().to_string();
        let response = {
            let mut state = self.lock();
            state.executed.push(key.clone());
            state.responses.get(&key).cloned()
        };

        let result = match response {
            Some(MockResponse::Rows(result)) => result,
            Some(MockResponse::QueryError(msg)) => return Err(SqlRunError::query(msg)),
            Some(MockResponse::ConnectionLost(msg)) => {
                self.open = false;
                return Err(SqlRunError::connection(msg));
            }
            Some(MockResponse::Delay(duration)) => {
                tokio::time::sleep(duration).await;
                QueryResult::new()
            }
            None => default_result(&key),
        };

        Ok(result.with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.lock().closed += 1;
        }
        Ok(())
    }
}
