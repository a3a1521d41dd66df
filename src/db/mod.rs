//! Database abstraction layer for sqlrun.
//!
//! Provides a trait-based interface for database operations so the batch
//! pipeline can run against PostgreSQL or an in-memory mock.

mod mock;
mod postgres;
mod types;

pub use mock::{MockConnector, MockDatabaseClient, MockResponse};
pub use postgres::{PostgresClient, PostgresConnector};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::{ConnectionAuth, ConnectionTarget};
use crate::error::Result;
use async_trait::async_trait;

/// One open database connection.
///
/// All database operations are async and return Results with SqlRunError.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes the full text of a script, which may hold several statements.
    ///
    /// Statement failures reported by the server are [`SqlRunError::Query`];
    /// a lost or broken connection is [`SqlRunError::Connection`].
    ///
    /// [`SqlRunError::Query`]: crate::error::SqlRunError::Query
    /// [`SqlRunError::Connection`]: crate::error::SqlRunError::Connection
    async fn execute_script(&mut self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection. Closing twice is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Opens connections to a target.
///
/// The runner opens one connection for validation and a fresh one per script.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        target: &ConnectionTarget,
        auth: &ConnectionAuth,
    ) -> Result<Box<dyn DatabaseClient>>;
}
