//! Database executor abstraction trait.
//!
//! Allows swapping between the embedded SQLite executor and a remote managed
//! database without changing the gateway.

use async_trait::async_trait;
use veil_core::{QueryRequest, QueryRows};

use crate::ExecutorError;

/// Runs one SQL statement with positional binds and returns its rows.
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
/// Each call is independent; no transaction spans two calls.
///
/// # Cancel Safety
/// All methods are cancel safe. Dropping the future abandons the statement;
/// SQLite rolls back an unfinished implicit transaction.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute `request.sql` with `request.params` bound in order.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Database`] with the database's own message if
    /// the statement fails, [`ExecutorError::Connect`] or
    /// [`ExecutorError::Api`] if the database cannot be reached.
    async fn execute(&self, request: &QueryRequest) -> Result<QueryRows, ExecutorError>;

    /// Check that the database is reachable.
    ///
    /// # Errors
    /// Returns the error a trivial statement would produce.
    async fn health_check(&self) -> Result<(), ExecutorError> {
        self.execute(&QueryRequest::new("SELECT 1", Vec::new())).await.map(|_| ())
    }

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}
