//! Error types for the executor crate.

/// Errors raised while executing a statement.
///
/// The `Display` text of [`ExecutorError::Database`] is exactly the driver's
/// message, since it is relayed verbatim to authenticated callers.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExecutorError {
    /// The database rejected or failed the statement.
    #[error("{0}")]
    Database(String),

    /// The database could not be reached or opened.
    #[error("database connection failed: {0}")]
    Connect(String),

    /// The remote query API returned something unusable.
    #[error("query API request failed: {0}")]
    Api(String),

    /// The remote endpoint URL cannot be served by this client.
    #[error("unsupported endpoint: {0}")]
    UnsupportedEndpoint(String),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for ExecutorError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => Self::Database(db.message().to_owned()),
            sqlx::Error::Io(io) => Self::Io(io),
            pool @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
                Self::Connect(pool.to_string())
            }
            other => Self::Database(other.to_string()),
        }
    }
}
