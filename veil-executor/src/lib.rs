//! Database executors for the Veil gateway.
//!
//! The gateway treats the database as an opaque "execute SQL, return rows
//! and metadata" capability behind [`QueryExecutor`]. Two implementations
//! ship: an embedded SQLite database and a remote managed database reached
//! over its REST query endpoint.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod config;
pub mod error;
pub mod remote;
pub mod sqlite;

pub use backend::QueryExecutor;
pub use config::{RemoteConfig, SqliteConfig, DEFAULT_REMOTE_TIMEOUT};
pub use error::ExecutorError;
pub use remote::RemoteExecutor;
pub use sqlite::SqliteExecutor;
