//! Embedded SQLite executor.
//!
//! Runs each statement on a pooled sqlx connection. Change counts are read
//! from `total_changes()` before and after the statement on the same
//! connection, so a plain `SELECT` never reports a previous write's count.

use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use veil_core::{QueryMeta, QueryRequest, QueryRows, Row};

use crate::backend::QueryExecutor;
use crate::{ExecutorError, SqliteConfig};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Executes statements against a local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Open the database described by `config`.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Connect`] if the URL is invalid or the
    /// database cannot be opened.
    pub async fn connect(config: &SqliteConfig) -> Result<Self, ExecutorError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| ExecutorError::Connect(format!("{}: {e}", config.url)))?
            .create_if_missing(config.create_if_missing);

        let pool_options = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| ExecutorError::Connect(format!("{}: {e}", config.url)))?;

        tracing::info!(url = %config.url, "opened SQLite database");
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Connect`] if SQLite cannot be initialised.
    pub async fn in_memory() -> Result<Self, ExecutorError> {
        Self::connect(&SqliteConfig::in_memory()).await
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(&self, request: &QueryRequest) -> Result<QueryRows, ExecutorError> {
        let started = Instant::now();
        let mut conn = self.pool.acquire().await?;

        let before: i64 = sqlx::query_scalar("SELECT total_changes()")
            .fetch_one(&mut *conn)
            .await?;

        let query = request
            .params
            .iter()
            .fold(sqlx::query(&request.sql), bind_json);
        let rows = query.fetch_all(&mut *conn).await?;

        let (after, last_row_id): (i64, i64) =
            sqlx::query_as("SELECT total_changes(), last_insert_rowid()")
                .fetch_one(&mut *conn)
                .await?;

        let changes = u64::try_from(after - before).unwrap_or_default();
        let results: Vec<Row> = rows.iter().map(row_to_json).collect();

        let meta = QueryMeta {
            duration: started.elapsed().as_secs_f64() * 1000.0,
            changes,
            last_row_id,
            changed_db: changes > 0,
            rows_written: changes,
            ..QueryMeta::default()
        };

        tracing::debug!(rows = results.len(), changes, "statement executed");
        Ok(QueryRows::new(meta, results))
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}

/// Bind one JSON value positionally.
///
/// Arrays and objects have no SQLite counterpart and are bound as JSON text.
fn bind_json<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
    }
}

fn row_to_json(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .map(|column| (column.name().to_owned(), column_value(row, column.ordinal())))
        .collect()
}

/// Convert one cell by its runtime storage class.
fn column_value(row: &SqliteRow, index: usize) -> Value {
    let Ok(raw) = row.try_get_raw(index) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    let storage = raw.type_info().name().to_owned();

    let converted = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(index).ok().map(Value::from),
        "REAL" => row.try_get::<f64, _>(index).ok().map(Value::from),
        "TEXT" => row.try_get::<String, _>(index).ok().map(Value::String),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).ok().map(Value::from),
        _ => None,
    };

    converted
        .or_else(|| row.try_get::<String, _>(index).ok().map(Value::String))
        .or_else(|| row.try_get::<i64, _>(index).ok().map(Value::from))
        .or_else(|| row.try_get::<f64, _>(index).ok().map(Value::from))
        .unwrap_or(Value::Null)
}
