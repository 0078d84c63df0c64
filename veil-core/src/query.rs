//! Wire types for the SQL passthrough.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single row, column name to value, in result-set column order.
pub type Row = Map<String, Value>;

/// Body of an authenticated `POST`: one statement and its positional binds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct QueryRequest {
    /// Statement with `?` placeholders.
    pub sql: String,
    /// Bind values in placeholder order. Absent or `null` means no binds.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Vec<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl QueryRequest {
    /// Creates a request.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self { sql: sql.into(), params }
    }
}

/// Execution metadata reported alongside the rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMeta {
    /// Wall-clock execution time in milliseconds.
    #[serde(default)]
    pub duration: f64,
    /// Rows inserted, updated or deleted by the statement.
    #[serde(default)]
    pub changes: u64,
    /// Rowid of the most recent successful insert on the connection.
    #[serde(default)]
    pub last_row_id: i64,
    /// Whether the statement modified the database.
    #[serde(default)]
    pub changed_db: bool,
    /// Rows read while executing, when the database reports it.
    #[serde(default)]
    pub rows_read: u64,
    /// Rows written while executing, when the database reports it.
    #[serde(default)]
    pub rows_written: u64,
    /// Any further keys a remote database reports, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A successful execution: metadata plus the result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct QueryRows {
    /// Execution metadata.
    #[serde(default)]
    pub meta: QueryMeta,
    /// Result rows, empty for statements that return none.
    #[serde(default)]
    pub results: Vec<Row>,
}

impl QueryRows {
    /// Creates a result set.
    #[must_use]
    pub fn new(meta: QueryMeta, results: Vec<Row>) -> Self {
        Self { meta, results }
    }
}

/// Response body returned to an authenticated caller.
///
/// Serializes as `{"success":true,"meta":{..},"results":[..]}` or
/// `{"success":false,"error":".."}`. Failures keep HTTP status 200; callers
/// inspect `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    /// The statement ran.
    Success {
        /// Always `true`.
        success: bool,
        /// Execution metadata.
        meta: QueryMeta,
        /// Result rows.
        results: Vec<Row>,
    },
    /// The body could not be read or parsed, or the statement failed.
    Failure {
        /// Always `false`.
        success: bool,
        /// Database or parse error message, verbatim.
        error: String,
    },
}

impl QueryOutcome {
    /// Wrap executor output.
    #[must_use]
    pub fn success(rows: QueryRows) -> Self {
        Self::Success { success: true, meta: rows.meta, results: rows.results }
    }

    /// Wrap an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure { success: false, error: error.into() }
    }

    /// Whether this is the success shape.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<QueryRows> for QueryOutcome {
    fn from(rows: QueryRows) -> Self {
        Self::success(rows)
    }
}
