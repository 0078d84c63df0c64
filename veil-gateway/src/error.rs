//! Error types for the gateway crate.
//!
//! Two response shapes exist. A rejected request gets the decoy page; every
//! other failure reaches an authenticated caller as
//! `{"success": false, "error": ..}`. Both use status 200.

use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use veil_core::{CoreError, QueryOutcome};
use veil_executor::ExecutorError;

/// Body served to anyone who fails authentication: a stock PHP parse error,
/// so a prober sees a broken script rather than an auth wall.
pub const DECOY_BODY: &str = "
<br />
<b>Parse error</b>:  syntax error, unexpected '?' in <b>/var/www/html/libs/db_connect.php</b> on line <b>14</b><br />
";

/// Errors that can occur during gateway request handling and startup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Authentication failed, for any reason, or the method is not `POST`.
    #[error("request rejected")]
    Rejected,

    /// The body could not be read or is not a valid query request.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The database failed the statement; the message is passed through.
    #[error(transparent)]
    Query(#[from] ExecutorError),

    /// Startup configuration was invalid.
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    /// An operation needing the shared secret ran without one.
    #[error("API secret is not configured (set API_SECRET or --api-secret)")]
    MissingSecret,
}

/// The one canonical rejection response.
#[must_use]
pub fn decoy_response() -> Response {
    (StatusCode::OK, [(CONTENT_TYPE, "text/html")], DECOY_BODY).into_response()
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Rejected => decoy_response(),
            other => {
                (StatusCode::OK, Json(QueryOutcome::failure(other.to_string()))).into_response()
            }
        }
    }
}
