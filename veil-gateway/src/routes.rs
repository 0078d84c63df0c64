//! Axum handler for the Veil gateway.
//!
//! A single fallback handler serves every path and method:
//!
//! 1. `OPTIONS` answers with an empty body and no authentication.
//! 2. Anything that fails authentication, or is not a `POST`, gets the decoy.
//! 3. An authenticated `POST` body is parsed as a query and executed.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    response::{IntoResponse, Response},
    Json, Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, warn};
use veil_core::{
    auth::{SIGNATURE_HEADER, TIMESTAMP_HEADER, TIME_TOKEN_HEADER},
    Credentials, QueryOutcome, QueryRequest,
};

use crate::{error::GatewayError, state::AppState};

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router around the given state.
///
/// CORS headers are set on every response, the decoy included, so a browser
/// caller can always read the body.
pub fn create_router(state: AppState) -> Router {
    let allow_headers = allow_headers_value(state.authenticator.allowed_headers());
    let allow_headers = HeaderValue::from_str(&allow_headers)
        .unwrap_or_else(|_| HeaderValue::from_static("Content-Type"));
    Router::new()
        .fallback(handle_request)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers))
        .layer(TraceLayer::new_for_http())
}

/// `Access-Control-Allow-Headers`: `Content-Type` followed by the proof
/// headers, in canonical casing (`x-time-token` becomes `X-Time-Token`).
#[must_use]
pub fn allow_headers_value(proof_headers: &[&str]) -> String {
    std::iter::once("Content-Type".to_owned())
        .chain(proof_headers.iter().map(|name| canonical_case(name)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn canonical_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

// ── Handler ───────────────────────────────────────────────────────────────────

/// Entry point for every request.
pub async fn handle_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    match dispatch(&state, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn dispatch(state: &AppState, request: Request<Body>) -> Result<Response, GatewayError> {
    if request.method() == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }

    let authenticated = state.authenticator.verify(&credentials(request.headers()));
    if !authenticated || request.method() != Method::POST {
        debug!(method = %request.method(), "request rejected");
        return Err(GatewayError::Rejected);
    }

    let body = to_bytes(request.into_body(), state.max_body_bytes)
        .await
        .map_err(|e| GatewayError::InvalidBody(e.to_string()))?;
    let query: QueryRequest =
        serde_json::from_slice(&body).map_err(|e| GatewayError::InvalidBody(e.to_string()))?;

    match state.executor.execute(&query).await {
        Ok(rows) => {
            debug!(rows = rows.results.len(), changes = rows.meta.changes, "query succeeded");
            Ok(Json(QueryOutcome::success(rows)).into_response())
        }
        Err(e) => {
            warn!(executor = state.executor.kind(), error = %e, "query failed");
            Err(GatewayError::Query(e))
        }
    }
}

/// Borrow every proof header; the authenticator picks what its scheme needs.
fn credentials(headers: &HeaderMap) -> Credentials<'_> {
    let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    Credentials {
        token: get(TIME_TOKEN_HEADER),
        timestamp: get(TIMESTAMP_HEADER),
        signature: get(SIGNATURE_HEADER),
    }
}
