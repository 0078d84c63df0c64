//! Shared per-process handler state.
//!
//! Everything here is immutable after startup, so cloning the state into
//! each request is a pair of reference-count bumps.

use std::sync::Arc;

use veil_core::Authenticator;
use veil_executor::QueryExecutor;

/// Default cap on an authenticated request body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Dependencies injected into the request handler.
#[derive(Clone)]
pub struct AppState {
    /// Verifies the caller's proof of the shared secret.
    pub authenticator: Arc<Authenticator>,
    /// The database collaborator.
    pub executor: Arc<dyn QueryExecutor>,
    /// Largest body read after authentication succeeds.
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create state with the default body limit.
    #[must_use]
    pub fn new(authenticator: Authenticator, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            executor,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Override the body limit.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
