//! Executor configuration types.

use std::fmt;
use std::time::Duration;

/// Default time budget for one remote query round trip.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the embedded SQLite executor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SqliteConfig {
    /// sqlx connection URL, e.g. `sqlite://data/app.db` or `sqlite::memory:`.
    pub url: String,

    /// Upper bound on pooled connections. Forced to one for in-memory databases.
    pub max_connections: u32,

    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
}

impl SqliteConfig {
    /// Config for a file or URL with sensible defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), max_connections: 8, create_if_missing: true }
    }

    /// A private in-memory database that lives as long as the executor.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }

    /// In-memory databases exist per connection, so the pool must hold
    /// exactly one connection that never expires.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Configuration for the remote managed-database executor.
#[derive(Clone)]
#[non_exhaustive]
pub struct RemoteConfig {
    /// Query endpoint, `http://host[:port]/path`.
    pub endpoint: String,

    /// Bearer token sent as `Authorization`, if the endpoint requires one.
    pub api_token: Option<String>,

    /// Budget for connect, send and read combined.
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Create a config with the default timeout.
    pub fn new(endpoint: impl Into<String>, api_token: Option<String>) -> Self {
        Self { endpoint: endpoint.into(), api_token, timeout: DEFAULT_REMOTE_TIMEOUT }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_urls_are_detected() {
        assert!(SqliteConfig::in_memory().is_in_memory());
        assert!(SqliteConfig::new("sqlite://file:shared?mode=memory&cache=shared").is_in_memory());
        assert!(!SqliteConfig::new("sqlite://data/app.db").is_in_memory());
    }

    #[test]
    fn remote_config_debug_hides_token() {
        let config = RemoteConfig::new("http://127.0.0.1:9000/query", Some("tok-123".to_owned()));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("tok-123"));
        assert!(rendered.contains("127.0.0.1:9000"));
    }
}
