//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable, so a container can be
//! configured purely through its environment. The secret is read once at
//! startup and injected into the [`Authenticator`]; it is never logged.

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use veil_core::{
    auth::{SIGNATURE_HEADER, TIMESTAMP_HEADER, TIME_TOKEN_HEADER},
    mint_time_token, sign_timestamp, AuthScheme, Authenticator, Clock, DriftTolerance,
    SharedSecret, TimeStep,
};
use veil_executor::{QueryExecutor, RemoteConfig, RemoteExecutor, SqliteConfig, SqliteExecutor};

use crate::error::GatewayError;
use crate::state::DEFAULT_MAX_BODY_BYTES;

/// Authenticated SQL passthrough behind a time-windowed shared-secret token.
#[derive(Parser)]
#[command(name = "veil-gateway", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub settings: Settings,
}

/// Subcommands; serving is the default.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum Command {
    /// Run the HTTP endpoint.
    Serve,
    /// Print the proof headers valid right now for the configured secret.
    MintToken,
}

/// Which proof format the deployment accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeKind {
    /// `X-Time-Token` bound to a server-side time bucket.
    TimeBucket,
    /// `X-Timestamp` plus `X-Signature`.
    TimestampSignature,
}

/// Gateway settings.
#[derive(Args)]
pub struct Settings {
    /// Address to listen on.
    #[arg(long, env = "VEIL_LISTEN_ADDR", default_value = "127.0.0.1:8787")]
    pub listen_addr: String,

    /// Shared secret. Without it every request receives the decoy response.
    #[arg(long, env = "API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Proof format accepted from callers.
    #[arg(long, env = "VEIL_AUTH_SCHEME", value_enum, default_value_t = SchemeKind::TimeBucket)]
    pub auth_scheme: SchemeKind,

    /// Bucket width for the time-bucket scheme, in seconds.
    #[arg(long, env = "VEIL_TIME_STEP_SECS", default_value_t = 30)]
    pub time_step_secs: u64,

    /// Largest accepted clock difference for the timestamp scheme, in seconds.
    #[arg(long, env = "VEIL_DRIFT_TOLERANCE_SECS", default_value_t = 120)]
    pub drift_tolerance_secs: u64,

    /// sqlx SQLite URL for the embedded database.
    #[arg(long, env = "VEIL_DATABASE_URL", default_value = "sqlite::memory:")]
    pub database_url: String,

    /// Remote query endpoint; replaces the embedded database when set.
    #[arg(long, env = "VEIL_REMOTE_ENDPOINT")]
    pub remote_endpoint: Option<String>,

    /// Bearer token for the remote query endpoint.
    #[arg(long, env = "VEIL_REMOTE_TOKEN", hide_env_values = true)]
    pub remote_token: Option<String>,

    /// Largest authenticated request body, in bytes.
    #[arg(long, env = "VEIL_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl Settings {
    /// The configured scheme with validated parameters.
    ///
    /// # Errors
    /// Returns [`GatewayError::Config`] for a zero time step.
    pub fn auth_scheme(&self) -> Result<AuthScheme, GatewayError> {
        Ok(match self.auth_scheme {
            SchemeKind::TimeBucket => {
                AuthScheme::TimeBucket(TimeStep::new(Duration::from_secs(self.time_step_secs))?)
            }
            SchemeKind::TimestampSignature => AuthScheme::TimestampSignature(DriftTolerance::new(
                Duration::from_secs(self.drift_tolerance_secs),
            )?),
        })
    }

    /// The shared secret, if one was provided and is non-empty.
    #[must_use]
    pub fn shared_secret(&self) -> Option<SharedSecret> {
        self.api_secret.clone().and_then(|s| SharedSecret::new(s).ok())
    }

    /// Build the authenticator over `clock`.
    ///
    /// # Errors
    /// Returns [`GatewayError::Config`] if the scheme parameters are invalid.
    pub fn authenticator(&self, clock: Arc<dyn Clock>) -> Result<Authenticator, GatewayError> {
        Ok(Authenticator::new(self.shared_secret(), self.auth_scheme()?, clock))
    }

    /// Open the configured database executor.
    ///
    /// # Errors
    /// Returns [`GatewayError::Query`] if the database cannot be opened or the
    /// remote endpoint is unusable.
    pub async fn executor(&self) -> Result<Arc<dyn QueryExecutor>, GatewayError> {
        if let Some(endpoint) = &self.remote_endpoint {
            let config = RemoteConfig::new(endpoint.clone(), self.remote_token.clone());
            return Ok(Arc::new(RemoteExecutor::new(config)?));
        }
        let config = SqliteConfig::new(self.database_url.clone());
        let executor = SqliteExecutor::connect(&config).await?;
        Ok(Arc::new(executor))
    }

    /// Header name/value pairs a client would send at `now_millis`.
    ///
    /// # Errors
    /// Returns [`GatewayError::MissingSecret`] without a secret, or
    /// [`GatewayError::Config`] for invalid scheme parameters.
    pub fn mint_headers(
        &self,
        now_millis: i64,
    ) -> Result<Vec<(&'static str, String)>, GatewayError> {
        let secret = self.shared_secret().ok_or(GatewayError::MissingSecret)?;
        Ok(match self.auth_scheme()? {
            AuthScheme::TimestampSignature(_) => {
                let timestamp = now_millis.to_string();
                let signature = sign_timestamp(&secret, &timestamp);
                vec![(TIMESTAMP_HEADER, timestamp), (SIGNATURE_HEADER, signature)]
            }
            AuthScheme::TimeBucket(step) => {
                vec![(TIME_TOKEN_HEADER, mint_time_token(&secret, now_millis, step))]
            }
            _ => Vec::new(),
        })
    }
}
