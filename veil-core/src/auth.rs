//! Time-windowed shared-secret authentication.
//!
//! Two wire schemes are supported, one per deployment:
//!
//! - **Time bucket**: the caller sends `X-Time-Token: hex(SHA-256(secret || slot))`
//!   where `slot = floor(unix_secs / step)`. The server accepts the current
//!   and the immediately preceding slot, so drift is bounded by one step.
//! - **Timestamp signature**: the caller sends `X-Timestamp: <ms>` and
//!   `X-Signature: hex(SHA-256(secret || timestamp))`. The server accepts when
//!   the timestamp is within the drift tolerance of its own clock and the
//!   signature matches the timestamp string exactly as transmitted.
//!
//! Every failure cause collapses into a single `false`. Both digests (or the
//! digest and the drift check) are always evaluated and combined with
//! [`subtle::Choice`], so the work done does not depend on why a request fails.

use std::sync::Arc;
use std::time::Duration;

use subtle::Choice;

use crate::clock::Clock;
use crate::digest::{compute_digest, digest_parts};
use crate::error::CoreError;
use crate::secret::SharedSecret;

/// Header carrying the time-bucket token.
pub const TIME_TOKEN_HEADER: &str = "x-time-token";
/// Header carrying the caller's clock in Unix epoch milliseconds.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
/// Header carrying `hex(SHA-256(secret || timestamp))`.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Default bucket width for the time-bucket scheme.
pub const DEFAULT_TIME_STEP: Duration = Duration::from_secs(30);
/// Default drift tolerance for the timestamp-signature scheme.
pub const DEFAULT_DRIFT_TOLERANCE: Duration = Duration::from_secs(120);

/// Width of one time bucket, in whole seconds (at least one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStep(i64);

impl TimeStep {
    /// Builds a step from a duration. Sub-second precision is dropped.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTimeStep`] if the duration is under one
    /// second, or [`CoreError::DurationOutOfRange`] if it overflows `i64`.
    pub fn new(step: Duration) -> Result<Self, CoreError> {
        let secs = step.as_secs();
        if secs == 0 {
            return Err(CoreError::InvalidTimeStep { secs });
        }
        let secs = i64::try_from(secs).map_err(|e| CoreError::DurationOutOfRange {
            reason: format!("time step {secs}s: {e}"),
        })?;
        Ok(Self(secs))
    }

    /// Step width in seconds.
    #[must_use]
    pub fn secs(self) -> i64 {
        self.0
    }

    /// The bucket index containing `now_millis`.
    ///
    /// `floor(floor(now_millis / 1000) / step)`, with Euclidean division so
    /// instants before the epoch still floor towards negative infinity.
    #[must_use]
    pub fn slot_at(self, now_millis: i64) -> i64 {
        now_millis.div_euclid(1000).div_euclid(self.0)
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        Self(30)
    }
}

/// Largest accepted `|server_now - client_timestamp|`, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftTolerance(u64);

impl DriftTolerance {
    /// # Errors
    /// Returns [`CoreError::DurationOutOfRange`] if the tolerance does not fit
    /// in a `u64` of milliseconds.
    pub fn new(tolerance: Duration) -> Result<Self, CoreError> {
        let millis = u64::try_from(tolerance.as_millis()).map_err(|e| {
            CoreError::DurationOutOfRange { reason: format!("drift tolerance: {e}") }
        })?;
        Ok(Self(millis))
    }

    /// Tolerance in milliseconds.
    #[must_use]
    pub fn millis(self) -> u64 {
        self.0
    }

    /// `true` when `timestamp_millis` is within tolerance of `now_millis`.
    #[must_use]
    pub fn admits(self, now_millis: i64, timestamp_millis: i64) -> bool {
        now_millis
            .checked_sub(timestamp_millis)
            .is_some_and(|drift| drift.unsigned_abs() <= self.0)
    }
}

impl Default for DriftTolerance {
    fn default() -> Self {
        Self(120_000)
    }
}

/// The proof format a deployment accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthScheme {
    /// Token bound to an implicit server-side time bucket.
    TimeBucket(TimeStep),
    /// Caller-supplied timestamp plus a signature over it.
    TimestampSignature(DriftTolerance),
}

impl AuthScheme {
    /// Request headers this scheme reads, lowercase.
    #[must_use]
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Self::TimeBucket(_) => &[TIME_TOKEN_HEADER],
            Self::TimestampSignature(_) => &[TIMESTAMP_HEADER, SIGNATURE_HEADER],
        }
    }
}

impl Default for AuthScheme {
    fn default() -> Self {
        Self::TimeBucket(TimeStep::default())
    }
}

/// Caller-supplied proof, borrowed from request headers.
///
/// All fields are optional; the scheme decides which are consulted and a
/// missing field is indistinguishable from a wrong one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    /// Value of `X-Time-Token`.
    pub token: Option<&'a str>,
    /// Value of `X-Timestamp`.
    pub timestamp: Option<&'a str>,
    /// Value of `X-Signature`.
    pub signature: Option<&'a str>,
}

impl<'a> Credentials<'a> {
    /// Credentials for the time-bucket scheme.
    #[must_use]
    pub fn token(token: &'a str) -> Self {
        Self { token: Some(token), ..Self::default() }
    }

    /// Credentials for the timestamp-signature scheme.
    #[must_use]
    pub fn signed(timestamp: &'a str, signature: &'a str) -> Self {
        Self { token: None, timestamp: Some(timestamp), signature: Some(signature) }
    }
}

/// Decides whether a caller knows the shared secret.
///
/// Stateless across requests: the accepted digests are re-derived from the
/// clock on every call and never cached.
pub struct Authenticator {
    secret: Option<SharedSecret>,
    scheme: AuthScheme,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    /// Create an authenticator.
    ///
    /// A `None` secret is allowed: every request is then rejected through the
    /// same path as a wrong token.
    #[must_use]
    pub fn new(secret: Option<SharedSecret>, scheme: AuthScheme, clock: Arc<dyn Clock>) -> Self {
        Self { secret, scheme, clock }
    }

    /// The configured scheme.
    #[must_use]
    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// Whether a secret was provisioned.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Request headers consulted by [`Authenticator::verify`].
    #[must_use]
    pub fn allowed_headers(&self) -> &'static [&'static str] {
        self.scheme.headers()
    }

    /// Accept or reject `credentials` against the current clock.
    #[must_use]
    pub fn verify(&self, credentials: &Credentials<'_>) -> bool {
        let now = self.clock.now_millis();
        let (key, configured): (&[u8], Choice) = match &self.secret {
            Some(secret) => (secret.as_bytes(), Choice::from(1)),
            None => (&[], Choice::from(0)),
        };

        let accepted = match self.scheme {
            AuthScheme::TimeBucket(step) => {
                let token = credentials.token.unwrap_or_default();
                let current = step.slot_at(now);
                let previous = current.saturating_sub(1);
                let matches_current =
                    digest_parts(key, current.to_string().as_bytes()).matches_hex(token);
                let matches_previous =
                    digest_parts(key, previous.to_string().as_bytes()).matches_hex(token);
                matches_current | matches_previous
            }
            AuthScheme::TimestampSignature(tolerance) => {
                let timestamp = credentials.timestamp.unwrap_or_default();
                let signature = credentials.signature.unwrap_or_default();
                let fresh = timestamp
                    .parse::<i64>()
                    .is_ok_and(|claimed| tolerance.admits(now, claimed));
                let signed = digest_parts(key, timestamp.as_bytes()).matches_hex(signature);
                signed & Choice::from(u8::from(fresh))
            }
        };

        bool::from(accepted & configured)
    }
}

/// Client side of the time-bucket scheme: the token valid at `now_millis`.
#[must_use]
pub fn mint_time_token(secret: &SharedSecret, now_millis: i64, step: TimeStep) -> String {
    compute_digest(secret, &step.slot_at(now_millis).to_string()).to_hex()
}

/// Client side of the timestamp-signature scheme.
#[must_use]
pub fn sign_timestamp(secret: &SharedSecret, timestamp: &str) -> String {
    compute_digest(secret, timestamp).to_hex()
}
