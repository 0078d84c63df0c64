//! Core types for the Veil SQL gateway.
//!
//! Defines the shared secret, the SHA-256 time-value digest, the
//! time-windowed authenticator and the query wire types. Nothing here does
//! I/O; the clock is injected.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod auth;
pub mod clock;
pub mod digest;
pub mod error;
pub mod query;
pub mod secret;

pub use auth::{
    mint_time_token, sign_timestamp, AuthScheme, Authenticator, Credentials, DriftTolerance,
    TimeStep,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use digest::{compute_digest, Digest};
pub use error::CoreError;
pub use query::{QueryMeta, QueryOutcome, QueryRequest, QueryRows, Row};
pub use secret::SharedSecret;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn digest_display_shows_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xde;
        bytes[1] = 0xad;
        bytes[31] = 0xff;
        let digest = Digest::new(bytes);
        let s = digest.to_string();
        assert!(s.starts_with("dead"), "expected hex starting with 'dead', got {s}");
        assert!(s.ends_with("ff"), "expected hex ending with 'ff', got {s}");
        assert_eq!(s.len(), 64, "SHA-256 hex must be 64 chars");
    }

    #[test]
    fn digest_as_bytes_returns_raw_bytes() {
        let bytes = [0xab_u8; 32];
        let digest = Digest::new(bytes);
        assert_eq!(digest.as_bytes(), &bytes, "as_bytes must return the original array");
    }

    #[test]
    fn shared_secret_try_from_empty_string_fails() {
        let result = SharedSecret::try_from(String::new());
        assert!(result.is_err(), "TryFrom empty value must fail");
    }

    #[test]
    fn client_and_server_agree_through_public_api() {
        let secret = match SharedSecret::new("seed") {
            Ok(s) => s,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let now = 1_730_000_000_000;
        let token = mint_time_token(&secret, now, TimeStep::default());
        let auth =
            Authenticator::new(Some(secret), AuthScheme::default(), Arc::new(FixedClock(now)));
        assert!(auth.verify(&Credentials::token(&token)));
    }

    #[test]
    fn core_error_display_includes_step() {
        let err = CoreError::InvalidTimeStep { secs: 0 };
        assert!(err.to_string().contains("0s"), "Display must include the step");
    }
}
