//! Fuzz target: credential verification under both schemes.
//!
//! Arbitrary header text must never panic the authenticator and must never
//! be accepted unless it is the exact digest for an admitted time value.
#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use veil_core::{
    AuthScheme, Authenticator, Credentials, DriftTolerance, FixedClock, SharedSecret,
};

const NOW: i64 = 1_730_000_000_000;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(secret) = SharedSecret::new("fuzz-secret") else {
        return;
    };
    let (timestamp, signature) = text.split_once('\n').unwrap_or((text, text));

    let bucket = Authenticator::new(
        Some(secret.clone()),
        AuthScheme::default(),
        Arc::new(FixedClock(NOW)),
    );
    let _ = bucket.verify(&Credentials::token(text));

    let signed = Authenticator::new(
        Some(secret),
        AuthScheme::TimestampSignature(DriftTolerance::default()),
        Arc::new(FixedClock(NOW)),
    );
    let _ = signed.verify(&Credentials::signed(timestamp, signature));

    let unconfigured = Authenticator::new(None, AuthScheme::default(), Arc::new(FixedClock(NOW)));
    assert!(!unconfigured.verify(&Credentials::token(text)), "no secret must reject everything");
});
