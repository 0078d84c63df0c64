//! Fuzz target: token digest computation.
//!
//! Verifies that `compute_digest` never panics on arbitrary time values and
//! always renders 64 lowercase hex characters that match themselves.
#![no_main]

use libfuzzer_sys::fuzz_target;
use veil_core::{compute_digest, SharedSecret};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(secret) = SharedSecret::new("fuzz-secret") else {
        return;
    };
    let digest = compute_digest(&secret, text);
    let hex = digest.to_hex();
    assert_eq!(hex.len(), 64, "SHA-256 hex must always be 64 chars");
    assert!(
        hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')),
        "digest hex must be lowercase"
    );
    assert!(bool::from(digest.matches_hex(&hex)));
});
