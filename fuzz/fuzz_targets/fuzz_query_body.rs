//! Fuzz target: JSON deserialization of an authenticated request body.
//!
//! Arbitrary bytes must never panic the parser; anything accepted must
//! serialize back to a body that parses to the same request.
#![no_main]

use libfuzzer_sys::fuzz_target;
use veil_core::QueryRequest;

fuzz_target!(|data: &[u8]| {
    let Ok(request) = serde_json::from_slice::<QueryRequest>(data) else {
        return;
    };
    let Ok(encoded) = serde_json::to_vec(&request) else {
        return;
    };
    let again: QueryRequest = match serde_json::from_slice(&encoded) {
        Ok(r) => r,
        Err(e) => panic!("re-encoded request failed to parse: {e}"),
    };
    assert_eq!(again.sql, request.sql);
    assert_eq!(again.params.len(), request.params.len());
});
