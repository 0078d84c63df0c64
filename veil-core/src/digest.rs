use std::fmt;

use sha2::{Digest as _, Sha256};
use subtle::{Choice, ConstantTimeEq};

use crate::secret::SharedSecret;

/// A SHA-256 digest over `secret || time_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Creates a `Digest` from a raw 32-byte array.
    #[must_use]
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering, the form clients put on the wire.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Compares `candidate` against the lowercase hex form without an early
    /// exit on the first differing byte.
    ///
    /// A length mismatch is not hidden; every valid candidate is 64 bytes.
    #[must_use]
    pub fn matches_hex(&self, candidate: &str) -> Choice {
        self.to_hex().as_bytes().ct_eq(candidate.as_bytes())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Computes `SHA-256(secret || time_value)` over the UTF-8 bytes.
///
/// # Complexity
/// O(n) where n = len(secret) + len(time_value).
#[must_use]
pub fn compute_digest(secret: &SharedSecret, time_value: &str) -> Digest {
    digest_parts(secret.as_bytes(), time_value.as_bytes())
}

pub(crate) fn digest_parts(secret: &[u8], time_value: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(time_value);
    Digest::new(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SharedSecret {
        match SharedSecret::new(value) {
            Ok(s) => s,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn digest_matches_known_sha256_of_concatenation() {
        // SHA-256("abc")
        let digest = compute_digest(&secret("a"), "bc");
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            "digest must be SHA-256 over secret followed by time value"
        );
    }

    #[test]
    fn digest_hex_is_lowercase() {
        let hex = compute_digest(&secret("seed"), "58000000").to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn matches_hex_accepts_exact_and_rejects_uppercase() {
        let digest = compute_digest(&secret("seed"), "1");
        let hex = digest.to_hex();
        assert!(bool::from(digest.matches_hex(&hex)));
        assert!(!bool::from(digest.matches_hex(&hex.to_uppercase())));
        assert!(!bool::from(digest.matches_hex("")));
        assert!(!bool::from(digest.matches_hex(&hex[..63])));
    }

    proptest::proptest! {
        #[test]
        fn proptest_digest_is_reproducible(
            seed in "[ -~]{1,64}",
            slot in proptest::prelude::any::<i64>(),
        ) {
            let a = compute_digest(&secret(&seed), &slot.to_string());
            let b = digest_parts(seed.as_bytes(), slot.to_string().as_bytes());
            proptest::prop_assert_eq!(a, b, "independent computation must agree");
        }

        #[test]
        fn proptest_single_char_tamper_is_rejected(
            seed in "[a-z0-9]{1,32}",
            slot in 0_i64..100_000_000,
            index in 0_usize..64,
        ) {
            let digest = compute_digest(&secret(&seed), &slot.to_string());
            let mut tampered: Vec<u8> = digest.to_hex().into_bytes();
            tampered[index] = if tampered[index] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8_lossy(&tampered).into_owned();
            proptest::prop_assert!(!bool::from(digest.matches_hex(&tampered)));
        }
    }
}
