use std::fmt;

use crate::error::CoreError;

/// The process-wide shared secret both client and server hash with.
///
/// Deliberately has no `Display` or `Serialize` impl, and its `Debug` output
/// is redacted, so it cannot end up in a log line or a response body.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wraps a secret value.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptySecret`] if `value` is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        if value.is_empty() {
            return Err(CoreError::EmptySecret);
        }
        Ok(Self(value))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

impl TryFrom<String> for SharedSecret {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
