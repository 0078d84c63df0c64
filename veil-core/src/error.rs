/// Errors produced by the `veil-core` crate.
///
/// None of these are ever returned to an HTTP caller; they surface only while
/// building an [`Authenticator`](crate::auth::Authenticator) at startup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// The shared secret was empty.
    #[error("shared secret must not be empty")]
    EmptySecret,

    /// A time-bucket step width of zero seconds was configured.
    #[error("invalid time step {secs}s: must be at least one second")]
    InvalidTimeStep { secs: u64 },

    /// A duration does not fit the millisecond arithmetic used for drift checks.
    #[error("duration out of range: {reason}")]
    DurationOutOfRange { reason: String },
}
