//! HTTP endpoint for the Veil SQL gateway.
//!
//! Authenticates each request with a time-windowed shared-secret token and
//! forwards one SQL statement to the configured database executor. Callers
//! that fail authentication receive a decoy page instead of an auth error.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
