//! Slow-control historian API client library.
//!
//! Provides a credential-managed client for the historian REST service:
//! login/token exchange, latest-value reads for sensor and PMT channels,
//! and historical range queries.

pub mod client;
pub mod credentials;
pub mod error;
pub mod helpers;

pub use client::HistorianClient;
pub use credentials::{CredentialSource, Terminal, PASSWORD_ENV, USERNAME_ENV};
pub use error::{AuthError, Error, HttpError, TimeError};
pub use helpers::{parse_time, to_unix_seconds, TimeSpec};

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
