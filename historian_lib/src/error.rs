//! Error types for the historian client.

use thiserror::Error;

/// Base error type for historian operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("request failed: {0}")]
    Http(#[from] HttpError),

    #[error("invalid argument: {0}")]
    Validation(String),

    #[error("invalid timestamp: {0}")]
    Time(#[from] TimeError),

    #[error("{0}")]
    Other(String),
}

/// Raised when the login endpoint rejects the credential exchange.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Raised when a data endpoint returns a non-2xx status.
#[derive(Error, Debug)]
#[error("server returned status {status}")]
pub struct HttpError {
    pub status: u16,
    pub body: Option<String>,
}

impl HttpError {
    pub fn new(status: u16, body: Option<String>) -> Self {
        Self { status, body }
    }
}

/// Raised when timestamp normalization cannot make sense of its input.
#[derive(Error, Debug)]
#[error("unrecognized date/time: {input}")]
pub struct TimeError {
    pub input: String,
}
