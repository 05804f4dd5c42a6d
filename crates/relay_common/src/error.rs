// --- File: crates/relay_common/src/error.rs ---
use thiserror::Error;

/// The error type shared by every dispatch path in Relay.
///
/// Client-layer code returns `Result<T, RelayError>` and propagates with `?`;
/// the envelope conversion happens exactly once, at the HTTP boundary
/// (`crate::http::respond`). No client method panics on upstream failure.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The upstream API answered with a non-2xx status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The HTTP request itself failed (connect, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The upstream response body could not be parsed.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// A required parameter or credential was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The integration is disabled or its configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code this error surfaces as.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for RelayError {
    fn status_code(&self) -> u16 {
        // Upstream, transport and parse failures are wrapper-originated: the
        // route still answers 200 and the `success:false` envelope is the
        // only failure signal. Only local errors change the status.
        match self {
            RelayError::Upstream { .. } => 200,
            RelayError::Transport(_) => 200,
            RelayError::Parse(_) => 200,
            RelayError::Validation(_) => 400,
            RelayError::Config(_) => 500,
            RelayError::Internal(_) => 500,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Parse(err.to_string())
    }
}

pub fn validation_error<T: std::fmt::Display>(message: T) -> RelayError {
    RelayError::Validation(message.to_string())
}

pub fn config_error<T: std::fmt::Display>(message: T) -> RelayError {
    RelayError::Config(message.to_string())
}

pub fn internal_error<T: std::fmt::Display>(message: T) -> RelayError {
    RelayError::Internal(message.to_string())
}
