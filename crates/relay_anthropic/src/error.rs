// --- File: crates/relay_anthropic/src/error.rs ---
use relay_common::RelayError;
use thiserror::Error;

/// Anthropic-specific error types.
#[derive(Error, Debug)]
pub enum AnthropicError {
    /// Error occurred during the HTTP request
    #[error("Anthropic API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the Anthropic API
    #[error("{message}")]
    ApiError { status_code: u16, message: String },

    /// Error parsing an API response
    #[error("Failed to parse Anthropic API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The streamed response broke mid-flight
    #[error("Anthropic stream error: {0}")]
    StreamError(String),
}

/// Convert AnthropicError to RelayError for the envelope boundary.
impl From<AnthropicError> for RelayError {
    fn from(err: AnthropicError) -> Self {
        match err {
            AnthropicError::RequestError(e) => RelayError::Transport(e.to_string()),
            AnthropicError::ApiError {
                status_code,
                message,
            } => RelayError::Upstream {
                status: status_code,
                message,
            },
            AnthropicError::ParseError(e) => RelayError::Parse(e.to_string()),
            AnthropicError::StreamError(msg) => RelayError::Transport(msg),
        }
    }
}
