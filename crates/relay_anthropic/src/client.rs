// --- File: crates/relay_anthropic/src/client.rs ---
//! Anthropic messages client.
//!
//! Two call shapes: a plain request/response message, and a streamed one
//! that parses `data:` events incrementally, hands every text delta to a
//! caller-supplied callback and resolves with the full accumulated text
//! when the stream ends.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use relay_common::dispatch::extract_error_message;
use relay_common::sse::collect_sse_stream;
use relay_common::RelayError;

use crate::error::AnthropicError;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// A create-message request as accepted from callers. Everything beyond
/// `messages` is optional; the client fills model and max_tokens defaults.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageRequest {
    pub messages: Vec<Value>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub system: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub stop_sequences: Option<Vec<String>>,
    pub metadata: Option<Value>,
}

/// The outbound payload. Optional fields are skipped entirely when unset,
/// never sent as null.
#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    model: &'a str,
    messages: &'a [Value],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Value>,
    #[serde(skip_serializing_if = "is_false")]
    stream: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

pub struct AnthropicClient {
    http: Client,
    base_url: String,
    api_key: String,
    default_model: String,
    default_max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        default_model: Option<String>,
        default_max_tokens: Option<u32>,
    ) -> Self {
        AnthropicClient {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            default_model: default_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            default_max_tokens: default_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }

    fn payload<'a>(&'a self, request: &'a MessageRequest, stream: bool) -> MessagePayload<'a> {
        MessagePayload {
            model: request.model.as_deref().unwrap_or(&self.default_model),
            messages: &request.messages,
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            system: request.system.as_deref(),
            temperature: request.temperature,
            top_p: request.top_p,
            top_k: request.top_k,
            stop_sequences: request.stop_sequences.as_deref(),
            metadata: request.metadata.as_ref(),
            stream,
        }
    }

    async fn send(
        &self,
        request: &MessageRequest,
        stream: bool,
    ) -> Result<reqwest::Response, AnthropicError> {
        let url = format!("{}/messages", self.base_url);
        debug!(%url, stream, "sending Anthropic message request");
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.payload(request, stream))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnthropicError::ApiError {
                status_code: status.as_u16(),
                message: extract_error_message(status.as_u16(), &body),
            });
        }
        Ok(response)
    }

    /// Creates a message and returns the upstream response verbatim.
    pub async fn create_message(&self, request: &MessageRequest) -> Result<Value, AnthropicError> {
        let response = self.send(request, false).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Creates a streamed message. `on_delta` observes every text delta in
    /// arrival order; the returned string is their concatenation.
    pub async fn stream_message<C>(
        &self,
        request: &MessageRequest,
        on_delta: C,
    ) -> Result<String, AnthropicError>
    where
        C: FnMut(&str),
    {
        let response = self.send(request, true).await?;
        collect_sse_stream(response, content_block_delta, on_delta)
            .await
            .map_err(|err| match err {
                RelayError::Transport(msg) => AnthropicError::StreamError(msg),
                other => AnthropicError::StreamError(other.to_string()),
            })
    }
}

/// Extracts the text delta from a `content_block_delta` event; every other
/// event type is ignored.
pub fn content_block_delta(event: &Value) -> Option<String> {
    if event.get("type").and_then(Value::as_str) != Some("content_block_delta") {
        return None;
    }
    Some(
        event
            .pointer("/delta/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    )
}
