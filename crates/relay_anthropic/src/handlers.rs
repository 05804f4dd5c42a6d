// --- File: crates/relay_anthropic/src/handlers.rs ---
use axum::{
    extract::State,
    http::HeaderMap,
    response::Response,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use relay_common::http::respond;
use relay_common::{
    service_disabled, validation_error, CredentialBundle, CredentialSpec, RelayError,
};
use relay_config::AppConfig;

use crate::client::{AnthropicClient, MessageRequest, DEFAULT_BASE_URL};

// --- State for Anthropic Handlers ---
#[derive(Clone)]
pub struct AnthropicState {
    pub config: Arc<AppConfig>,
    pub http: reqwest::Client,
}

static CREDENTIALS: &[CredentialSpec] = &[CredentialSpec::required(
    "api_key",
    "x-anthropic-api-key",
    "ANTHROPIC_API_KEY",
)];

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessagePayload {
    pub message: Value,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContentPayload {
    pub content: String,
}

fn build_client(
    state: &AnthropicState,
    body: &Value,
    headers: &HeaderMap,
) -> Result<AnthropicClient, RelayError> {
    let bundle = CredentialBundle::resolve(CREDENTIALS, body.as_object(), headers)?;
    let config = state.config.anthropic.clone().unwrap_or_default();
    Ok(AnthropicClient::new(
        state.http.clone(),
        config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        bundle.expect("api_key")?,
        config.default_model,
        config.default_max_tokens,
    ))
}

fn parse_request(body: Value) -> Result<MessageRequest, RelayError> {
    serde_json::from_value(body)
        .map_err(|e| validation_error(format!("invalid message request: {}", e)))
}

/// Axum handler for a plain (non-streaming) message.
pub async fn create_message_handler(
    State(state): State<Arc<AnthropicState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.config.use_anthropic {
        return service_disabled("anthropic");
    }
    let result = async {
        let client = build_client(&state, &body, &headers)?;
        let request = parse_request(body)?;
        let message = client
            .create_message(&request)
            .await
            .map_err(RelayError::from)?;
        Ok(MessagePayload { message })
    }
    .await;
    respond(result)
}

/// Axum handler for a streamed message. The stream is consumed server-side
/// chunk by chunk; the caller receives the accumulated text.
pub async fn stream_message_handler(
    State(state): State<Arc<AnthropicState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.config.use_anthropic {
        return service_disabled("anthropic");
    }
    let result = async {
        let client = build_client(&state, &body, &headers)?;
        let request = parse_request(body)?;
        let mut chunks = 0usize;
        let content = client
            .stream_message(&request, |_delta| chunks += 1)
            .await
            .map_err(RelayError::from)?;
        debug!(chunks, length = content.len(), "anthropic stream finished");
        Ok(ContentPayload { content })
    }
    .await;
    respond(result)
}
