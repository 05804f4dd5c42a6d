// --- File: crates/relay_anthropic/src/routes.rs ---

use crate::handlers::{create_message_handler, stream_message_handler, AnthropicState};
use axum::{routing::post, Router};
use relay_common::create_client;
use relay_config::AppConfig;
use std::sync::Arc;

/// Creates a router containing all routes for the Anthropic feature.
/// Mounted by the backend under `/api/anthropic`.
pub fn routes(config: Arc<AppConfig>) -> Router {
    let http = create_client(config.http_client.timeout_secs)
        .expect("Failed to create HTTP client");
    let state = Arc::new(AnthropicState { config, http });

    Router::new()
        .route("/messages", post(create_message_handler))
        .route("/messages/stream", post(stream_message_handler))
        .with_state(state)
}
