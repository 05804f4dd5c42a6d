// File: crates/relay_anthropic/src/doc.rs
#![allow(dead_code)] // Allow dead code for doc functions

#[cfg(feature = "openapi")]
use crate::client::MessageRequest;
#[cfg(feature = "openapi")]
use crate::handlers::{ContentPayload, MessagePayload};
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/anthropic/messages",
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Message created (or upstream failure envelope)", body = MessagePayload),
        (status = 400, description = "Missing credential or malformed request"),
        (status = 503, description = "Anthropic integration disabled")
    ),
    tag = "Anthropic"
)]
fn doc_create_message_handler() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/anthropic/messages/stream",
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Accumulated streamed content", body = ContentPayload),
        (status = 400, description = "Missing credential or malformed request"),
        (status = 503, description = "Anthropic integration disabled")
    ),
    tag = "Anthropic"
)]
fn doc_stream_message_handler() {}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(doc_create_message_handler, doc_stream_message_handler),
    components(schemas(MessageRequest, MessagePayload, ContentPayload)),
    tags(
        (name = "Anthropic", description = "Anthropic Claude messages API")
    )
)]
pub struct AnthropicApiDoc;
