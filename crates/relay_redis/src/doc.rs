// File: crates/relay_redis/src/doc.rs
#![allow(dead_code)] // Allow dead code for doc functions

#[cfg(feature = "openapi")]
use crate::handlers::{SetRequest, ValuePayload};
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

// Dummy functions carrying the handler attributes for utoipa
#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/redis-cache/set",
    request_body = SetRequest,
    responses(
        (status = 200, description = "Value stored"),
        (status = 503, description = "Redis integration disabled")
    ),
    tag = "Redis Cache"
)]
fn doc_set_handler() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    get,
    path = "/api/redis-cache/get/{key}",
    params(("key" = String, Path, description = "Cache key")),
    responses(
        (status = 200, description = "Value, or null for a missing key", body = ValuePayload),
        (status = 503, description = "Redis integration disabled")
    ),
    tag = "Redis Cache"
)]
fn doc_get_handler() {}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(doc_set_handler, doc_get_handler),
    components(schemas(SetRequest, ValuePayload)),
    tags(
        (name = "Redis Cache", description = "Redis caching and real-time data")
    )
)]
pub struct RedisApiDoc;
