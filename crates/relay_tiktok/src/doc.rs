// File: crates/relay_tiktok/src/doc.rs
#![allow(dead_code)] // Allow dead code for doc functions

#[cfg(feature = "openapi")]
use crate::handlers::{BatchDeletePayload, BatchDeleteRequest, EngagementPayload, EngagementRequest};
#[cfg(feature = "openapi")]
use crate::logic::EngagementStats;
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/tiktok/video/batch-delete",
    request_body = BatchDeleteRequest,
    responses(
        (status = 200, description = "All deletions succeeded, or the batch failure envelope", body = BatchDeletePayload),
        (status = 400, description = "Missing access token or malformed request"),
        (status = 503, description = "TikTok integration disabled")
    ),
    tag = "TikTok"
)]
fn doc_batch_delete_handler() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/tiktok/analytics/engagement",
    request_body = EngagementRequest,
    responses(
        (status = 200, description = "Computed engagement stats", body = EngagementPayload),
        (status = 400, description = "Zero views or malformed request")
    ),
    tag = "TikTok"
)]
fn doc_engagement_handler() {}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(doc_batch_delete_handler, doc_engagement_handler),
    components(schemas(BatchDeleteRequest, BatchDeletePayload, EngagementRequest, EngagementPayload, EngagementStats)),
    tags(
        (name = "TikTok", description = "TikTok content and analytics API")
    )
)]
pub struct TikTokApiDoc;
