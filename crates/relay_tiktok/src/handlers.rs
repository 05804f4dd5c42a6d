// --- File: crates/relay_tiktok/src/handlers.rs ---
use axum::{
    extract::State,
    http::HeaderMap,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use relay_common::http::respond;
use relay_common::{service_disabled, ApiClient, CredentialBundle, RelayError};
use relay_config::AppConfig;

use crate::logic::{engagement_stats, EngagementStats, TikTokClient, TIKTOK};

// --- State for TikTok Handlers ---
#[derive(Clone)]
pub struct TikTokState {
    pub config: Arc<AppConfig>,
    pub http: reqwest::Client,
}

fn build_client(
    state: &TikTokState,
    body: Option<&serde_json::Map<String, Value>>,
    headers: &HeaderMap,
) -> Result<TikTokClient, RelayError> {
    let bundle = CredentialBundle::resolve(TIKTOK.credentials, body, headers)?;
    let base_url = state
        .config
        .tiktok
        .as_ref()
        .and_then(|t| t.base_url.clone())
        .unwrap_or_else(|| TIKTOK.base_url.to_string());
    Ok(TikTokClient::new(ApiClient::new(
        &TIKTOK,
        state.http.clone(),
        base_url,
        bundle,
    )))
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BatchDeleteRequest {
    pub video_ids: Vec<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BatchDeletePayload {
    pub results: Vec<Value>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EngagementRequest {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EngagementPayload {
    pub engagement: EngagementStats,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SummaryPayload {
    pub summary: Value,
}

/// Deletes a batch of videos concurrently. Fail-fast: any failed deletion
/// fails the whole call and no partial results are returned.
pub async fn batch_delete_handler(
    State(state): State<Arc<TikTokState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.config.use_tiktok {
        return service_disabled("tiktok");
    }
    let result = async {
        let client = build_client(&state, body.as_object(), &headers)?;
        let request: BatchDeleteRequest = serde_json::from_value(body)
            .map_err(|e| RelayError::Validation(format!("invalid batch delete request: {}", e)))?;
        let results = client.batch_delete_videos(&request.video_ids).await?;
        Ok(BatchDeletePayload { results })
    }
    .await;
    respond(result)
}

/// Pure arithmetic over caller-supplied counters; no upstream call.
pub async fn engagement_handler(
    State(state): State<Arc<TikTokState>>,
    Json(request): Json<EngagementRequest>,
) -> Response {
    if !state.config.use_tiktok {
        return service_disabled("tiktok");
    }
    let result = engagement_stats(
        request.likes,
        request.comments,
        request.shares,
        request.views,
    )
    .map(|engagement| EngagementPayload { engagement });
    respond(result)
}

/// Aggregate engagement for the authenticated creator's recent videos.
pub async fn creator_summary_handler(
    State(state): State<Arc<TikTokState>>,
    headers: HeaderMap,
) -> Response {
    if !state.config.use_tiktok {
        return service_disabled("tiktok");
    }
    let result = async {
        let client = build_client(&state, None, &headers)?;
        let summary = client.creator_summary().await?;
        Ok(SummaryPayload { summary })
    }
    .await;
    respond(result)
}
