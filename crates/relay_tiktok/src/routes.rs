// --- File: crates/relay_tiktok/src/routes.rs ---

use crate::handlers::{
    batch_delete_handler, creator_summary_handler, engagement_handler, TikTokState,
};
use crate::logic::TIKTOK;
use axum::{
    routing::{get, post},
    Router,
};
use relay_common::{create_client, integration_routes, RouterOptions};
use relay_config::AppConfig;
use std::sync::Arc;

/// Creates a router containing all routes for the TikTok feature: the
/// table-driven endpoints plus the batch/analytics helpers.
/// Mounted by the backend under `/api/tiktok`.
pub fn routes(config: Arc<AppConfig>) -> Router {
    let enabled = config.use_tiktok;
    let base_url = config.tiktok.as_ref().and_then(|t| t.base_url.clone());

    let dispatch = integration_routes(
        &TIKTOK,
        RouterOptions::from_config(&config, enabled, base_url),
    );

    let http = create_client(config.http_client.timeout_secs)
        .expect("Failed to create HTTP client");
    let state = Arc::new(TikTokState { config, http });
    let helpers = Router::new()
        .route("/video/batch-delete", post(batch_delete_handler))
        .route("/analytics/engagement", post(engagement_handler))
        .route("/creator/summary", get(creator_summary_handler))
        .with_state(state);

    dispatch.merge(helpers)
}
