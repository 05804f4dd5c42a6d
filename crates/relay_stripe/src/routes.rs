// --- File: crates/relay_stripe/src/routes.rs ---

use crate::handlers::{stripe_webhook_handler, StripeState};
use crate::logic::STRIPE;
use axum::{routing::post, Router};
use relay_common::{integration_routes, RouterOptions};
use relay_config::AppConfig;
use std::sync::Arc;

/// Creates a router containing all routes for the Stripe feature:
/// the table-driven payment endpoints plus the webhook receiver.
/// Mounted by the backend under `/api/stripe`.
pub fn routes(config: Arc<AppConfig>) -> Router {
    let enabled = config.use_stripe;
    let base_url = config.stripe.as_ref().and_then(|s| s.base_url.clone());

    let dispatch = integration_routes(
        &STRIPE,
        RouterOptions::from_config(&config, enabled, base_url),
    );

    let state = Arc::new(StripeState { config });
    let webhook = Router::new()
        .route("/webhook", post(stripe_webhook_handler))
        .with_state(state);

    dispatch.merge(webhook)
}
