// --- File: crates/relay_stripe/src/handlers.rs ---
use axum::{
    extract::State,
    http::HeaderMap,
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use relay_common::http::respond;
use relay_common::{service_disabled, RelayError};
use relay_config::AppConfig;

use crate::error::StripeError;
use crate::logic::{
    process_stripe_webhook, verify_stripe_signature, StripeEvent,
    DEFAULT_WEBHOOK_TOLERANCE_SECS,
};

// --- State for Stripe Handlers ---
#[derive(Clone)]
pub struct StripeState {
    pub config: Arc<AppConfig>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReceivedPayload {
    pub received: bool,
}

/// Axum handler for Stripe server-to-server webhooks.
///
/// The raw body is needed for signature verification, so the event is only
/// deserialized after the signature checks out.
pub async fn stripe_webhook_handler(
    State(state): State<Arc<StripeState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !state.config.use_stripe {
        return service_disabled("stripe");
    }

    let result = (|| {
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET").map_err(|_| {
            RelayError::from(StripeError::ConfigError(
                "STRIPE_WEBHOOK_SECRET environment variable not set".to_string(),
            ))
        })?;
        let tolerance = state
            .config
            .stripe
            .as_ref()
            .and_then(|s| s.webhook_tolerance_secs)
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS);

        let sig_header = headers
            .get("Stripe-Signature")
            .and_then(|h| h.to_str().ok());
        verify_stripe_signature(body.as_bytes(), sig_header, &webhook_secret, tolerance)
            .map_err(|e| {
                warn!(error = %e, "Stripe webhook signature verification failed");
                RelayError::from(e)
            })?;

        let event: StripeEvent = serde_json::from_str(&body).map_err(|e| {
            RelayError::Validation(format!("invalid webhook payload: {}", e))
        })?;
        info!(event = %event.id, event_type = %event.event_type, "Stripe webhook verified");
        process_stripe_webhook(&event).map_err(RelayError::from)?;
        Ok(ReceivedPayload { received: true })
    })();
    respond(result)
}
