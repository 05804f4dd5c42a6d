// File: crates/relay_stripe/src/doc.rs
#![allow(dead_code)] // Allow dead code for doc functions

#[cfg(feature = "openapi")]
use crate::handlers::ReceivedPayload;
#[cfg(feature = "openapi")]
use crate::logic::StripeEvent;
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/stripe/payment_intents",
    responses(
        (status = 200, description = "Payment intent envelope (success or upstream failure)"),
        (status = 400, description = "Missing secret key or required parameter"),
        (status = 503, description = "Stripe integration disabled")
    ),
    tag = "Stripe"
)]
fn doc_create_payment_intent() {}

#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/api/stripe/webhook",
    responses(
        (status = 200, description = "Webhook received and acknowledged", body = ReceivedPayload),
        (status = 400, description = "Bad request (e.g., invalid signature, bad payload)"),
        (status = 500, description = "Webhook secret not configured")
    ),
    tag = "Stripe Webhooks"
)]
fn doc_stripe_webhook_handler() {}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(doc_create_payment_intent, doc_stripe_webhook_handler),
    components(schemas(StripeEvent, ReceivedPayload)),
    tags(
        (name = "Stripe", description = "Stripe payments API"),
        (name = "Stripe Webhooks", description = "Stripe webhook receiver")
    )
)]
pub struct StripeApiDoc;
