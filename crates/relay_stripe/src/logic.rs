// --- File: crates/relay_stripe/src/logic.rs ---
//! The Stripe endpoint table and webhook verification.
//!
//! Stripe's API is form-encoded and basic-authenticated with the secret
//! key as the username. The table covers the payment surface the gateway
//! proxies; the webhook half verifies `Stripe-Signature` headers before a
//! payload is trusted.

use hmac::{Hmac, Mac};
use http::Method;
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use relay_common::{
    AuthScheme, BodyKind, CredentialSpec, EndpointSpec, IntegrationSpec, ParamLocation, ParamSpec,
};

use crate::error::StripeError;

pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 600; // 10 minutes

/// Stripe integration table. Routes mirror the upstream resource paths
/// under the `/api/stripe` mount.
pub static STRIPE: IntegrationSpec = IntegrationSpec {
    name: "stripe",
    base_url: "https://api.stripe.com/v1",
    auth: AuthScheme::Basic {
        user_cred: "secret_key",
        password_cred: None,
    },
    credentials: &[CredentialSpec::required(
        "secret_key",
        "x-stripe-secret-key",
        "STRIPE_SECRET_KEY",
    )],
    endpoints: &[
        EndpointSpec {
            name: "create_customer",
            method: Method::POST,
            path: "/customers",
            params: &[
                ParamSpec::required("email", ParamLocation::Body),
                ParamSpec::optional("name", ParamLocation::Body),
                ParamSpec::optional("description", ParamLocation::Body),
                ParamSpec::optional("phone", ParamLocation::Body),
            ],
            body: BodyKind::Form,
            response_key: "customer",
            response_pick: None,
        },
        EndpointSpec {
            name: "get_customer",
            method: Method::GET,
            path: "/customers/{customer_id}",
            params: &[ParamSpec::required("customer_id", ParamLocation::Path)],
            body: BodyKind::Empty,
            response_key: "customer",
            response_pick: None,
        },
        EndpointSpec {
            name: "list_customers",
            method: Method::GET,
            path: "/customers",
            params: &[
                ParamSpec::optional("limit", ParamLocation::Query),
                ParamSpec::optional("starting_after", ParamLocation::Query),
            ],
            body: BodyKind::Empty,
            // The upstream wraps the page in a list object; callers get
            // the customer array.
            response_key: "customers",
            response_pick: Some("/data"),
        },
        EndpointSpec {
            name: "delete_customer",
            method: Method::DELETE,
            path: "/customers/{customer_id}",
            params: &[ParamSpec::required("customer_id", ParamLocation::Path)],
            body: BodyKind::Empty,
            response_key: "deleted",
            response_pick: Some("/deleted"),
        },
        EndpointSpec {
            name: "create_payment_intent",
            method: Method::POST,
            path: "/payment_intents",
            params: &[
                ParamSpec::required("amount", ParamLocation::Body),
                ParamSpec::required("currency", ParamLocation::Body),
                ParamSpec::optional("description", ParamLocation::Body),
                ParamSpec::optional("customer", ParamLocation::Body),
            ],
            body: BodyKind::Form,
            response_key: "payment_intent",
            response_pick: None,
        },
        EndpointSpec {
            name: "get_payment_intent",
            method: Method::GET,
            path: "/payment_intents/{payment_intent_id}",
            params: &[ParamSpec::required("payment_intent_id", ParamLocation::Path)],
            body: BodyKind::Empty,
            response_key: "payment_intent",
            response_pick: None,
        },
        EndpointSpec {
            name: "cancel_payment_intent",
            method: Method::POST,
            path: "/payment_intents/{payment_intent_id}/cancel",
            params: &[ParamSpec::required("payment_intent_id", ParamLocation::Path)],
            body: BodyKind::Form,
            response_key: "payment_intent",
            response_pick: None,
        },
        EndpointSpec {
            name: "create_refund",
            method: Method::POST,
            path: "/refunds",
            params: &[
                ParamSpec::required("payment_intent", ParamLocation::Body),
                ParamSpec::optional("amount", ParamLocation::Body),
                ParamSpec::optional("reason", ParamLocation::Body),
            ],
            body: BodyKind::Form,
            response_key: "refund",
            response_pick: None,
        },
        EndpointSpec {
            name: "get_checkout_session",
            method: Method::GET,
            path: "/checkout/sessions/{session_id}",
            params: &[ParamSpec::required("session_id", ParamLocation::Path)],
            body: BodyKind::Empty,
            response_key: "session",
            response_pick: None,
        },
        EndpointSpec {
            name: "list_checkout_sessions",
            method: Method::GET,
            path: "/checkout/sessions",
            params: &[
                ParamSpec::optional("limit", ParamLocation::Query),
                ParamSpec::optional("starting_after", ParamLocation::Query),
                ParamSpec::optional("ending_before", ParamLocation::Query),
            ],
            body: BodyKind::Empty,
            // Kept as the whole list object: callers page with has_more.
            response_key: "sessions",
            response_pick: None,
        },
    ],
};

// --- Webhook Processing ---

/// The slice of a Stripe event the webhook handler cares about.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    pub livemode: bool,
    pub data: StripeEventData,
}

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StripeEventData {
    /// The object varies by event type, so it stays raw JSON.
    pub object: serde_json::Value,
}

/// Verifies the signature of an incoming Stripe webhook request.
///
/// The `Stripe-Signature` header carries a timestamp (`t=`) and one or
/// more `v1=` HMAC-SHA256 signatures over `"{t}.{payload}"`. Timestamps
/// older than `tolerance_secs` are rejected.
pub fn verify_stripe_signature(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
) -> Result<(), StripeError> {
    let sig_header_value = sig_header.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing Stripe-Signature header".to_string())
    })?;

    let mut timestamp_str: Option<&str> = None;
    let mut v1_signatures_hex: Vec<&str> = Vec::new();

    for item in sig_header_value.split(',') {
        let parts: Vec<&str> = item.trim().splitn(2, '=').collect();
        if parts.len() == 2 {
            match parts[0] {
                "t" => timestamp_str = Some(parts[1]),
                "v1" => v1_signatures_hex.push(parts[1]),
                _ => {} // Ignore other parts like v0
            }
        }
    }

    let timestamp_str = timestamp_str.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing timestamp 't' in Stripe-Signature".to_string())
    })?;
    let parsed_timestamp = timestamp_str.parse::<i64>().map_err(|_| {
        StripeError::WebhookSignatureError("Invalid timestamp format in Stripe-Signature".to_string())
    })?;

    if v1_signatures_hex.is_empty() {
        return Err(StripeError::WebhookSignatureError(
            "Missing v1 signature in Stripe-Signature".to_string(),
        ));
    }

    let current_timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| StripeError::WebhookSignatureError("System clock error".to_string()))?
        .as_secs() as i64;
    if (current_timestamp - parsed_timestamp).abs() > tolerance_secs {
        return Err(StripeError::WebhookSignatureError(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let signed_payload_string = format!(
        "{}.{}",
        timestamp_str,
        String::from_utf8_lossy(payload_bytes)
    );

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        StripeError::WebhookSignatureError("Invalid webhook secret format for HMAC".to_string())
    })?;
    mac.update(signed_payload_string.as_bytes());
    let calculated_signature_hex = hex::encode(mac.finalize().into_bytes());

    for provided_sig_hex in v1_signatures_hex {
        if constant_time_eq(
            calculated_signature_hex.as_bytes(),
            provided_sig_hex.as_bytes(),
        ) {
            return Ok(());
        }
    }
    Err(StripeError::WebhookSignatureError(
        "Signature mismatch".to_string(),
    ))
}

/// Helper for constant-time string comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Acknowledges a verified Stripe webhook event. The gateway proxies, it
/// does not fulfill; interesting event types are logged for operators.
pub fn process_stripe_webhook(event: &StripeEvent) -> Result<(), StripeError> {
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session_id = event.data.object.get("id").and_then(|v| v.as_str());
            let payment_status = event
                .data
                .object
                .get("payment_status")
                .and_then(|v| v.as_str());
            info!(
                event = %event.id,
                session_id,
                payment_status,
                "checkout session completed"
            );
        }
        "payment_intent.succeeded" | "payment_intent.payment_failed" => {
            let payment_intent_id = event.data.object.get("id").and_then(|v| v.as_str());
            info!(event = %event.id, event_type = %event.event_type, payment_intent_id, "payment intent update");
        }
        _ => {
            info!(event = %event.id, event_type = %event.event_type, "unhandled Stripe event type");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &str, timestamp: i64, secret: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    const SECRET: &str = "whsec_test_secret";
    const PAYLOAD: &str = r#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

    #[test]
    fn accepts_a_correctly_signed_payload() {
        let timestamp = now();
        let header = format!("t={},v1={}", timestamp, sign(PAYLOAD, timestamp, SECRET));
        verify_stripe_signature(
            PAYLOAD.as_bytes(),
            Some(&header),
            SECRET,
            DEFAULT_WEBHOOK_TOLERANCE_SECS,
        )
        .unwrap();
    }

    #[test]
    fn accepts_when_any_v1_signature_matches() {
        let timestamp = now();
        let header = format!(
            "t={},v1={},v1={}",
            timestamp,
            "0".repeat(64),
            sign(PAYLOAD, timestamp, SECRET)
        );
        verify_stripe_signature(
            PAYLOAD.as_bytes(),
            Some(&header),
            SECRET,
            DEFAULT_WEBHOOK_TOLERANCE_SECS,
        )
        .unwrap();
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let timestamp = now();
        let header = format!("t={},v1={}", timestamp, sign(PAYLOAD, timestamp, SECRET));
        let tampered = r#"{"id":"evt_1","type":"account.updated"}"#;
        let err = verify_stripe_signature(
            tampered.as_bytes(),
            Some(&header),
            SECRET,
            DEFAULT_WEBHOOK_TOLERANCE_SECS,
        )
        .unwrap_err();
        assert!(matches!(err, StripeError::WebhookSignatureError(_)));
    }

    #[test]
    fn rejects_a_stale_timestamp() {
        let timestamp = now() - 2 * DEFAULT_WEBHOOK_TOLERANCE_SECS;
        let header = format!("t={},v1={}", timestamp, sign(PAYLOAD, timestamp, SECRET));
        let err = verify_stripe_signature(
            PAYLOAD.as_bytes(),
            Some(&header),
            SECRET,
            DEFAULT_WEBHOOK_TOLERANCE_SECS,
        )
        .unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn rejects_missing_header_and_missing_parts() {
        assert!(verify_stripe_signature(PAYLOAD.as_bytes(), None, SECRET, 600).is_err());
        assert!(
            verify_stripe_signature(PAYLOAD.as_bytes(), Some("v1=abc"), SECRET, 600).is_err()
        );
        assert!(
            verify_stripe_signature(PAYLOAD.as_bytes(), Some("t=123"), SECRET, 600).is_err()
        );
    }

    #[test]
    fn table_covers_the_payment_surface() {
        for name in [
            "create_customer",
            "get_customer",
            "list_customers",
            "delete_customer",
            "create_payment_intent",
            "get_payment_intent",
            "cancel_payment_intent",
            "create_refund",
            "get_checkout_session",
            "list_checkout_sessions",
        ] {
            assert!(STRIPE.endpoint(name).is_some(), "missing endpoint {}", name);
        }
    }
}
