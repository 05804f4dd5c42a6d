// --- File: crates/relay_stripe/src/error.rs ---
use relay_common::RelayError;
use thiserror::Error;

/// Stripe-specific error types.
#[derive(Error, Debug)]
pub enum StripeError {
    /// Webhook signature verification failed
    #[error("Stripe webhook signature verification failed: {0}")]
    WebhookSignatureError(String),

    /// Webhook event processing error
    #[error("Stripe webhook event processing error: {0}")]
    WebhookProcessingError(String),

    /// Missing or incomplete Stripe configuration
    #[error("Stripe configuration missing or incomplete: {0}")]
    ConfigError(String),
}

/// Convert StripeError to RelayError. Signature failures are the caller's
/// problem (400), configuration gaps are ours (500).
impl From<StripeError> for RelayError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::WebhookSignatureError(msg) => {
                RelayError::Validation(format!("invalid webhook signature: {}", msg))
            }
            StripeError::WebhookProcessingError(msg) => RelayError::Internal(msg),
            StripeError::ConfigError(msg) => RelayError::Config(msg),
        }
    }
}
