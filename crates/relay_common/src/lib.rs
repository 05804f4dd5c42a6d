// --- File: crates/relay_common/src/lib.rs ---

// Declare modules within this crate
pub mod batch; // Fail-fast concurrent fan-out
pub mod credentials; // Credential bundle resolution
pub mod dispatch; // Data-driven API client
pub mod envelope; // Uniform result envelope
pub mod error; // Error handling
pub mod features; // Feature flag handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod routes; // Generic route factory + common routes
pub mod sse; // SSE stream collection

// Re-export the common routes for the backend service
pub use routes::{integration_routes, routes, service_disabled, RouterOptions};

// Re-export the core vocabulary for integration crates
pub use credentials::{CredentialBundle, CredentialSpec};
pub use dispatch::{
    extract_error_message, ApiClient, AuthScheme, BodyKind, EndpointSpec, IntegrationSpec,
    ParamLocation, ParamSpec, ParamStyle,
};
pub use envelope::ApiResult;
pub use error::{config_error, internal_error, validation_error, HttpStatusCode, RelayError};

// Re-export HTTP utilities
pub use http::{
    client::{create_client, DEFAULT_TIMEOUT_SECS, HTTP_CLIENT},
    error_response, respond,
};

// Re-export feature flag handling
pub use features::is_feature_enabled;

// Re-export helpers used by streaming and batching integrations
pub use batch::batch_all;
pub use sse::{collect_sse_stream, SseCollector};
