// --- File: crates/relay_common/src/routes.rs ---
//! The generic route factory: one axum route per declared endpoint.
//!
//! Credentials and call arguments both arrive with the request; the handler
//! resolves the bundle, merges body, query and path parameters into one
//! argument map and hands off to the dispatcher. The envelope comes back
//! with HTTP 200 whether the upstream call succeeded or failed; only local
//! validation (400) and configuration problems (500) change the status.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, on, MethodFilter};
use axum::{Json, Router};
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use relay_config::AppConfig;

use crate::credentials::CredentialBundle;
use crate::dispatch::{ApiClient, EndpointSpec, IntegrationSpec};
use crate::envelope::ApiResult;
use crate::http::{client, error_response};

/// Shared state for one integration's router: the integration table and
/// one pooled HTTP client. Nothing here is request-scoped.
pub struct DispatchState {
    pub spec: &'static IntegrationSpec,
    pub http: reqwest::Client,
    pub base_url: String,
    pub enabled: bool,
}

pub struct RouterOptions {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub enabled: bool,
}

impl RouterOptions {
    pub fn from_config(config: &AppConfig, enabled: bool, base_url: Option<String>) -> Self {
        RouterOptions {
            base_url,
            timeout_secs: config.http_client.timeout_secs,
            enabled,
        }
    }
}

/// Builds a router with one route per endpoint in the integration table.
pub fn integration_routes(spec: &'static IntegrationSpec, options: RouterOptions) -> Router {
    let http = client::create_client(options.timeout_secs).expect("Failed to create HTTP client");
    let state = Arc::new(DispatchState {
        spec,
        http,
        base_url: options
            .base_url
            .unwrap_or_else(|| spec.base_url.to_string()),
        enabled: options.enabled,
    });

    let mut router = Router::new();
    for ep in spec.endpoints.iter() {
        let handler = move |State(state): State<Arc<DispatchState>>,
                            Path(path_params): Path<HashMap<String, String>>,
                            Query(query_params): Query<HashMap<String, String>>,
                            headers: HeaderMap,
                            body: Bytes| async move {
            dispatch_request(ep, state, path_params, query_params, headers, body).await
        };
        router = router.route(ep.path, on(method_filter(&ep.method), handler));
    }
    router.with_state(state)
}

async fn dispatch_request(
    ep: &'static EndpointSpec,
    state: Arc<DispatchState>,
    path_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.enabled {
        return service_disabled(state.spec.name);
    }

    let request_id = Uuid::new_v4();
    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                return error_response(crate::error::validation_error(format!(
                    "invalid JSON body: {}",
                    e
                )))
            }
        }
    };
    let body_map = body.as_ref().and_then(Value::as_object);

    let bundle = match CredentialBundle::resolve(state.spec.credentials, body_map, &headers) {
        Ok(bundle) => bundle,
        Err(err) => return error_response(err),
    };

    // Body fields first, query then path parameters on top.
    let mut args: Map<String, Value> = body_map.cloned().unwrap_or_default();
    for (key, value) in query_params {
        args.insert(key, Value::String(value));
    }
    for (key, value) in path_params {
        args.insert(key, Value::String(value));
    }

    debug!(
        integration = state.spec.name,
        endpoint = ep.name,
        %request_id,
        "handling dispatch request"
    );

    let client = ApiClient::new(
        state.spec,
        state.http.clone(),
        state.base_url.clone(),
        bundle,
    );
    match client.call(ep, &args).await {
        Ok(value) => (
            StatusCode::OK,
            Json(ApiResult::keyed(ep.response_key, value)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

/// 503 answer for a disabled integration, in the standard envelope.
pub fn service_disabled(name: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResult::<Value>::err(format!(
            "{} integration is disabled",
            name
        ))),
    )
        .into_response()
}

fn method_filter(method: &Method) -> MethodFilter {
    if *method == Method::GET {
        MethodFilter::GET
    } else if *method == Method::POST {
        MethodFilter::POST
    } else if *method == Method::PUT {
        MethodFilter::PUT
    } else if *method == Method::PATCH {
        MethodFilter::PATCH
    } else if *method == Method::DELETE {
        MethodFilter::DELETE
    } else {
        MethodFilter::POST
    }
}

/// Creates a router containing routes common to the whole gateway.
pub fn routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
