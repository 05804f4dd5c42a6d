// --- File: crates/relay_redis/src/handlers.rs ---
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use relay_common::http::respond;
use relay_common::{service_disabled, RelayError};
use relay_config::{AppConfig, RedisConfig};

use crate::client::{CacheClient, ConnectionParams};

// --- State for Redis Handlers ---
#[derive(Clone)]
pub struct RedisState {
    pub config: Arc<AppConfig>,
}

/// Connection overrides accepted in any request body, alongside the
/// operation's own fields.
#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConnOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db: Option<i64>,
    pub password: Option<String>,
}

/// Resolves connection parameters with the usual precedence: body field,
/// then `x-redis-*` header, then `REDIS_*` env var, then the config
/// section, then localhost defaults.
pub fn resolve_params(
    overrides: Option<&ConnOverrides>,
    headers: &HeaderMap,
    config: Option<&RedisConfig>,
) -> ConnectionParams {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    let defaults = ConnectionParams::default();

    let host = overrides
        .and_then(|o| o.host.clone())
        .or_else(|| header("x-redis-host"))
        .or_else(|| env("REDIS_HOST"))
        .or_else(|| config.and_then(|c| c.host.clone()))
        .unwrap_or(defaults.host);
    let port = overrides
        .and_then(|o| o.port)
        .or_else(|| header("x-redis-port").and_then(|v| v.parse().ok()))
        .or_else(|| env("REDIS_PORT").and_then(|v| v.parse().ok()))
        .or_else(|| config.and_then(|c| c.port))
        .unwrap_or(defaults.port);
    let db = overrides
        .and_then(|o| o.db)
        .or_else(|| header("x-redis-db").and_then(|v| v.parse().ok()))
        .or_else(|| env("REDIS_DB").and_then(|v| v.parse().ok()))
        .or_else(|| config.and_then(|c| c.db))
        .unwrap_or(defaults.db);
    let password = overrides
        .and_then(|o| o.password.clone())
        .or_else(|| header("x-redis-password"))
        .or_else(|| env("REDIS_PASSWORD"));

    ConnectionParams {
        host,
        port,
        db,
        password,
    }
}

async fn connect(
    state: &RedisState,
    overrides: Option<&ConnOverrides>,
    headers: &HeaderMap,
) -> Result<CacheClient, RelayError> {
    let params = resolve_params(overrides, headers, state.config.redis.as_ref());
    debug!(host = %params.host, port = params.port, db = params.db, "connecting to redis");
    Ok(CacheClient::connect(&params).await?)
}

// --- Response payloads (flattened into the envelope) ---

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Ack {}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValuePayload {
    /// Null for a missing key; present either way.
    pub value: Option<Value>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExistsPayload {
    pub exists: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TtlPayload {
    pub ttl: i64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CounterPayload {
    pub value: i64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValuesPayload {
    pub values: Vec<Value>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MembersPayload {
    pub members: Vec<Value>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HashPayload {
    pub hash: serde_json::Map<String, Value>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KeysPayload {
    pub keys: Vec<String>,
}

// --- Request bodies ---

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    pub expiry_seconds: Option<u64>,
    #[serde(flatten)]
    pub conn: ConnOverrides,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExpireRequest {
    pub key: String,
    pub seconds: i64,
    #[serde(flatten)]
    pub conn: ConnOverrides,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CounterRequest {
    pub key: String,
    /// Defaults to 1.
    pub amount: Option<i64>,
    #[serde(flatten)]
    pub conn: ConnOverrides,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListPushRequest {
    pub key: String,
    pub values: Vec<Value>,
    #[serde(flatten)]
    pub conn: ConnOverrides,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KeyRequest {
    pub key: String,
    #[serde(flatten)]
    pub conn: ConnOverrides,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetAddRequest {
    pub key: String,
    pub members: Vec<Value>,
    #[serde(flatten)]
    pub conn: ConnOverrides,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HashSetRequest {
    pub key: String,
    pub field: String,
    pub value: Value,
    #[serde(flatten)]
    pub conn: ConnOverrides,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct RangeQuery {
    pub start: Option<isize>,
    pub stop: Option<isize>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct KeysQuery {
    pub pattern: Option<String>,
}

// --- Handlers ---

macro_rules! gate {
    ($state:expr) => {
        if !$state.config.use_redis {
            return service_disabled("redis-cache");
        }
    };
}

pub async fn set_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Json(request): Json<SetRequest>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, Some(&request.conn), &headers).await?;
        cache
            .set(&request.key, &request.value, request.expiry_seconds)
            .await
            .map_err(RelayError::from)?;
        Ok(Ack {})
    }
    .await;
    respond(result)
}

pub async fn get_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, None, &headers).await?;
        let value = cache.get(&key).await.map_err(RelayError::from)?;
        // A miss is a success with a null value, not an error.
        Ok(ValuePayload { value })
    }
    .await;
    respond(result)
}

pub async fn delete_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, None, &headers).await?;
        cache.delete(&key).await.map_err(RelayError::from)?;
        Ok(Ack {})
    }
    .await;
    respond(result)
}

pub async fn exists_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, None, &headers).await?;
        let exists = cache.exists(&key).await.map_err(RelayError::from)?;
        Ok(ExistsPayload { exists })
    }
    .await;
    respond(result)
}

pub async fn expire_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Json(request): Json<ExpireRequest>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, Some(&request.conn), &headers).await?;
        cache
            .expire(&request.key, request.seconds)
            .await
            .map_err(RelayError::from)?;
        Ok(Ack {})
    }
    .await;
    respond(result)
}

pub async fn ttl_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, None, &headers).await?;
        let ttl = cache.ttl(&key).await.map_err(RelayError::from)?;
        Ok(TtlPayload { ttl })
    }
    .await;
    respond(result)
}

pub async fn increment_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Json(request): Json<CounterRequest>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, Some(&request.conn), &headers).await?;
        let value = cache
            .increment(&request.key, request.amount.unwrap_or(1))
            .await
            .map_err(RelayError::from)?;
        Ok(CounterPayload { value })
    }
    .await;
    respond(result)
}

pub async fn decrement_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Json(request): Json<CounterRequest>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, Some(&request.conn), &headers).await?;
        let value = cache
            .decrement(&request.key, request.amount.unwrap_or(1))
            .await
            .map_err(RelayError::from)?;
        Ok(CounterPayload { value })
    }
    .await;
    respond(result)
}

pub async fn list_push_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Json(request): Json<ListPushRequest>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, Some(&request.conn), &headers).await?;
        cache
            .list_push(&request.key, &request.values)
            .await
            .map_err(RelayError::from)?;
        Ok(Ack {})
    }
    .await;
    respond(result)
}

pub async fn list_pop_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Json(request): Json<KeyRequest>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, Some(&request.conn), &headers).await?;
        let value = cache.list_pop(&request.key).await.map_err(RelayError::from)?;
        Ok(ValuePayload { value })
    }
    .await;
    respond(result)
}

pub async fn list_range_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, None, &headers).await?;
        let values = cache
            .list_range(&key, range.start.unwrap_or(0), range.stop.unwrap_or(-1))
            .await
            .map_err(RelayError::from)?;
        Ok(ValuesPayload { values })
    }
    .await;
    respond(result)
}

pub async fn set_add_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Json(request): Json<SetAddRequest>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, Some(&request.conn), &headers).await?;
        cache
            .set_add(&request.key, &request.members)
            .await
            .map_err(RelayError::from)?;
        Ok(Ack {})
    }
    .await;
    respond(result)
}

pub async fn set_members_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, None, &headers).await?;
        let members = cache.set_members(&key).await.map_err(RelayError::from)?;
        Ok(MembersPayload { members })
    }
    .await;
    respond(result)
}

pub async fn hash_set_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Json(request): Json<HashSetRequest>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, Some(&request.conn), &headers).await?;
        cache
            .hash_set(&request.key, &request.field, &request.value)
            .await
            .map_err(RelayError::from)?;
        Ok(Ack {})
    }
    .await;
    respond(result)
}

pub async fn hash_get_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Path((key, field)): Path<(String, String)>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, None, &headers).await?;
        let value = cache.hash_get(&key, &field).await.map_err(RelayError::from)?;
        Ok(ValuePayload { value })
    }
    .await;
    respond(result)
}

pub async fn hash_get_all_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, None, &headers).await?;
        let hash = cache.hash_get_all(&key).await.map_err(RelayError::from)?;
        Ok(HashPayload { hash })
    }
    .await;
    respond(result)
}

pub async fn keys_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    Query(query): Query<KeysQuery>,
) -> Response {
    gate!(state);
    let result = async {
        let mut cache = connect(&state, None, &headers).await?;
        let keys = cache
            .keys(query.pattern.as_deref().unwrap_or("*"))
            .await
            .map_err(RelayError::from)?;
        Ok(KeysPayload { keys })
    }
    .await;
    respond(result)
}

pub async fn flush_handler(
    State(state): State<Arc<RedisState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    gate!(state);
    let overrides: Option<ConnOverrides> = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };
    let result = async {
        let mut cache = connect(&state, overrides.as_ref(), &headers).await?;
        cache.flush_all().await.map_err(RelayError::from)?;
        Ok(Ack {})
    }
    .await;
    respond(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn body_overrides_beat_headers_and_config() {
        let mut headers = HeaderMap::new();
        headers.insert("x-redis-host", HeaderValue::from_static("header-host"));
        let overrides = ConnOverrides {
            host: Some("body-host".to_string()),
            port: None,
            db: None,
            password: None,
        };
        let config = RedisConfig {
            host: Some("config-host".to_string()),
            port: Some(6400),
            db: Some(2),
        };
        let params = resolve_params(Some(&overrides), &headers, Some(&config));
        assert_eq!(params.host, "body-host");
        // No body/header port, so the config value wins over the default.
        assert_eq!(params.port, 6400);
        assert_eq!(params.db, 2);
    }

    #[test]
    fn headers_beat_config_defaults() {
        let mut headers = HeaderMap::new();
        headers.insert("x-redis-host", HeaderValue::from_static("header-host"));
        headers.insert("x-redis-port", HeaderValue::from_static("7000"));
        let params = resolve_params(None, &headers, None);
        assert_eq!(params.host, "header-host");
        assert_eq!(params.port, 7000);
        assert_eq!(params.db, 0);
    }

    #[test]
    fn unparseable_header_port_falls_through_to_default() {
        let mut headers = HeaderMap::new();
        headers.insert("x-redis-port", HeaderValue::from_static("not-a-port"));
        let params = resolve_params(None, &headers, None);
        assert_eq!(params.port, 6379);
    }
}
