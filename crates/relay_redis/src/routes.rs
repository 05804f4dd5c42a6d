// --- File: crates/relay_redis/src/routes.rs ---

use crate::handlers::{
    decrement_handler, delete_handler, exists_handler, expire_handler, flush_handler,
    get_handler, hash_get_all_handler, hash_get_handler, hash_set_handler, increment_handler,
    keys_handler, list_pop_handler, list_push_handler, list_range_handler, set_add_handler,
    set_handler, set_members_handler, ttl_handler, RedisState,
};
use axum::{
    routing::{delete, get, post},
    Router,
};
use relay_config::AppConfig;
use std::sync::Arc;

/// Creates a router containing all routes for the Redis cache feature.
/// Mounted by the backend under `/api/redis-cache`.
pub fn routes(config: Arc<AppConfig>) -> Router {
    let redis_state = Arc::new(RedisState { config });

    Router::new()
        .route("/set", post(set_handler))
        .route("/get/{key}", get(get_handler))
        .route("/delete/{key}", delete(delete_handler))
        .route("/exists/{key}", get(exists_handler))
        .route("/expire", post(expire_handler))
        .route("/ttl/{key}", get(ttl_handler))
        .route("/increment", post(increment_handler))
        .route("/decrement", post(decrement_handler))
        .route("/list/push", post(list_push_handler))
        .route("/list/pop", post(list_pop_handler))
        .route("/list/range/{key}", get(list_range_handler))
        .route("/set/add", post(set_add_handler))
        .route("/set/members/{key}", get(set_members_handler))
        .route("/hash/set", post(hash_set_handler))
        .route("/hash/get/{key}/{field}", get(hash_get_handler))
        .route("/hash/getall/{key}", get(hash_get_all_handler))
        .route("/keys", get(keys_handler))
        .route("/flush", post(flush_handler))
        .with_state(redis_state)
}
