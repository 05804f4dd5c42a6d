// File: services/relay_backend/src/main.rs
use axum::{routing::get, Router};
use relay_config::load_config;
#[cfg(feature = "anthropic")]
use relay_anthropic::routes as anthropic_routes;
#[cfg(feature = "redis")]
use relay_redis::routes as redis_routes;
#[cfg(feature = "stripe")]
use relay_stripe::routes as stripe_routes;
#[cfg(feature = "tiktok")]
use relay_tiktok::routes as tiktok_routes;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    relay_common::logging::init();
    let config = Arc::new(load_config().expect("Failed to load config"));

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Relay API!" }))
        .merge(relay_common::routes());

    #[cfg(feature = "redis")]
    let redis_router = redis_routes(config.clone());
    #[cfg(feature = "anthropic")]
    let anthropic_router = anthropic_routes(config.clone());
    #[cfg(feature = "stripe")]
    let stripe_router = stripe_routes(config.clone());
    #[cfg(feature = "tiktok")]
    let tiktok_router = tiktok_routes(config.clone());

    // Every integration mounts under its own /api prefix.
    let api_router = Router::new().nest("/api", {
        #[allow(unused_mut)] // for the features it needs to be mutable
        let mut router = api_router;
        #[cfg(feature = "redis")]
        {
            router = router.nest("/redis-cache", redis_router);
        }
        #[cfg(feature = "anthropic")]
        {
            router = router.nest("/anthropic", anthropic_router);
        }
        #[cfg(feature = "stripe")]
        {
            router = router.nest("/stripe", stripe_router);
        }
        #[cfg(feature = "tiktok")]
        {
            router = router.nest("/tiktok", tiktok_router);
        }
        router
    });

    #[allow(unused_mut)]
    let mut app = api_router;

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        #[cfg(feature = "anthropic")]
        use relay_anthropic::doc::AnthropicApiDoc;
        #[cfg(feature = "redis")]
        use relay_redis::doc::RedisApiDoc;
        #[cfg(feature = "stripe")]
        use relay_stripe::doc::StripeApiDoc;
        #[cfg(feature = "tiktok")]
        use relay_tiktok::doc::TikTokApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Relay API",
                version = "0.1.0",
                description = "Relay integration gateway API docs",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            components(),
            tags( (name = "Relay", description = "Core gateway endpoints")),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        #[allow(unused_mut)] // for the features it needs to be mutable
        let mut openapi_doc = ApiDoc::openapi();
        #[cfg(feature = "redis")]
        openapi_doc.merge(RedisApiDoc::openapi());
        #[cfg(feature = "anthropic")]
        openapi_doc.merge(AnthropicApiDoc::openapi());
        #[cfg(feature = "stripe")]
        openapi_doc.merge(StripeApiDoc::openapi());
        #[cfg(feature = "tiktok")]
        openapi_doc.merge(TikTokApiDoc::openapi());
        tracing::info!("Adding Swagger UI at /api/docs");

        let swagger_ui =
            SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc.clone());
        app = app.merge(swagger_ui);
    }

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind address");
    tracing::info!("Starting server at http://{}", addr);
    tracing::info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
