//! Route configuration and setup

use crate::handlers;
use crate::middleware::render_error_details;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware::map_response_with_state,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use shelfshot_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let body_limit = config.max_request_body_bytes();
    tracing::info!(body_limit_bytes = body_limit, "Request body limit layer enabled");

    let app = upload_routes()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(map_response_with_state(state.clone(), render_error_details))
        // The explicit limit layer below replaces axum's default 2 MB cap.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn upload_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload/product", post(handlers::upload::upload_from_url))
        .route("/upload/product/thumb", post(handlers::upload::upload_thumb))
        .route(
            "/upload/product/multiple",
            post(handlers::upload::upload_multiple),
        )
        .route("/upload/product/bucket", post(handlers::upload::upload_bucket))
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
