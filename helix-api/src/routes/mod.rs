//! Route assembly.

pub mod health;
pub mod mcp;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use helix_agents::Orchestrator;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;

/// Build the full HTTP router: `/mcp/*` and `/health/*`.
pub fn create_api_router(orchestrator: Orchestrator, config: &ApiConfig) -> Router {
    Router::new()
        .nest("/mcp", mcp::create_router(orchestrator.clone()))
        .nest("/health", health::create_router(orchestrator))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// In development mode (empty origins) every origin is allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.is_dev_mode() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        cors.allow_origin(origins)
    }
}
