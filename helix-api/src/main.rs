//! Helix API Server Entry Point
//!
//! Loads configuration, builds a dry-run orchestrator and serves it over
//! Axum until Ctrl-C.

use axum::Router;
use helix_agents::Orchestrator;
use helix_api::{create_api_router, init_tracing, ApiConfig, ApiError, ApiResult, TelemetryConfig};
use helix_core::OrchestratorConfig;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let orchestrator_config = OrchestratorConfig::from_env();
    tracing::info!(
        max_parallel = orchestrator_config.max_parallel,
        default_timeout_secs = orchestrator_config.default_timeout.as_secs(),
        list_limit = orchestrator_config.default_list_limit,
        "Orchestrator configured (dry run, no LLM provider)"
    );
    let orchestrator = Orchestrator::builder()
        .config(orchestrator_config)
        .build()?;

    let api_config = ApiConfig::from_env();
    let app: Router = create_api_router(orchestrator, &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, "Starting Helix API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
