//! Helix API - HTTP host for the orchestrator's tool dispatcher
//!
//! Serves the MCP tool surface (`/mcp/tools/list`, `/mcp/tools/call`) and
//! health checks over Axum. All orchestration lives in `helix-agents`; this
//! crate only translates HTTP to tool calls and errors to responses.

pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

pub use config::{ApiConfig, LogFormat, TelemetryConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use telemetry::init_tracing;
