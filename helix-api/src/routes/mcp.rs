//! MCP (Model Context Protocol) Routes
//!
//! Exposes the orchestrator's tool dispatcher over the MCP tool surface.
//!
//! Endpoints:
//! - POST /mcp/initialize - Initialize MCP session
//! - GET /mcp/tools/list - List available tools
//! - POST /mcp/tools/call - Execute a tool

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use helix_agents::Orchestrator;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};

// ============================================================================
// MCP PROTOCOL TYPES
// ============================================================================

/// MCP Protocol version we support.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP Initialize request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Protocol version requested by client
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: JsonValue,
    pub client_info: ClientInfo,
}

/// Client information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// MCP Initialize response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResponse {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

/// Server capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

/// Tools capability details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsCapability {
    /// Whether list changed notifications are supported
    #[serde(default)]
    pub list_changed: bool,
}

/// Server information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// MCP Tool definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// JSON Schema for input parameters
    pub input_schema: JsonValue,
}

/// List tools response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResponse {
    pub tools: Vec<Tool>,
}

/// Call tool request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: JsonValue,
}

/// Call tool response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

/// Content block in tool response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Clone)]
pub struct McpState {
    pub orchestrator: Orchestrator,
}

impl McpState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// POST /mcp/initialize
pub async fn initialize(Json(req): Json<InitializeRequest>) -> impl IntoResponse {
    tracing::info!(
        client = %req.client_info.name,
        client_version = %req.client_info.version,
        requested = %req.protocol_version,
        "MCP session initialized"
    );

    Json(InitializeResponse {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities::default(),
        server_info: ServerInfo {
            name: "helix-orchestrator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    })
}

/// GET /mcp/tools/list
pub async fn list_tools(State(state): State<Arc<McpState>>) -> impl IntoResponse {
    let tools = state
        .orchestrator
        .list_tools()
        .into_iter()
        .map(|def| Tool {
            name: def.name,
            description: def.description,
            input_schema: def.input_schema,
        })
        .collect();

    Json(ListToolsResponse { tools })
}

/// POST /mcp/tools/call
///
/// Orchestrator errors come back as `is_error: true` content; only a request
/// without a tool name is rejected outright.
pub async fn call_tool(
    State(state): State<Arc<McpState>>,
    Json(req): Json<CallToolRequest>,
) -> ApiResult<Json<CallToolResponse>> {
    if req.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    tracing::debug!(tool = %req.name, "MCP tool call");

    let result = state
        .orchestrator
        .execute_tool(&req.name, req.arguments)
        .await
        .map_err(ApiError::from);

    match result {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| value.to_string());
            Ok(Json(CallToolResponse {
                content: vec![ContentBlock::Text { text }],
                is_error: false,
            }))
        }
        Err(e) => {
            tracing::debug!(tool = %req.name, code = %e.code, "MCP tool call rejected");
            Ok(Json(CallToolResponse {
                content: vec![ContentBlock::Text {
                    text: format!("Error: {}", e.message),
                }],
                is_error: true,
            }))
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the MCP router.
pub fn create_router(orchestrator: Orchestrator) -> Router {
    let state = Arc::new(McpState::new(orchestrator));

    Router::new()
        .route("/initialize", post(initialize))
        .route("/tools/list", get(list_tools))
        .route("/tools/call", post(call_tool))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_block_is_tagged() {
        let block = ContentBlock::Text {
            text: "hi".to_string(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "text", "text": "hi" }));
    }

    #[test]
    fn test_call_tool_request_defaults_arguments() {
        let req: CallToolRequest =
            serde_json::from_str(r#"{ "name": "orchestrator_list_agents" }"#).unwrap();
        assert!(req.arguments.is_null());
    }
}
