//! API Error Types
//!
//! Structured error responses for the HTTP host. Every `HelixError` the
//! orchestrator raises maps onto an `ErrorCode` that fixes the status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use helix_core::{ConfigError, HelixError, LlmError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODES
// ============================================================================

/// Error codes returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request body or argument could not be interpreted
    InvalidInput,

    /// Required field is missing
    MissingField,

    /// Field value has the wrong shape (e.g. a malformed ID)
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    /// Requested tool is not registered
    ToolNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Operation conflicts with the entity's current state
    StateConflict,

    // ========================================================================
    // Capacity Errors (429)
    // ========================================================================
    /// Request asks for more concurrent work than allowed
    CapacityExceeded,

    // ========================================================================
    // Server Errors (5xx)
    // ========================================================================
    /// Unexpected internal failure
    InternalError,

    /// Upstream model provider unavailable
    ServiceUnavailable,

    /// Operation exceeded its deadline
    Timeout,
}

impl ErrorCode {
    /// HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::MissingField | ErrorCode::InvalidFormat => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::EntityNotFound | ErrorCode::ToolNotFound => StatusCode::NOT_FOUND,

            ErrorCode::StateConflict => StatusCode::CONFLICT,

            ErrorCode::CapacityExceeded => StatusCode::TOO_MANY_REQUESTS,

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience Constructors
    // ========================================================================

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
        .with_details(serde_json::json!({ "field": field }))
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<HelixError> for ApiError {
    fn from(err: HelixError) -> Self {
        let message = err.to_string();
        match err {
            HelixError::Validation(v) => match v {
                ValidationError::RequiredFieldMissing { field } => {
                    ApiError::new(ErrorCode::MissingField, message)
                        .with_details(serde_json::json!({ "field": field }))
                }
                ValidationError::InvalidValue { field, .. } => {
                    ApiError::new(ErrorCode::InvalidInput, message)
                        .with_details(serde_json::json!({ "field": field }))
                }
                ValidationError::CapacityExceeded { requested, max } => {
                    ApiError::new(ErrorCode::CapacityExceeded, message)
                        .with_details(serde_json::json!({ "requested": requested, "max": max }))
                }
                ValidationError::UnknownTool { name } => ApiError::new(ErrorCode::ToolNotFound, message)
                    .with_details(serde_json::json!({ "tool": name })),
                ValidationError::MalformedPayload { tool, .. } => {
                    ApiError::new(ErrorCode::InvalidFormat, message)
                        .with_details(serde_json::json!({ "tool": tool }))
                }
                ValidationError::InvalidStateTransition { .. } => {
                    ApiError::new(ErrorCode::StateConflict, message)
                }
            },
            HelixError::Storage(StorageError::NotFound { entity_type, id }) => {
                ApiError::new(ErrorCode::EntityNotFound, message).with_details(serde_json::json!({
                    "entity_type": entity_type.to_string(),
                    "id": id,
                }))
            }
            HelixError::Storage(StorageError::LockPoisoned)
            | HelixError::Storage(StorageError::TransactionFailed { .. }) => {
                ApiError::internal_error(message)
            }
            HelixError::Llm(LlmError::DeadlineExceeded { .. }) => ApiError::timeout(message),
            HelixError::Llm(_) => ApiError::new(ErrorCode::ServiceUnavailable, message),
            HelixError::Config(ConfigError::InvalidValue { field, .. }) => {
                ApiError::internal_error(message).with_details(serde_json::json!({ "field": field }))
            }
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// TESTS
// ============================================================================
