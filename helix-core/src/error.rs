//! Error types for Helix operations

use crate::EntityType;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Orchestrator state lock poisoned")]
    LockPoisoned,

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },
}

/// LLM provider errors.
///
/// These never escape `run_agent`; they are recorded on the failed run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("Request to {provider} failed: {message}")]
    RequestFailed { provider: String, message: String },

    #[error("Deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Too many agents: requested {requested}, max {max}")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Malformed payload for {tool}: {reason}")]
    MalformedPayload { tool: String, reason: String },

    #[error("Invalid transition for {entity_type} {id}: {from} -> {to}")]
    InvalidStateTransition {
        entity_type: EntityType,
        id: String,
        from: String,
        to: String,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Helix errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HelixError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl HelixError {
    /// Shorthand for a missing required field.
    pub fn missing_field(field: &str) -> Self {
        ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        }
        .into()
    }

    /// Shorthand for an invalid field value.
    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
        .into()
    }

    /// Shorthand for an entity lookup that found nothing.
    pub fn not_found(entity_type: EntityType, id: impl ToString) -> Self {
        StorageError::NotFound {
            entity_type,
            id: id.to_string(),
        }
        .into()
    }

    /// True when the error is a failed lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HelixError::Storage(StorageError::NotFound { .. }))
    }
}

/// Result type alias for Helix operations.
pub type HelixResult<T> = Result<T, HelixError>;

// =============================================================================
// TESTS
// =============================================================================
