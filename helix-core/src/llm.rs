//! LLM provider abstraction.
//!
//! The engine only knows how to hand a prompt to something that returns text.
//! Concrete backends are supplied by the embedding application.

use crate::{AgentGenome, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUEST
// ============================================================================

/// A single generation request built from a genome and a user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub provider: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl LlmRequest {
    /// Build a request with the genome's effective sampling parameters.
    pub fn for_genome(genome: &AgentGenome, input: impl Into<String>) -> Self {
        Self {
            model: genome.model.clone(),
            provider: genome.provider.clone(),
            system_prompt: genome.system_prompt.clone(),
            user_prompt: input.into(),
            temperature: genome.effective_temperature(),
            max_tokens: genome.effective_max_tokens(),
        }
    }
}

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// Trait for text generation backends.
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
/// ```ignore
/// struct OllamaProvider { /* ... */ }
///
/// #[async_trait]
/// impl LlmProvider for OllamaProvider {
///     async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError> {
///         // POST to the local Ollama server
///     }
/// }
/// ```
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for the request.
    ///
    /// # Returns
    /// * `Ok(String)` - The generated text
    /// * `Err(LlmError)` - If the backend fails; recorded on the run
    async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError>;

    /// Identifier used in logs.
    fn provider_name(&self) -> &str {
        "custom"
    }
}
