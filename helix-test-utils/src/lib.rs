//! Helix Test Utilities
//!
//! Shared test infrastructure for the Helix workspace:
//! - Mock LLM provider with scripted failures and latency
//! - Proptest generators for genomes and workflow steps
//! - Fixtures for common scenarios

// Re-export core types for convenience
pub use helix_core::{
    AgentGenome, AgentRun, EntityIdType, GenomeDraft, GenomeId, HelixError, HelixResult,
    LlmError, LlmProvider, LlmRequest, Metadata, OrchestratorConfig, RunId, RunStatus,
    Timestamp, Workflow, WorkflowId, WorkflowStep,
};

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// MOCK PROVIDERS
// ============================================================================

/// Deterministic LLM provider for tests.
///
/// Replies with `"{prefix}{user_prompt}"` unless the request matches one of
/// the configured failure rules.
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    prefix: String,
    failing_models: HashSet<String>,
    failing_inputs: Vec<String>,
    latency: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `prefix` to every reply.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Fail every request addressed to `model`.
    pub fn failing_model(mut self, model: impl Into<String>) -> Self {
        self.failing_models.insert(model.into());
        self
    }

    /// Fail every request whose user prompt contains `needle`.
    pub fn failing_input(mut self, needle: impl Into<String>) -> Self {
        self.failing_inputs.push(needle.into());
        self
    }

    /// Sleep before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `generate` calls observed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in arrival order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing_models.contains(&request.model) {
            return Err(LlmError::RequestFailed {
                provider: "mock".to_string(),
                message: format!("model {} unavailable", request.model),
            });
        }
        if let Some(needle) = self
            .failing_inputs
            .iter()
            .find(|n| request.user_prompt.contains(n.as_str()))
        {
            return Err(LlmError::RequestFailed {
                provider: "mock".to_string(),
                message: format!("input rejected: contains {:?}", needle),
            });
        }

        Ok(format!("{}{}", self.prefix, request.user_prompt))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Helix entity types.

    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Generate a random GenomeId.
    pub fn arb_genome_id() -> impl Strategy<Value = GenomeId> {
        any::<[u8; 16]>().prop_map(|b| GenomeId::new(Uuid::from_bytes(b)))
    }

    /// Temperatures accepted at registration, including the unset value 0.
    pub fn arb_temperature() -> impl Strategy<Value = f64> {
        prop_oneof![Just(0.0), 0.0f64..=2.0]
    }

    pub fn arb_tool_name() -> impl Strategy<Value = String> {
        "[a-z][a-z_]{2,15}"
    }

    /// A system prompt of printable characters, sometimes multi-byte.
    pub fn arb_system_prompt() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z .,]{0,200}",
            "[a-zA-Zéü✓ ]{0,120}",
        ]
    }

    /// Generate a valid registration draft.
    pub fn arb_genome_draft() -> impl Strategy<Value = GenomeDraft> {
        (
            "[a-z]{3,12}",
            prop_oneof![Just("llama3"), Just("gpt-4o"), Just("claude")],
            arb_system_prompt(),
            prop::collection::btree_set(arb_tool_name(), 0..6),
            arb_temperature(),
            0u32..8192,
        )
            .prop_map(|(name, model, prompt, tools, temperature, max_tokens)| {
                GenomeDraft {
                    name,
                    model: model.to_string(),
                    provider: "ollama".to_string(),
                    system_prompt: prompt,
                    tools,
                    temperature,
                    max_tokens,
                    metadata: Metadata::new(),
                }
            })
    }

    /// Generate a registered genome with an arbitrary fitness.
    pub fn arb_genome() -> impl Strategy<Value = AgentGenome> {
        (arb_genome_draft(), 0.0f64..=1.0).prop_filter_map(
            "draft must validate",
            |(draft, fitness)| {
                AgentGenome::from_draft(draft).ok().map(|mut g| {
                    g.fitness = fitness;
                    g
                })
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// A config with a short default timeout so deadline tests finish quickly.
    pub fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            max_parallel: 4,
            default_timeout: Duration::from_millis(500),
            default_list_limit: 50,
        }
    }

    /// Minimal valid draft.
    pub fn writer_draft() -> GenomeDraft {
        GenomeDraft::new("writer", "llama3")
            .with_provider("ollama")
            .with_system_prompt("You are a careful technical writer who answers briefly.")
            .with_tools(["web_search", "calculator"])
    }

    /// Draft whose model the mock provider can be told to reject.
    pub fn broken_draft() -> GenomeDraft {
        GenomeDraft::new("broken", "offline-model").with_provider("ollama")
    }

    /// A registered genome built from [`writer_draft`].
    pub fn writer_genome() -> AgentGenome {
        match AgentGenome::from_draft(writer_draft()) {
            Ok(genome) => genome,
            Err(e) => panic!("writer fixture must validate: {e}"),
        }
    }
}
