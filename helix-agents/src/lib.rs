//! Helix Agents - Execution & Evolution Engine
//!
//! Manages a population of agent genomes and everything done with them:
//! - Genome registry (register, list, get, delete)
//! - Run ledger (status, output and fitness of every execution)
//! - Execution engine (single and fan-out runs against an [`LlmProvider`])
//! - Workflow engine (sequential chains with output substitution)
//! - Evolutionary optimizer (mutation, crossover, elitism)
//! - Tool dispatch (tool name + JSON payload in, JSON out)
//!
//! All state lives in one arena behind a single reader/writer lock. The lock
//! is never held across an LLM call.

mod evolution;
mod execution;
mod ledger;
mod registry;
mod state;
mod tools;
mod workflow;

pub use evolution::{
    crossover, mutate, EvaluationRequest, EvolutionParams, EvolutionReport, FitnessEvaluator,
    SimulatedFitness, DEFAULT_CROSSOVER_RATE, DEFAULT_GENERATIONS, DEFAULT_MUTATION_RATE,
    DEFAULT_POPULATION_SIZE, PERSISTED_TOP_N,
};
pub use execution::{dry_run_output, ParallelSlot};
pub use state::StateCounts;
pub use tools::{canonical_tool_name, tool_definitions, ToolDefinition, TOOL_PREFIX};
pub use workflow::{WorkflowOutcome, INITIAL_INPUT_KEY};

use helix_core::{HelixResult, LlmProvider, OrchestratorConfig};
use state::OrchestratorState;
use std::sync::{Arc, RwLock};

// ============================================================================
// ORCHESTRATOR HANDLE
// ============================================================================

/// Cloneable handle to one engine instance.
///
/// Clones share the same state, provider and fitness evaluator.
#[derive(Clone)]
pub struct Orchestrator {
    state: Arc<RwLock<OrchestratorState>>,
    provider: Option<Arc<dyn LlmProvider>>,
    fitness: Arc<dyn FitnessEvaluator>,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("provider", &self.provider.as_ref().map(|p| p.provider_name().to_string()))
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Start building an engine.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Engine with default config, no provider (dry-run) and simulated fitness.
    pub fn dry_run() -> Self {
        Self {
            state: Arc::new(RwLock::new(OrchestratorState::default())),
            provider: None,
            fitness: Arc::new(SimulatedFitness),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// True when runs produce placeholder output instead of calling an LLM.
    pub fn is_dry_run(&self) -> bool {
        self.provider.is_none()
    }
}

/// Builder for [`Orchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    fitness: Option<Arc<dyn FitnessEvaluator>>,
    config: Option<OrchestratorConfig>,
}

impl OrchestratorBuilder {
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn fitness(mut self, evaluator: Arc<dyn FitnessEvaluator>) -> Self {
        self.fitness = Some(evaluator);
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate the config and build the engine.
    pub fn build(self) -> HelixResult<Orchestrator> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Orchestrator {
            state: Arc::new(RwLock::new(OrchestratorState::default())),
            provider: self.provider,
            fitness: self.fitness.unwrap_or_else(|| Arc::new(SimulatedFitness)),
            config,
        })
    }
}
