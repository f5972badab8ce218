//! Entity types: genomes, runs and workflows.

use crate::{
    GenomeId, HelixError, HelixResult, RunId, Timestamp, ValidationError, WorkflowId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Free-form metadata attached to genomes and runs.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Fitness assigned to a genome at registration and to crossover children.
pub const DEFAULT_FITNESS: f64 = 0.5;

/// Sampling temperature used when a genome leaves it unset (0).
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Token budget used when a genome leaves it unset (0).
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Upper bound for a genome's sampling temperature.
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Entity type discriminator for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Genome,
    Run,
    Workflow,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Genome => "genome",
            EntityType::Run => "run",
            EntityType::Workflow => "workflow",
        };
        f.write_str(name)
    }
}

// ============================================================================
// GENOMES
// ============================================================================

/// Caller-supplied fields for registering a genome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenomeDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub tools: BTreeSet<String>,
    /// 0 means "use the engine default".
    #[serde(default)]
    pub temperature: f64,
    /// 0 means "use the engine default".
    #[serde(default)]
    pub max_tokens: u32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl GenomeDraft {
    /// Create a draft with only the required fields set.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Validate the draft before it becomes a genome.
    pub fn validate(&self) -> HelixResult<()> {
        if self.name.trim().is_empty() {
            return Err(HelixError::missing_field("name"));
        }
        if self.model.trim().is_empty() {
            return Err(HelixError::missing_field("model"));
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(HelixError::invalid_value(
                "temperature",
                format!("{} is outside [0, {}]", self.temperature, MAX_TEMPERATURE),
            ));
        }
        Ok(())
    }
}

/// A versioned agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentGenome {
    pub id: GenomeId,
    pub name: String,
    pub model: String,
    /// Backend tag, informational only.
    pub provider: String,
    pub system_prompt: String,
    /// Enabled tool names.
    pub tools: BTreeSet<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub metadata: Metadata,
    pub created_at: Timestamp,
    /// Conventionally in [0, 1].
    pub fitness: f64,
    /// Evolutionary round that produced this genome; 0 for registrations.
    pub generation: u32,
    pub parent_ids: Vec<GenomeId>,
}

impl AgentGenome {
    /// Build a generation-0 genome from a validated draft.
    pub fn from_draft(draft: GenomeDraft) -> HelixResult<Self> {
        draft.validate()?;
        Ok(Self {
            id: GenomeId::now_v7(),
            name: draft.name,
            model: draft.model,
            provider: draft.provider,
            system_prompt: draft.system_prompt,
            tools: draft.tools,
            temperature: draft.temperature,
            max_tokens: draft.max_tokens,
            metadata: draft.metadata,
            created_at: Utc::now(),
            fitness: DEFAULT_FITNESS,
            generation: 0,
            parent_ids: Vec::new(),
        })
    }

    /// Copy this genome under a fresh identity.
    ///
    /// Lineage fields are left untouched; callers set them.
    pub fn clone_as_new(&self) -> Self {
        Self {
            id: GenomeId::now_v7(),
            created_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Temperature passed to the LLM; 0 falls back to [`DEFAULT_TEMPERATURE`].
    pub fn effective_temperature(&self) -> f64 {
        if self.temperature == 0.0 {
            DEFAULT_TEMPERATURE
        } else {
            self.temperature
        }
    }

    /// Token budget passed to the LLM; 0 falls back to [`DEFAULT_MAX_TOKENS`].
    pub fn effective_max_tokens(&self) -> u32 {
        if self.max_tokens == 0 {
            DEFAULT_MAX_TOKENS
        } else {
            self.max_tokens
        }
    }
}

// ============================================================================
// RUNS
// ============================================================================

/// Status of an execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One execution attempt of a genome against an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRun {
    pub run_id: RunId,
    /// May dangle once the genome is deleted.
    pub genome_id: GenomeId,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness: Option<f64>,
    pub started_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: Metadata,
}

impl AgentRun {
    /// Open a new run in the `running` state.
    pub fn start(genome_id: GenomeId, input: impl Into<String>) -> Self {
        Self {
            run_id: RunId::now_v7(),
            genome_id,
            input: input.into(),
            output: None,
            status: RunStatus::Running,
            fitness: None,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
            metadata: Metadata::new(),
        }
    }

    /// Transition `running -> completed`.
    pub fn complete(&mut self, output: impl Into<String>) -> HelixResult<()> {
        self.transition(RunStatus::Completed)?;
        self.output = Some(output.into());
        Ok(())
    }

    /// Transition `running -> failed`.
    pub fn fail(&mut self, error: impl Into<String>) -> HelixResult<()> {
        self.transition(RunStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    fn transition(&mut self, to: RunStatus) -> HelixResult<()> {
        if self.status.is_terminal() {
            return Err(ValidationError::InvalidStateTransition {
                entity_type: EntityType::Run,
                id: self.run_id.to_string(),
                from: self.status.to_string(),
                to: to.to_string(),
            }
            .into());
        }
        self.status = to;
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

// ============================================================================
// WORKFLOWS
// ============================================================================

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub step_id: String,
    pub agent_id: GenomeId,
    /// Reserved. Accepted and stored but steps always run sequentially.
    #[serde(default)]
    pub parallel: bool,
    /// Placeholder name -> step id whose output replaces `${placeholder}`.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

impl WorkflowStep {
    pub fn new(step_id: impl Into<String>, agent_id: GenomeId) -> Self {
        Self {
            step_id: step_id.into(),
            agent_id,
            parallel: false,
            inputs: BTreeMap::new(),
        }
    }

    /// Substitute `${placeholder}` with the output of `from_step`.
    pub fn with_input(mut self, placeholder: impl Into<String>, from_step: impl Into<String>) -> Self {
        self.inputs.insert(placeholder.into(), from_step.into());
        self
    }
}

/// An ordered chain of genome runs. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub steps: Vec<WorkflowStep>,
    pub created_at: Timestamp,
}

impl Workflow {
    /// Create a workflow after validating its shape.
    pub fn new(name: impl Into<String>, steps: Vec<WorkflowStep>) -> HelixResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HelixError::missing_field("name"));
        }
        if steps.is_empty() {
            return Err(HelixError::missing_field("steps"));
        }
        if let Some(idx) = steps.iter().position(|s| s.step_id.trim().is_empty()) {
            return Err(HelixError::missing_field(&format!("steps[{}].step_id", idx)));
        }
        Ok(Self {
            id: WorkflowId::now_v7(),
            name,
            steps,
            created_at: Utc::now(),
        })
    }
}
