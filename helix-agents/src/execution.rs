//! Execution engine: one genome against the LLM seam, or many at once.

use crate::Orchestrator;
use futures_util::future::join_all;
use helix_core::{
    AgentGenome, AgentRun, GenomeId, HelixError, HelixResult, LlmError, LlmRequest, RunId,
    RunStatus, ValidationError,
};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Placeholder output used when no provider is configured.
pub fn dry_run_output(agent_name: &str, input: &str) -> String {
    format!("[Simulated] Agent '{}' would process: {}", agent_name, input)
}

/// One entry of a parallel batch, reported at the index of its request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParallelSlot {
    /// The identifier as requested, even when it does not parse.
    pub agent_id: String,
    /// Absent when the run could not be opened (e.g. unknown genome).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParallelSlot {
    fn from_run(run: AgentRun) -> Self {
        Self {
            agent_id: run.genome_id.to_string(),
            run_id: Some(run.run_id),
            output: run.output,
            status: run.status,
            error: run.error,
        }
    }

    fn rejected(agent_id: String, error: String) -> Self {
        Self {
            agent_id,
            run_id: None,
            output: None,
            status: RunStatus::Failed,
            error: Some(error),
        }
    }
}

/// A requested slot of a parallel batch.
pub(crate) enum SlotRequest {
    Agent(GenomeId),
    /// Failed before execution; reported in place without running.
    Rejected { raw: String, error: String },
}

impl Orchestrator {
    /// Run one genome against `input`.
    ///
    /// Lookup and validation problems are returned as errors. LLM failures and
    /// deadline expiry are not: they come back as a `failed` run.
    pub async fn run_agent(
        &self,
        agent_id: GenomeId,
        input: &str,
        timeout: Option<Duration>,
    ) -> HelixResult<AgentRun> {
        if input.is_empty() {
            return Err(HelixError::missing_field("input"));
        }
        let deadline = Instant::now() + timeout.unwrap_or(self.config.default_timeout);
        self.execute_until(agent_id, input, deadline).await
    }

    /// Run every genome in `agent_ids` concurrently against the same input.
    ///
    /// Results are returned in request order. A failing agent only fails its
    /// own slot. Batches larger than `max_parallel` are rejected before any
    /// run is created.
    pub async fn run_parallel(
        &self,
        agent_ids: &[GenomeId],
        input: &str,
        timeout: Option<Duration>,
    ) -> HelixResult<Vec<ParallelSlot>> {
        let requests = agent_ids.iter().copied().map(SlotRequest::Agent).collect();
        self.run_slots(requests, input, timeout).await
    }

    /// Fan out a batch whose entries may already be rejected.
    ///
    /// Rejected entries keep their index and never start a run.
    pub(crate) async fn run_slots(
        &self,
        requests: Vec<SlotRequest>,
        input: &str,
        timeout: Option<Duration>,
    ) -> HelixResult<Vec<ParallelSlot>> {
        if requests.is_empty() {
            return Err(HelixError::missing_field("agent_ids"));
        }
        if input.is_empty() {
            return Err(HelixError::missing_field("input"));
        }
        if requests.len() > self.config.max_parallel {
            return Err(ValidationError::CapacityExceeded {
                requested: requests.len(),
                max: self.config.max_parallel,
            }
            .into());
        }

        let deadline = Instant::now() + timeout.unwrap_or(self.config.default_timeout);
        tracing::debug!(agents = requests.len(), "Starting parallel batch");

        let handles: Vec<_> = requests
            .iter()
            .filter_map(|request| match request {
                SlotRequest::Agent(agent_id) => Some(*agent_id),
                SlotRequest::Rejected { .. } => None,
            })
            .map(|agent_id| {
                let engine = self.clone();
                let input = input.to_string();
                tokio::spawn(async move { engine.execute_until(agent_id, &input, deadline).await })
            })
            .collect();

        let mut joined = join_all(handles).await.into_iter();
        let slots = requests
            .into_iter()
            .map(|request| match request {
                SlotRequest::Rejected { raw, error } => ParallelSlot::rejected(raw, error),
                SlotRequest::Agent(agent_id) => match joined.next() {
                    Some(Ok(Ok(run))) => ParallelSlot::from_run(run),
                    Some(Ok(Err(e))) => ParallelSlot::rejected(agent_id.to_string(), e.to_string()),
                    Some(Err(e)) => {
                        ParallelSlot::rejected(agent_id.to_string(), format!("Task panicked: {}", e))
                    }
                    None => ParallelSlot::rejected(
                        agent_id.to_string(),
                        "Task result missing".to_string(),
                    ),
                },
            })
            .collect();

        Ok(slots)
    }

    /// Open a run, call the provider with no lock held, then close the run.
    pub(crate) async fn execute_until(
        &self,
        agent_id: GenomeId,
        input: &str,
        deadline: Instant,
    ) -> HelixResult<AgentRun> {
        let (genome, run_id) = self.open_run(agent_id, input)?;
        let outcome = self.generate(&genome, input, deadline).await;

        if let Err(e) = &outcome {
            tracing::warn!(run_id = %run_id, genome_id = %agent_id, error = %e, "Agent run failed");
        }
        let run = self.close_run(run_id, outcome)?;

        tracing::debug!(run_id = %run_id, status = %run.status, "Agent run finished");
        Ok(run)
    }

    async fn generate(
        &self,
        genome: &AgentGenome,
        input: &str,
        deadline: Instant,
    ) -> Result<String, LlmError> {
        let Some(provider) = &self.provider else {
            return Ok(dry_run_output(&genome.name, input));
        };

        let request = LlmRequest::for_genome(genome, input);
        let started = Instant::now();
        match tokio::time::timeout_at(deadline, provider.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::DeadlineExceeded {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
        }
    }
}
