//! Workflow engine: sequential chains of genome runs.

use crate::Orchestrator;
use helix_core::{
    EntityType, HelixError, HelixResult, RunStatus, Workflow, WorkflowId, WorkflowStep,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

/// Key under which the initial input is stored in the step-output map.
pub const INITIAL_INPUT_KEY: &str = "_initial";

/// Result of running a workflow to completion or to its first failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkflowOutcome {
    Completed {
        /// Workflow name.
        workflow: String,
        /// Output of the last step.
        output: String,
        /// Step ID -> output, plus the initial input.
        results: BTreeMap<String, String>,
    },
    Failed {
        /// ID of the step that failed. Later steps never ran.
        step: String,
        error: String,
        results: BTreeMap<String, String>,
    },
}

impl WorkflowOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, WorkflowOutcome::Completed { .. })
    }

    pub fn results(&self) -> &BTreeMap<String, String> {
        match self {
            WorkflowOutcome::Completed { results, .. } | WorkflowOutcome::Failed { results, .. } => {
                results
            }
        }
    }
}

/// Replace every `${placeholder}` declared by the step with the referenced output.
fn substitute_inputs(step: &WorkflowStep, input: &str, results: &BTreeMap<String, String>) -> String {
    step.inputs
        .iter()
        .fold(input.to_string(), |acc, (placeholder, from_step)| {
            match results.get(from_step) {
                Some(value) => acc.replace(&format!("${{{}}}", placeholder), value),
                None => acc,
            }
        })
}

impl Orchestrator {
    /// Store a new workflow definition.
    pub fn create_workflow(
        &self,
        name: impl Into<String>,
        steps: Vec<WorkflowStep>,
    ) -> HelixResult<Workflow> {
        let workflow = Workflow::new(name, steps)?;
        self.write_state()?
            .workflows
            .insert(workflow.id, workflow.clone());

        tracing::info!(workflow_id = %workflow.id, steps = workflow.steps.len(), "Created workflow");
        Ok(workflow)
    }

    /// All workflows in creation order.
    pub fn list_workflows(&self) -> HelixResult<Vec<Workflow>> {
        Ok(self.read_state()?.workflows.values().cloned().collect())
    }

    pub fn get_workflow(&self, id: WorkflowId) -> HelixResult<Workflow> {
        self.read_state()?
            .workflows
            .get(&id)
            .cloned()
            .ok_or_else(|| HelixError::not_found(EntityType::Workflow, id))
    }

    /// Execute a workflow's steps in order, feeding outputs forward.
    ///
    /// The default timeout is `default_timeout * (steps + 1)`. Each step also
    /// gets at most `default_timeout` of its own. The `parallel` flag on steps
    /// is not honoured.
    pub async fn run_workflow(
        &self,
        workflow_id: WorkflowId,
        initial_input: &str,
        timeout: Option<Duration>,
    ) -> HelixResult<WorkflowOutcome> {
        if initial_input.is_empty() {
            return Err(HelixError::missing_field("initial_input"));
        }
        let workflow = self.get_workflow(workflow_id)?;

        let step_budget = self.config.default_timeout;
        let total = timeout.unwrap_or_else(|| step_budget * (workflow.steps.len() as u32 + 1));
        let deadline = Instant::now() + total;

        let mut results = BTreeMap::new();
        results.insert(INITIAL_INPUT_KEY.to_string(), initial_input.to_string());
        let mut last_output = initial_input.to_string();

        for step in &workflow.steps {
            let base = match results.get(&step.step_id) {
                Some(prior) if !prior.is_empty() => prior.clone(),
                _ => last_output.clone(),
            };
            let input = substitute_inputs(step, &base, &results);
            let step_deadline = deadline.min(Instant::now() + step_budget);

            let failure = match self.execute_until(step.agent_id, &input, step_deadline).await {
                Ok(run) if run.status == RunStatus::Completed => {
                    let output = run.output.unwrap_or_default();
                    results.insert(step.step_id.clone(), output.clone());
                    last_output = output;
                    continue;
                }
                Ok(run) => run.error.unwrap_or_else(|| "run failed".to_string()),
                Err(e) => e.to_string(),
            };

            tracing::warn!(
                workflow_id = %workflow.id,
                step = %step.step_id,
                error = %failure,
                "Workflow step failed"
            );
            return Ok(WorkflowOutcome::Failed {
                step: step.step_id.clone(),
                error: failure,
                results,
            });
        }

        Ok(WorkflowOutcome::Completed {
            workflow: workflow.name,
            output: last_output,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_core::{GenomeDraft, GenomeId};
    use helix_test_utils::MockLlmProvider;
    use std::sync::Arc;

    #[test]
    fn test_substitute_inputs_replaces_every_occurrence() {
        let step = WorkflowStep::new("review", GenomeId::nil())
            .with_input("draft", "write")
            .with_input("missing", "nowhere");
        let mut results = BTreeMap::new();
        results.insert("write".to_string(), "TEXT".to_string());

        let out = substitute_inputs(&step, "a ${draft} b ${draft} ${missing}", &results);
        assert_eq!(out, "a TEXT b TEXT ${missing}");
    }

    #[test]
    fn test_create_workflow_validation() {
        let engine = Orchestrator::dry_run();
        assert!(engine.create_workflow("", vec![WorkflowStep::new("a", GenomeId::nil())]).is_err());
        assert!(engine.create_workflow("empty", vec![]).is_err());
        assert!(engine.list_workflows().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_workflow_chains_outputs() {
        let provider = Arc::new(MockLlmProvider::with_prefix("+"));
        let engine = Orchestrator::builder().provider(provider).build().unwrap();
        let agent = engine.register_agent(GenomeDraft::new("writer", "llama3")).unwrap();

        let workflow = engine
            .create_workflow(
                "chain",
                vec![
                    WorkflowStep::new("first", agent.id),
                    WorkflowStep::new("second", agent.id),
                    WorkflowStep::new("third", agent.id).with_input("seed", INITIAL_INPUT_KEY),
                ],
            )
            .unwrap();

        let outcome = engine.run_workflow(workflow.id, "x", None).await.unwrap();
        match outcome {
            WorkflowOutcome::Completed { workflow, output, results } => {
                assert_eq!(workflow, "chain");
                assert_eq!(output, "+++x");
                assert_eq!(results["first"], "+x");
                assert_eq!(results["second"], "++x");
                assert_eq!(results[INITIAL_INPUT_KEY], "x");
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_placeholders_pull_earlier_outputs() {
        let provider = Arc::new(MockLlmProvider::new());
        let engine = Orchestrator::builder().provider(provider.clone()).build().unwrap();
        let agent = engine.register_agent(GenomeDraft::new("writer", "llama3")).unwrap();

        let workflow = engine
            .create_workflow(
                "fan-in",
                vec![
                    WorkflowStep::new("draft", agent.id),
                    WorkflowStep::new("review", agent.id).with_input("orig", INITIAL_INPUT_KEY),
                ],
            )
            .unwrap();

        let outcome = engine
            .run_workflow(workflow.id, "topic ${orig}", None)
            .await
            .unwrap();
        assert!(outcome.is_completed());

        let prompts: Vec<_> = provider.requests().into_iter().map(|r| r.user_prompt).collect();
        assert_eq!(prompts[0], "topic ${orig}");
        assert_eq!(prompts[1], "topic topic ${orig}");
    }

    #[tokio::test]
    async fn test_parallel_flag_still_runs_in_order() {
        let provider = Arc::new(MockLlmProvider::with_prefix("+"));
        let engine = Orchestrator::builder().provider(provider.clone()).build().unwrap();
        let agent = engine.register_agent(GenomeDraft::new("writer", "llama3")).unwrap();

        let steps = ["a", "b", "c"]
            .into_iter()
            .map(|id| {
                let mut step = WorkflowStep::new(id, agent.id);
                step.parallel = true;
                step
            })
            .collect();
        let workflow = engine.create_workflow("flagged", steps).unwrap();
        assert!(engine
            .get_workflow(workflow.id)
            .unwrap()
            .steps
            .iter()
            .all(|s| s.parallel));

        let outcome = engine.run_workflow(workflow.id, "x", None).await.unwrap();
        match outcome {
            WorkflowOutcome::Completed { output, .. } => assert_eq!(output, "+++x"),
            other => panic!("expected completion, got {:?}", other),
        }

        let prompts: Vec<_> = provider.requests().into_iter().map(|r| r.user_prompt).collect();
        assert_eq!(prompts, vec!["x", "+x", "++x"]);
    }

    #[tokio::test]
    async fn test_repeated_step_id_restarts_from_its_own_output() {
        let provider = Arc::new(MockLlmProvider::with_prefix("+"));
        let engine = Orchestrator::builder().provider(provider.clone()).build().unwrap();
        let agent = engine.register_agent(GenomeDraft::new("writer", "llama3")).unwrap();

        let workflow = engine
            .create_workflow(
                "loop",
                vec![
                    WorkflowStep::new("one", agent.id),
                    WorkflowStep::new("two", agent.id),
                    WorkflowStep::new("one", agent.id),
                ],
            )
            .unwrap();

        let outcome = engine.run_workflow(workflow.id, "x", None).await.unwrap();
        match outcome {
            WorkflowOutcome::Completed { output, results, .. } => {
                assert_eq!(output, "++x");
                assert_eq!(results["one"], "++x");
                assert_eq!(results["two"], "++x");
            }
            other => panic!("expected completion, got {:?}", other),
        }

        let prompts: Vec<_> = provider.requests().into_iter().map(|r| r.user_prompt).collect();
        assert_eq!(prompts, vec!["x", "+x", "+x"]);
    }

    #[tokio::test]
    async fn test_step_named_initial_reads_the_initial_input() {
        let provider = Arc::new(MockLlmProvider::with_prefix("+"));
        let engine = Orchestrator::builder().provider(provider.clone()).build().unwrap();
        let agent = engine.register_agent(GenomeDraft::new("writer", "llama3")).unwrap();

        let workflow = engine
            .create_workflow(
                "shadow",
                vec![
                    WorkflowStep::new("one", agent.id),
                    WorkflowStep::new(INITIAL_INPUT_KEY, agent.id),
                ],
            )
            .unwrap();

        let outcome = engine.run_workflow(workflow.id, "x", None).await.unwrap();
        assert!(outcome.is_completed());
        assert_eq!(outcome.results()[INITIAL_INPUT_KEY], "+x");

        let prompts: Vec<_> = provider.requests().into_iter().map(|r| r.user_prompt).collect();
        assert_eq!(prompts, vec!["x", "x"]);
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_an_error() {
        let engine = Orchestrator::dry_run();
        let err = engine
            .run_workflow(WorkflowId::now_v7(), "x", None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_outcome_serializes_with_status_tag() {
        let outcome = WorkflowOutcome::Failed {
            step: "review".to_string(),
            error: "boom".to_string(),
            results: BTreeMap::new(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["step"], "review");
    }
}
