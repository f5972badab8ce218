//! Tool dispatch: tool name + JSON arguments in, JSON out.
//!
//! Canonical names are `orchestrator_<operation>`. Bare operation names and
//! the doubled `orchestrator_orchestrator_<operation>` form are accepted too.

use crate::execution::SlotRequest;
use crate::{EvaluationRequest, EvolutionParams, Orchestrator};
use helix_core::{
    GenomeDraft, GenomeId, HelixError, HelixResult, RunId, StorageError, ValidationError,
    WorkflowId, WorkflowStep,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::str::FromStr;
use std::time::Duration;

/// Prefix carried by every canonical tool name.
pub const TOOL_PREFIX: &str = "orchestrator_";

// ============================================================================
// TOOL DEFINITIONS
// ============================================================================

/// A tool exposed to the dispatch layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub input_schema: JsonValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    RegisterAgent,
    ListAgents,
    GetAgent,
    DeleteAgent,
    RunAgent,
    RunParallel,
    RunWorkflow,
    Evaluate,
    Evolve,
    GetResult,
    CreateWorkflow,
    ListWorkflows,
}

impl Operation {
    const ALL: [Operation; 12] = [
        Operation::RegisterAgent,
        Operation::ListAgents,
        Operation::GetAgent,
        Operation::DeleteAgent,
        Operation::RunAgent,
        Operation::RunParallel,
        Operation::RunWorkflow,
        Operation::Evaluate,
        Operation::Evolve,
        Operation::GetResult,
        Operation::CreateWorkflow,
        Operation::ListWorkflows,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Operation::RegisterAgent => "register_agent",
            Operation::ListAgents => "list_agents",
            Operation::GetAgent => "get_agent",
            Operation::DeleteAgent => "delete_agent",
            Operation::RunAgent => "run_agent",
            Operation::RunParallel => "run_parallel",
            Operation::RunWorkflow => "run_workflow",
            Operation::Evaluate => "evaluate",
            Operation::Evolve => "evolve",
            Operation::GetResult => "get_result",
            Operation::CreateWorkflow => "create_workflow",
            Operation::ListWorkflows => "list_workflows",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        let bare = name
            .strip_prefix(TOOL_PREFIX)
            .map(|rest| rest.strip_prefix(TOOL_PREFIX).unwrap_or(rest))
            .unwrap_or(name);
        Self::ALL.into_iter().find(|op| op.as_str() == bare)
    }

    fn description(&self) -> &'static str {
        match self {
            Operation::RegisterAgent => "Register a new agent genome",
            Operation::ListAgents => "List registered agents in registration order",
            Operation::GetAgent => "Get an agent by ID",
            Operation::DeleteAgent => "Delete an agent; runs referencing it are kept",
            Operation::RunAgent => "Run a single agent against an input",
            Operation::RunParallel => "Run several agents concurrently on the same input",
            Operation::RunWorkflow => "Execute a workflow step by step",
            Operation::Evaluate => "Score the output of a run",
            Operation::Evolve => "Create new agents by mutation and crossover",
            Operation::GetResult => "Get the record of a run",
            Operation::CreateWorkflow => "Create a workflow from ordered steps",
            Operation::ListWorkflows => "List workflows",
        }
    }

    fn input_schema(&self) -> JsonValue {
        let id = |what: &str| json!({ "type": "string", "format": "uuid", "description": what });
        let timeout = json!({
            "type": "integer",
            "minimum": 0,
            "description": "Deadline in milliseconds; 0 or absent uses the default"
        });

        match self {
            Operation::RegisterAgent => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "model": { "type": "string" },
                    "provider": { "type": "string" },
                    "system_prompt": { "type": "string" },
                    "tools": { "type": "array", "items": { "type": "string" } },
                    "temperature": { "type": "number", "minimum": 0, "maximum": 2 },
                    "max_tokens": { "type": "integer", "minimum": 0 },
                    "metadata": { "type": "object" }
                },
                "required": ["name", "model"]
            }),
            Operation::ListAgents => json!({
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "minimum": 0 }
                }
            }),
            Operation::GetAgent | Operation::DeleteAgent => json!({
                "type": "object",
                "properties": { "agent_id": id("Agent ID") },
                "required": ["agent_id"]
            }),
            Operation::RunAgent => json!({
                "type": "object",
                "properties": {
                    "agent_id": id("Agent ID"),
                    "input": { "type": "string" },
                    "timeout_ms": timeout
                },
                "required": ["agent_id", "input"]
            }),
            Operation::RunParallel => json!({
                "type": "object",
                "properties": {
                    "agent_ids": { "type": "array", "items": id("Agent ID") },
                    "input": { "type": "string" },
                    "timeout_ms": timeout
                },
                "required": ["agent_ids", "input"]
            }),
            Operation::RunWorkflow => json!({
                "type": "object",
                "properties": {
                    "workflow_id": id("Workflow ID"),
                    "initial_input": { "type": "string" },
                    "timeout_ms": timeout
                },
                "required": ["workflow_id", "initial_input"]
            }),
            Operation::Evaluate => json!({
                "type": "object",
                "properties": {
                    "run_id": id("Run ID"),
                    "fitness": { "type": "number", "minimum": 0, "maximum": 1 },
                    "correctness": { "type": "boolean" },
                    "feedback": { "type": "string" }
                },
                "required": ["run_id"]
            }),
            Operation::Evolve => json!({
                "type": "object",
                "properties": {
                    "task": { "type": "string" },
                    "parent_ids": { "type": "array", "items": id("Parent agent ID") },
                    "population_size": { "type": "integer", "minimum": 0 },
                    "generations": { "type": "integer", "minimum": 0 },
                    "mutation_rate": { "type": "number", "minimum": 0, "maximum": 1 },
                    "crossover_rate": { "type": "number", "minimum": 0, "maximum": 1 },
                    "elite_count": { "type": "integer", "minimum": 0 },
                    "seed": { "type": "integer", "minimum": 0 }
                },
                "required": ["parent_ids"]
            }),
            Operation::GetResult => json!({
                "type": "object",
                "properties": { "run_id": id("Run ID") },
                "required": ["run_id"]
            }),
            Operation::CreateWorkflow => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "steps": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "step_id": { "type": "string" },
                                "agent_id": id("Agent ID"),
                                "parallel": {
                                    "type": "boolean",
                                    "description": "Reserved; steps always run sequentially"
                                },
                                "inputs": {
                                    "type": "object",
                                    "additionalProperties": { "type": "string" },
                                    "description": "Placeholder name -> step ID whose output replaces ${placeholder}"
                                }
                            },
                            "required": ["step_id", "agent_id"]
                        }
                    }
                },
                "required": ["name", "steps"]
            }),
            Operation::ListWorkflows => json!({ "type": "object", "properties": {} }),
        }
    }
}

/// Every tool the orchestrator exposes, under its canonical name.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    Operation::ALL
        .iter()
        .map(|op| ToolDefinition {
            name: format!("{}{}", TOOL_PREFIX, op.as_str()),
            description: op.description().to_string(),
            input_schema: op.input_schema(),
        })
        .collect()
}

/// Map any accepted spelling of a tool name to its canonical form.
pub fn canonical_tool_name(name: &str) -> Option<String> {
    Operation::parse(name).map(|op| format!("{}{}", TOOL_PREFIX, op.as_str()))
}

// ============================================================================
// PAYLOADS
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListAgentsArgs {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AgentIdArgs {
    #[serde(default)]
    agent_id: String,
}

#[derive(Debug, Deserialize)]
struct RunAgentArgs {
    #[serde(default)]
    agent_id: String,
    #[serde(default)]
    input: String,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RunParallelArgs {
    #[serde(default)]
    agent_ids: Vec<String>,
    #[serde(default)]
    input: String,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RunWorkflowArgs {
    #[serde(default)]
    workflow_id: String,
    #[serde(default)]
    initial_input: String,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RunIdArgs {
    #[serde(default)]
    run_id: String,
}

#[derive(Debug, Deserialize)]
struct EvaluateArgs {
    #[serde(default)]
    run_id: String,
    #[serde(default)]
    fitness: Option<f64>,
    #[serde(default)]
    correctness: bool,
    #[serde(default)]
    feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EvolveArgs {
    #[serde(default)]
    task: String,
    #[serde(default)]
    parent_ids: Vec<String>,
    #[serde(default)]
    population_size: usize,
    #[serde(default)]
    generations: u32,
    #[serde(default)]
    mutation_rate: f64,
    #[serde(default)]
    crossover_rate: f64,
    #[serde(default)]
    elite_count: usize,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreateWorkflowArgs {
    #[serde(default)]
    name: String,
    #[serde(default)]
    steps: Vec<WorkflowStep>,
}

fn decode<T: DeserializeOwned>(op: Operation, args: JsonValue) -> HelixResult<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| {
        ValidationError::MalformedPayload {
            tool: op.as_str().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn parse_id<T: FromStr>(field: &str, raw: &str) -> HelixResult<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(HelixError::missing_field(field));
    }
    raw.parse()
        .map_err(|_| HelixError::invalid_value(field, format!("'{}' is not a valid identifier", raw)))
}

fn timeout(timeout_ms: Option<u64>) -> Option<Duration> {
    timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
}

// ============================================================================
// DISPATCH
// ============================================================================

impl Orchestrator {
    /// Every tool this engine exposes.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Execute a tool by name.
    ///
    /// Validation and lookup failures are errors. LLM failures are reported
    /// inside the returned JSON as `"status": "failed"`.
    pub async fn execute_tool(&self, name: &str, args: JsonValue) -> HelixResult<JsonValue> {
        let op = Operation::parse(name).ok_or_else(|| ValidationError::UnknownTool {
            name: name.to_string(),
        })?;
        tracing::debug!(tool = op.as_str(), "Dispatching tool call");

        match op {
            Operation::RegisterAgent => {
                let draft: GenomeDraft = decode(op, args)?;
                let genome = self.register_agent(draft)?;
                Ok(json!({ "agent_id": genome.id, "agent": genome }))
            }

            Operation::ListAgents => {
                let args: ListAgentsArgs = decode(op, args)?;
                Ok(json!(self.list_agents(args.limit)?))
            }

            Operation::GetAgent => {
                let args: AgentIdArgs = decode(op, args)?;
                let id: GenomeId = parse_id("agent_id", &args.agent_id)?;
                Ok(json!(self.get_agent(id)?))
            }

            Operation::DeleteAgent => {
                let args: AgentIdArgs = decode(op, args)?;
                let id: GenomeId = parse_id("agent_id", &args.agent_id)?;
                self.delete_agent(id)?;
                Ok(json!({ "deleted": true, "agent_id": id }))
            }

            Operation::RunAgent => {
                let args: RunAgentArgs = decode(op, args)?;
                let id: GenomeId = parse_id("agent_id", &args.agent_id)?;
                let run = self.run_agent(id, &args.input, timeout(args.timeout_ms)).await?;

                let mut response = json!({ "run_id": run.run_id, "status": run.status });
                if let Some(output) = run.output {
                    response["output"] = json!(output);
                }
                if let Some(error) = run.error {
                    response["error"] = json!(error);
                }
                Ok(response)
            }

            Operation::RunParallel => {
                let args: RunParallelArgs = decode(op, args)?;
                let requests = args
                    .agent_ids
                    .into_iter()
                    .map(|raw| match parse_id::<GenomeId>("agent_ids", &raw) {
                        Ok(id) => SlotRequest::Agent(id),
                        Err(e) => SlotRequest::Rejected {
                            raw,
                            error: e.to_string(),
                        },
                    })
                    .collect();
                let results = self
                    .run_slots(requests, &args.input, timeout(args.timeout_ms))
                    .await?;
                Ok(json!({ "count": results.len(), "results": results }))
            }

            Operation::RunWorkflow => {
                let args: RunWorkflowArgs = decode(op, args)?;
                let id: WorkflowId = parse_id("workflow_id", &args.workflow_id)?;
                let outcome = self
                    .run_workflow(id, &args.initial_input, timeout(args.timeout_ms))
                    .await?;
                Ok(json!(outcome))
            }

            Operation::Evaluate => {
                let args: EvaluateArgs = decode(op, args)?;
                let run_id: RunId = parse_id("run_id", &args.run_id)?;
                let fitness = self.evaluate(EvaluationRequest {
                    run_id,
                    fitness: args.fitness,
                    correctness: args.correctness,
                    feedback: args.feedback,
                })?;
                Ok(json!({ "run_id": run_id, "fitness": fitness, "updated": true }))
            }

            Operation::Evolve => {
                let args: EvolveArgs = decode(op, args)?;
                let parent_ids = args
                    .parent_ids
                    .iter()
                    .map(|raw| parse_id::<GenomeId>("parent_ids", raw))
                    .collect::<HelixResult<Vec<_>>>()?;
                let params = EvolutionParams {
                    task: args.task,
                    parent_ids,
                    population_size: args.population_size,
                    generations: args.generations,
                    mutation_rate: args.mutation_rate,
                    crossover_rate: args.crossover_rate,
                    elite_count: args.elite_count,
                    seed: args.seed,
                };
                let engine = self.clone();
                let report = match tokio::task::spawn_blocking(move || engine.evolve(params)).await {
                    Ok(result) => result?,
                    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                    Err(e) => {
                        return Err(StorageError::TransactionFailed {
                            reason: format!("evolution task cancelled: {}", e),
                        }
                        .into())
                    }
                };
                Ok(json!({
                    "evolved": true,
                    "generations": report.generations,
                    "best_agents": report.best_agents,
                    "best_fitness": report.best_fitness,
                }))
            }

            Operation::GetResult => {
                let args: RunIdArgs = decode(op, args)?;
                let run_id: RunId = parse_id("run_id", &args.run_id)?;
                Ok(json!(self.get_result(run_id)?))
            }

            Operation::CreateWorkflow => {
                let args: CreateWorkflowArgs = decode(op, args)?;
                let workflow = self.create_workflow(args.name, args.steps)?;
                Ok(json!({ "workflow_id": workflow.id, "workflow": workflow }))
            }

            Operation::ListWorkflows => Ok(json!(self.list_workflows()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_name_aliases() {
        assert_eq!(Operation::parse("orchestrator_run_agent"), Some(Operation::RunAgent));
        assert_eq!(
            Operation::parse("orchestrator_orchestrator_run_agent"),
            Some(Operation::RunAgent)
        );
        assert_eq!(Operation::parse("evolve"), Some(Operation::Evolve));
        assert_eq!(Operation::parse("orchestrator_launch_rockets"), None);
        assert_eq!(
            canonical_tool_name("list_workflows").as_deref(),
            Some("orchestrator_list_workflows")
        );
    }

    #[test]
    fn test_tool_definitions_cover_every_operation() {
        let tools = tool_definitions();
        assert_eq!(tools.len(), Operation::ALL.len());
        for tool in &tools {
            assert!(tool.name.starts_with(TOOL_PREFIX));
            assert_eq!(tool.input_schema["type"], "object");
            assert!(canonical_tool_name(&tool.name).is_some());
        }
    }

    #[test]
    fn test_parse_id_errors_name_the_field() {
        let err = parse_id::<GenomeId>("agent_id", "  ").unwrap_err();
        assert!(err.to_string().contains("agent_id"));

        let err = parse_id::<GenomeId>("agent_id", "agent_writer_42").unwrap_err();
        assert!(err.to_string().contains("agent_writer_42"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let engine = Orchestrator::dry_run();
        let err = engine
            .execute_tool("orchestrator_launch_rockets", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HelixError::Validation(ValidationError::UnknownTool { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected() {
        let engine = Orchestrator::dry_run();
        let err = engine
            .execute_tool("orchestrator_list_agents", json!({ "limit": "ten" }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HelixError::Validation(ValidationError::MalformedPayload { .. })
        ));
    }

    #[tokio::test]
    async fn test_null_arguments_act_like_empty_object() {
        let engine = Orchestrator::dry_run();
        let listed = engine
            .execute_tool("orchestrator_list_workflows", JsonValue::Null)
            .await
            .unwrap();
        assert_eq!(listed, json!([]));
    }
}
