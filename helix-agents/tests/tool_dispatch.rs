//! End-to-end tests through the JSON tool interface.

use helix_agents::Orchestrator;
use helix_core::{HelixError, OrchestratorConfig, ValidationError};
use helix_test_utils::fixtures::fast_config;
use helix_test_utils::MockLlmProvider;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

async fn register(engine: &Orchestrator, name: &str, model: &str) -> String {
    let response = engine
        .execute_tool(
            "orchestrator_register_agent",
            json!({
                "name": name,
                "model": model,
                "provider": "ollama",
                "system_prompt": "You are a helpful assistant that always answers in one line.",
                "tools": ["web_search"]
            }),
        )
        .await
        .unwrap();
    response["agent_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_get_list_delete() {
    let engine = Orchestrator::dry_run();
    let id = register(&engine, "writer", "llama3").await;

    let agent = engine
        .execute_tool("orchestrator_get_agent", json!({ "agent_id": id }))
        .await
        .unwrap();
    assert_eq!(agent["name"], "writer");
    assert_eq!(agent["fitness"], 0.5);
    assert_eq!(agent["generation"], 0);
    assert_eq!(agent["parent_ids"], json!([]));

    let listed = engine
        .execute_tool("orchestrator_list_agents", json!({}))
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let deleted = engine
        .execute_tool("orchestrator_orchestrator_delete_agent", json!({ "agent_id": id }))
        .await
        .unwrap();
    assert_eq!(deleted, json!({ "deleted": true, "agent_id": id }));

    let err = engine
        .execute_tool("orchestrator_get_agent", json!({ "agent_id": id }))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn register_requires_name_and_model() {
    let engine = Orchestrator::dry_run();
    let err = engine
        .execute_tool("orchestrator_register_agent", json!({ "name": "writer" }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("model"));
}

#[tokio::test]
async fn dry_run_agent_completes_with_placeholder() {
    let engine = Orchestrator::dry_run();
    let id = register(&engine, "writer", "llama3").await;

    let response = engine
        .execute_tool("orchestrator_run_agent", json!({ "agent_id": id, "input": "hello" }))
        .await
        .unwrap();
    assert_eq!(response["status"], "completed");
    assert_eq!(
        response["output"],
        "[Simulated] Agent 'writer' would process: hello"
    );

    let run = engine
        .execute_tool(
            "orchestrator_get_result",
            json!({ "run_id": response["run_id"] }),
        )
        .await
        .unwrap();
    assert_eq!(run["status"], "completed");
    assert_eq!(run["input"], "hello");
    assert_eq!(run["genome_id"], id.as_str());
}

#[tokio::test]
async fn run_agent_failure_is_reported_in_payload() {
    let provider = Arc::new(MockLlmProvider::new().failing_model("offline-model"));
    let engine = Orchestrator::builder()
        .provider(provider)
        .config(fast_config())
        .build()
        .unwrap();
    let id = register(&engine, "broken", "offline-model").await;

    let response = engine
        .execute_tool("orchestrator_run_agent", json!({ "agent_id": id, "input": "hello" }))
        .await
        .unwrap();
    assert_eq!(response["status"], "failed");
    assert!(response["error"].as_str().unwrap().contains("offline-model"));
    assert!(response.get("output").is_none());
}

#[tokio::test]
async fn run_agent_missing_input_is_hard_error() {
    let engine = Orchestrator::dry_run();
    let id = register(&engine, "writer", "llama3").await;
    let err = engine
        .execute_tool("orchestrator_run_agent", json!({ "agent_id": id }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("input"));
}

#[tokio::test]
async fn parallel_unknown_agent_fails_only_its_slot() {
    let engine = Orchestrator::dry_run();
    let a = register(&engine, "a", "llama3").await;
    let c = register(&engine, "c", "llama3").await;
    let b = helix_core::GenomeId::now_v7().to_string();

    let response = engine
        .execute_tool(
            "orchestrator_run_parallel",
            json!({ "agent_ids": [a, b, c], "input": "go" }),
        )
        .await
        .unwrap();

    assert_eq!(response["count"], 3);
    let results = response["results"].as_array().unwrap();
    let statuses: Vec<&str> = results.iter().map(|r| r["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["completed", "failed", "completed"]);
    assert_eq!(results[0]["agent_id"], a.as_str());
    assert_eq!(results[1]["agent_id"], b.as_str());
    assert!(results[1]["error"].as_str().unwrap().contains("not found"));
    assert_eq!(results[2]["agent_id"], c.as_str());
}

#[tokio::test]
async fn parallel_malformed_id_fails_only_its_slot() {
    let engine = Orchestrator::dry_run();
    let a = register(&engine, "a", "llama3").await;
    let c = register(&engine, "c", "llama3").await;

    let response = engine
        .execute_tool(
            "orchestrator_run_parallel",
            json!({ "agent_ids": [a, "agent_writer_42", c], "input": "go" }),
        )
        .await
        .unwrap();

    assert_eq!(response["count"], 3);
    let results = response["results"].as_array().unwrap();
    let statuses: Vec<&str> = results.iter().map(|r| r["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["completed", "failed", "completed"]);
    assert_eq!(results[0]["agent_id"], a.as_str());
    assert_eq!(results[1]["agent_id"], "agent_writer_42");
    assert!(results[1]["error"].as_str().unwrap().contains("agent_writer_42"));
    assert!(results[1].get("run_id").map_or(true, Value::is_null));
    assert_eq!(results[2]["agent_id"], c.as_str());
    assert_eq!(engine.counts().unwrap().runs, 2);
}

#[tokio::test]
async fn parallel_empty_id_list_is_hard_error() {
    let engine = Orchestrator::dry_run();
    let err = engine
        .execute_tool(
            "orchestrator_run_parallel",
            json!({ "agent_ids": [], "input": "go" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HelixError::Validation(ValidationError::RequiredFieldMissing { .. })
    ));
    assert_eq!(engine.counts().unwrap().runs, 0);
}

#[tokio::test]
async fn parallel_over_capacity_creates_zero_runs() {
    let engine = Orchestrator::builder()
        .config(OrchestratorConfig {
            max_parallel: 2,
            ..Default::default()
        })
        .build()
        .unwrap();
    let id = register(&engine, "writer", "llama3").await;

    let err = engine
        .execute_tool(
            "orchestrator_run_parallel",
            json!({ "agent_ids": [id, id, id], "input": "go" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HelixError::Validation(ValidationError::CapacityExceeded { .. })
    ));
    assert_eq!(engine.counts().unwrap().runs, 0);
}

#[tokio::test]
async fn workflow_stops_at_failing_step() {
    let provider = Arc::new(MockLlmProvider::with_prefix("+").failing_model("offline-model"));
    let engine = Orchestrator::builder()
        .provider(provider.clone())
        .config(fast_config())
        .build()
        .unwrap();
    let good = register(&engine, "good", "llama3").await;
    let bad = register(&engine, "bad", "offline-model").await;

    let created = engine
        .execute_tool(
            "orchestrator_create_workflow",
            json!({
                "name": "three-step",
                "steps": [
                    { "step_id": "one", "agent_id": good },
                    { "step_id": "two", "agent_id": bad },
                    { "step_id": "three", "agent_id": good }
                ]
            }),
        )
        .await
        .unwrap();
    let workflow_id = created["workflow_id"].clone();

    let outcome = engine
        .execute_tool(
            "orchestrator_run_workflow",
            json!({ "workflow_id": workflow_id, "initial_input": "x" }),
        )
        .await
        .unwrap();

    assert_eq!(outcome["status"], "failed");
    assert_eq!(outcome["step"], "two");
    assert_eq!(outcome["results"]["one"], "+x");
    assert!(outcome["results"].get("three").is_none());
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn workflow_step_with_deleted_agent_fails_workflow() {
    let engine = Orchestrator::dry_run();
    let first = register(&engine, "first", "llama3").await;
    let gone = register(&engine, "gone", "llama3").await;

    let created = engine
        .execute_tool(
            "orchestrator_create_workflow",
            json!({
                "name": "dangling",
                "steps": [
                    { "step_id": "one", "agent_id": first },
                    { "step_id": "two", "agent_id": gone }
                ]
            }),
        )
        .await
        .unwrap();
    engine
        .execute_tool("orchestrator_delete_agent", json!({ "agent_id": gone }))
        .await
        .unwrap();

    let outcome = engine
        .execute_tool(
            "orchestrator_run_workflow",
            json!({ "workflow_id": created["workflow_id"], "initial_input": "x" }),
        )
        .await
        .unwrap();
    assert_eq!(outcome["status"], "failed");
    assert_eq!(outcome["step"], "two");
    assert!(outcome["results"].get("one").is_some());
}

#[tokio::test]
async fn create_workflow_requires_steps() {
    let engine = Orchestrator::dry_run();
    let err = engine
        .execute_tool(
            "orchestrator_create_workflow",
            json!({ "name": "empty", "steps": [] }),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("steps"));

    let listed = engine
        .execute_tool("orchestrator_list_workflows", json!({}))
        .await
        .unwrap();
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn evaluate_then_evolve() {
    let engine = Orchestrator::dry_run();
    let parent = register(&engine, "writer", "llama3").await;

    let run = engine
        .execute_tool("orchestrator_run_agent", json!({ "agent_id": parent, "input": "hi" }))
        .await
        .unwrap();
    let evaluated = engine
        .execute_tool(
            "orchestrator_evaluate",
            json!({ "run_id": run["run_id"], "correctness": true, "feedback": "good" }),
        )
        .await
        .unwrap();
    assert_eq!(evaluated["fitness"], 1.0);
    assert_eq!(evaluated["updated"], true);

    let evolved = engine
        .execute_tool(
            "orchestrator_evolve",
            json!({
                "task": "write docs",
                "parent_ids": [parent],
                "population_size": 6,
                "generations": 2,
                "seed": 7
            }),
        )
        .await
        .unwrap();

    assert_eq!(evolved["evolved"], true);
    assert_eq!(evolved["generations"], 2);
    let best: &Vec<Value> = evolved["best_agents"].as_array().unwrap();
    assert_eq!(best.len(), 3);
    for agent in best {
        assert!(agent["generation"].as_u64().unwrap() >= 1);
        let parents = agent["parent_ids"].as_array().unwrap().len();
        assert!((1..=2).contains(&parents));
    }
    assert!(evolved["best_fitness"].as_f64().unwrap() <= 1.0);

    let listed = engine
        .execute_tool("orchestrator_list_agents", json!({ "limit": 100 }))
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn evolve_leaves_the_runtime_free_for_other_tasks() {
    let engine = Orchestrator::dry_run();
    let parent = register(&engine, "writer", "llama3").await;

    // Single-threaded runtime: this task only runs if evolve yields.
    let ticked = Arc::new(AtomicBool::new(false));
    let flag = ticked.clone();
    tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

    let evolved = engine
        .execute_tool(
            "orchestrator_evolve",
            json!({
                "task": "write docs",
                "parent_ids": [parent],
                "population_size": 100,
                "generations": 50,
                "seed": 1
            }),
        )
        .await
        .unwrap();

    assert_eq!(evolved["evolved"], true);
    assert!(ticked.load(Ordering::SeqCst));
}

#[tokio::test]
async fn evolve_without_valid_parents_fails() {
    let engine = Orchestrator::dry_run();
    let err = engine
        .execute_tool(
            "orchestrator_evolve",
            json!({ "task": "t", "parent_ids": [helix_core::GenomeId::now_v7().to_string()] }),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("parent"));
}

#[tokio::test]
async fn malformed_identifier_is_rejected() {
    let engine = Orchestrator::dry_run();
    let err = engine
        .execute_tool("orchestrator_get_result", json!({ "run_id": "run_12345" }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("run_id"));
}
