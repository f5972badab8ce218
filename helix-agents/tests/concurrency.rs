//! Shared-state behaviour under concurrent callers.

use futures_util::future::join_all;
use helix_agents::Orchestrator;
use helix_core::{GenomeDraft, RunStatus};
use helix_test_utils::generators::arb_genome_draft;
use helix_test_utils::MockLlmProvider;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_are_never_lost() {
    let engine = Orchestrator::dry_run();

    let handles: Vec<_> = (0..64)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .register_agent(GenomeDraft::new(format!("agent-{i}"), "llama3"))
                    .map(|g| g.id)
            })
        })
        .collect();

    let ids: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 64);
    assert_eq!(engine.list_agents(Some(1000)).unwrap().len(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_calls_overlap_instead_of_serialising() {
    let provider = Arc::new(MockLlmProvider::new().with_latency(Duration::from_millis(150)));
    let engine = Orchestrator::builder().provider(provider).build().unwrap();
    let ids: Vec<_> = (0..5)
        .map(|i| {
            engine
                .register_agent(GenomeDraft::new(format!("agent-{i}"), "llama3"))
                .unwrap()
                .id
        })
        .collect();

    let started = std::time::Instant::now();
    let slots = engine.run_parallel(&ids, "go", None).await.unwrap();
    let elapsed = started.elapsed();

    assert!(slots.iter().all(|s| s.status == RunStatus::Completed));
    assert!(
        elapsed < Duration::from_millis(600),
        "five 150ms calls took {:?}; the lock must not be held across LLM calls",
        elapsed
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_proceed_while_runs_are_in_flight() {
    let provider = Arc::new(MockLlmProvider::new().with_latency(Duration::from_millis(200)));
    let engine = Orchestrator::builder().provider(provider).build().unwrap();
    let genome = engine
        .register_agent(GenomeDraft::new("slow", "llama3"))
        .unwrap();

    let runner = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run_agent(genome.id, "go", None).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(engine.counts().unwrap().runs, 1);
    assert_eq!(engine.get_agent(genome.id).unwrap().id, genome.id);

    let run = runner.await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn registered_genomes_start_fresh(draft in arb_genome_draft()) {
        let engine = Orchestrator::dry_run();
        let genome = engine.register_agent(draft.clone()).unwrap();

        prop_assert_eq!(genome.fitness, 0.5);
        prop_assert_eq!(genome.generation, 0);
        prop_assert!(genome.parent_ids.is_empty());
        prop_assert_eq!(genome.tools, draft.tools);
        prop_assert_eq!(engine.get_agent(genome.id).unwrap().name, draft.name);
    }
}
