//! Shared in-memory arena and lock helpers.

use crate::Orchestrator;
use helix_core::{
    AgentGenome, AgentRun, GenomeId, HelixError, HelixResult, RunId, StorageError, Workflow,
    WorkflowId,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

/// Every record the engine owns. Lives for the process lifetime.
#[derive(Debug, Default)]
pub(crate) struct OrchestratorState {
    /// Keyed by UUIDv7, so iteration follows registration order.
    pub(crate) genomes: BTreeMap<GenomeId, AgentGenome>,
    pub(crate) runs: HashMap<RunId, AgentRun>,
    pub(crate) workflows: BTreeMap<WorkflowId, Workflow>,
}

/// Record counts reported by readiness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub genomes: usize,
    pub runs: usize,
    pub workflows: usize,
}

impl Orchestrator {
    pub(crate) fn read_state(&self) -> HelixResult<RwLockReadGuard<'_, OrchestratorState>> {
        self.state
            .read()
            .map_err(|_| HelixError::Storage(StorageError::LockPoisoned))
    }

    pub(crate) fn write_state(&self) -> HelixResult<RwLockWriteGuard<'_, OrchestratorState>> {
        self.state
            .write()
            .map_err(|_| HelixError::Storage(StorageError::LockPoisoned))
    }

    /// Snapshot of how many genomes, runs and workflows are stored.
    pub fn counts(&self) -> HelixResult<StateCounts> {
        let state = self.read_state()?;
        Ok(StateCounts {
            genomes: state.genomes.len(),
            runs: state.runs.len(),
            workflows: state.workflows.len(),
        })
    }
}
