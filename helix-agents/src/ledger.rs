//! Run ledger: execution attempts and their terminal status.

use crate::Orchestrator;
use helix_core::{
    AgentGenome, AgentRun, EntityType, GenomeId, HelixError, HelixResult, LlmError, RunId,
};

impl Orchestrator {
    /// Look up a run by ID.
    pub fn get_result(&self, run_id: RunId) -> HelixResult<AgentRun> {
        self.read_state()?
            .runs
            .get(&run_id)
            .cloned()
            .ok_or_else(|| HelixError::not_found(EntityType::Run, run_id))
    }

    /// Resolve the genome and record a `running` run in one write section.
    pub(crate) fn open_run(
        &self,
        genome_id: GenomeId,
        input: &str,
    ) -> HelixResult<(AgentGenome, RunId)> {
        let mut state = self.write_state()?;
        let genome = state
            .genomes
            .get(&genome_id)
            .cloned()
            .ok_or_else(|| HelixError::not_found(EntityType::Genome, genome_id))?;

        let run = AgentRun::start(genome_id, input);
        let run_id = run.run_id;
        state.runs.insert(run_id, run);
        Ok((genome, run_id))
    }

    /// Apply the terminal transition and return the finished record.
    pub(crate) fn close_run(
        &self,
        run_id: RunId,
        outcome: Result<String, LlmError>,
    ) -> HelixResult<AgentRun> {
        let mut state = self.write_state()?;
        let run = state
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| HelixError::not_found(EntityType::Run, run_id))?;

        match outcome {
            Ok(output) => run.complete(output)?,
            Err(e) => run.fail(e.to_string())?,
        }
        Ok(run.clone())
    }
}
