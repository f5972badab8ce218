//! Genome registry: CRUD over agent configurations.

use crate::Orchestrator;
use helix_core::{AgentGenome, EntityType, GenomeDraft, GenomeId, HelixError, HelixResult};

impl Orchestrator {
    /// Register a new generation-0 genome with fitness 0.5.
    pub fn register_agent(&self, draft: GenomeDraft) -> HelixResult<AgentGenome> {
        let genome = AgentGenome::from_draft(draft)?;
        self.write_state()?
            .genomes
            .insert(genome.id, genome.clone());

        tracing::info!(genome_id = %genome.id, name = %genome.name, model = %genome.model, "Registered agent");
        Ok(genome)
    }

    /// Up to `limit` genomes in registration order; `None` uses the configured page size.
    pub fn list_agents(&self, limit: Option<usize>) -> HelixResult<Vec<AgentGenome>> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(self.config.default_list_limit);
        let state = self.read_state()?;
        Ok(state.genomes.values().take(limit).cloned().collect())
    }

    pub fn get_agent(&self, id: GenomeId) -> HelixResult<AgentGenome> {
        self.read_state()?
            .genomes
            .get(&id)
            .cloned()
            .ok_or_else(|| HelixError::not_found(EntityType::Genome, id))
    }

    /// Remove a genome. Runs and workflows that reference it are left as-is.
    pub fn delete_agent(&self, id: GenomeId) -> HelixResult<AgentGenome> {
        let removed = self
            .write_state()?
            .genomes
            .remove(&id)
            .ok_or_else(|| HelixError::not_found(EntityType::Genome, id))?;

        tracing::debug!(genome_id = %id, "Deleted agent");
        Ok(removed)
    }
}
