//! Evolutionary optimizer: fitness feedback and generational search.

mod fitness;
mod operators;

pub use fitness::{FitnessEvaluator, SimulatedFitness};
pub use operators::{crossover, mutate};

use crate::Orchestrator;
use helix_core::{
    AgentGenome, EntityType, GenomeId, HelixError, HelixResult, RunId, ValidationError,
    DEFAULT_FITNESS,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const DEFAULT_POPULATION_SIZE: usize = 10;
pub const DEFAULT_GENERATIONS: u32 = 5;
pub const DEFAULT_MUTATION_RATE: f64 = 0.1;
pub const DEFAULT_CROSSOVER_RATE: f64 = 0.3;

/// Number of best genomes persisted after the last round.
pub const PERSISTED_TOP_N: usize = 3;

const MAX_POPULATION_SIZE: usize = 1_000;
const MAX_GENERATIONS: u32 = 1_000;

// ============================================================================
// EVALUATION
// ============================================================================

/// Post-hoc feedback on a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub run_id: RunId,
    /// Explicit score in [0, 1]. Absent or 0 falls back to `correctness`.
    #[serde(default)]
    pub fitness: Option<f64>,
    #[serde(default)]
    pub correctness: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl EvaluationRequest {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            fitness: None,
            correctness: false,
            feedback: None,
        }
    }

    /// Explicit score if nonzero, else 1.0 for a correct run, else 0.5.
    fn resolved_fitness(&self) -> HelixResult<f64> {
        match self.fitness {
            Some(f) if f != 0.0 => {
                if !(0.0..=1.0).contains(&f) {
                    return Err(HelixError::invalid_value(
                        "fitness",
                        format!("{} is outside [0, 1]", f),
                    ));
                }
                Ok(f)
            }
            _ if self.correctness => Ok(1.0),
            _ => Ok(DEFAULT_FITNESS),
        }
    }
}

// ============================================================================
// EVOLUTION
// ============================================================================

/// Parameters for one evolution run. Zero values mean "use the default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionParams {
    /// Description of the target task. Passed to the fitness evaluator.
    #[serde(default)]
    pub task: String,
    pub parent_ids: Vec<GenomeId>,
    #[serde(default)]
    pub population_size: usize,
    #[serde(default)]
    pub generations: u32,
    #[serde(default)]
    pub mutation_rate: f64,
    #[serde(default)]
    pub crossover_rate: f64,
    /// Defaults to `min(2, population / 2)`, clamped to `[1, population]`.
    #[serde(default)]
    pub elite_count: usize,
    /// Fixes the random stream for a reproducible run.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl EvolutionParams {
    pub fn new(task: impl Into<String>, parent_ids: Vec<GenomeId>) -> Self {
        Self {
            task: task.into(),
            parent_ids,
            ..Default::default()
        }
    }

    pub fn with_population(mut self, population_size: usize, generations: u32) -> Self {
        self.population_size = population_size;
        self.generations = generations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fill in defaults and check ranges.
    fn resolve(mut self) -> HelixResult<Self> {
        if self.parent_ids.is_empty() {
            return Err(HelixError::missing_field("parent_ids"));
        }
        if self.population_size == 0 {
            self.population_size = DEFAULT_POPULATION_SIZE;
        }
        if self.generations == 0 {
            self.generations = DEFAULT_GENERATIONS;
        }
        if self.mutation_rate == 0.0 {
            self.mutation_rate = DEFAULT_MUTATION_RATE;
        }
        if self.crossover_rate == 0.0 {
            self.crossover_rate = DEFAULT_CROSSOVER_RATE;
        }
        self.elite_count = if self.elite_count == 0 {
            (self.population_size / 2).min(2)
        } else {
            self.elite_count
        }
        .clamp(1, self.population_size);

        if self.population_size > MAX_POPULATION_SIZE {
            return Err(ValidationError::CapacityExceeded {
                requested: self.population_size,
                max: MAX_POPULATION_SIZE,
            }
            .into());
        }
        if self.generations > MAX_GENERATIONS {
            return Err(ValidationError::CapacityExceeded {
                requested: self.generations as usize,
                max: MAX_GENERATIONS as usize,
            }
            .into());
        }
        for (field, rate) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(HelixError::invalid_value(
                    field,
                    format!("{} is outside [0, 1]", rate),
                ));
            }
        }
        Ok(self)
    }
}

/// Outcome of an evolution run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionReport {
    pub generations: u32,
    /// The persisted genomes, best first.
    pub best_agents: Vec<AgentGenome>,
    /// Highest score assigned in any round.
    pub best_fitness: f64,
}

/// Stable descending sort; equal scores keep their current order.
fn sort_by_fitness(population: &mut [AgentGenome]) {
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}

impl Orchestrator {
    /// Record a score on a run and on its genome, if the genome still exists.
    pub fn evaluate(&self, request: EvaluationRequest) -> HelixResult<f64> {
        let fitness = request.resolved_fitness()?;

        let mut state = self.write_state()?;
        let run = state
            .runs
            .get_mut(&request.run_id)
            .ok_or_else(|| HelixError::not_found(EntityType::Run, request.run_id))?;
        run.fitness = Some(fitness);
        if let Some(feedback) = request.feedback.filter(|f| !f.is_empty()) {
            run.metadata
                .insert("feedback".to_string(), serde_json::Value::String(feedback));
        }

        let genome_id = run.genome_id;
        if let Some(genome) = state.genomes.get_mut(&genome_id) {
            genome.fitness = fitness;
        }

        tracing::debug!(run_id = %request.run_id, fitness, "Evaluated run");
        Ok(fitness)
    }

    /// Breed new genomes from registered parents and persist the best three.
    ///
    /// Parents are snapshotted up front; the lock is not held while the
    /// population evolves.
    pub fn evolve(&self, params: EvolutionParams) -> HelixResult<EvolutionReport> {
        let params = params.resolve()?;

        let parents: Vec<AgentGenome> = {
            let state = self.read_state()?;
            let mut seen = Vec::new();
            params
                .parent_ids
                .iter()
                .filter(|id| {
                    if seen.contains(*id) {
                        false
                    } else {
                        seen.push(**id);
                        true
                    }
                })
                .filter_map(|id| state.genomes.get(id).cloned())
                .collect()
        };
        if parents.is_empty() {
            return Err(HelixError::invalid_value(
                "parent_ids",
                "no valid parent agents found",
            ));
        }

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut population = Vec::with_capacity(params.population_size);
        for i in 0..params.population_size {
            let source = match parents.get(i) {
                Some(parent) => parent,
                None => &parents[rng.random_range(0..parents.len())],
            };
            let mut member = mutate(source, params.mutation_rate, &mut rng);
            member.generation = 1;
            member.parent_ids = params.parent_ids.clone();
            population.push(member);
        }

        let mut best_fitness = f64::NEG_INFINITY;
        for round in 0..params.generations {
            for member in population.iter_mut() {
                let score = self.fitness.score(member, &params.task, &mut rng).clamp(0.0, 1.0);
                member.fitness = score;
                best_fitness = best_fitness.max(score);
            }
            sort_by_fitness(&mut population);

            let elite = params.elite_count.min(population.len());
            let mut next: Vec<AgentGenome> = population[..elite].to_vec();
            while next.len() < params.population_size {
                let a = &population[rng.random_range(0..elite)];
                let b = &population[rng.random_range(0..elite)];

                let mut child = if rng.random_bool(params.crossover_rate) {
                    crossover(a, b, &mut rng)
                } else {
                    mutate(a, params.mutation_rate, &mut rng)
                };
                child.generation = round + 1;
                child.parent_ids = if a.id == b.id {
                    vec![a.id]
                } else {
                    vec![a.id, b.id]
                };
                next.push(child);
            }
            population = next;

            tracing::trace!(round, best_fitness, "Evolution round complete");
        }

        sort_by_fitness(&mut population);
        population.truncate(PERSISTED_TOP_N);

        {
            let mut state = self.write_state()?;
            for genome in &population {
                state.genomes.insert(genome.id, genome.clone());
            }
        }

        tracing::info!(
            generations = params.generations,
            population = params.population_size,
            persisted = population.len(),
            best_fitness,
            "Evolution finished"
        );

        Ok(EvolutionReport {
            generations: params.generations,
            best_agents: population,
            best_fitness,
        })
    }
}
