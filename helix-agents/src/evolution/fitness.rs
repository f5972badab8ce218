//! Fitness scoring used during evolution.

use helix_core::AgentGenome;
use rand::rngs::StdRng;
use rand::Rng;

/// Scores a population member for one generational round.
///
/// Scores outside [0, 1] are clamped by the optimizer.
pub trait FitnessEvaluator: Send + Sync {
    fn score(&self, genome: &AgentGenome, task: &str, rng: &mut StdRng) -> f64;
}

/// Stand-in evaluator: `0.3 + U(0, 1) * 0.7`, independent of genome and task.
///
/// It keeps selection pressure random. Plug in a real evaluator to make
/// evolution meaningful.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedFitness;

impl FitnessEvaluator for SimulatedFitness {
    fn score(&self, _genome: &AgentGenome, _task: &str, rng: &mut StdRng) -> f64 {
        0.3 + rng.random::<f64>() * 0.7
    }
}
