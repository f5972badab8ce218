//! Mutation and crossover operators.
//!
//! Both return a new genome with a fresh ID. Callers set generation and
//! parent IDs.

use helix_core::{AgentGenome, DEFAULT_FITNESS, MAX_TEMPERATURE};
use rand::Rng;

/// Maximum temperature shift applied by one mutation, in either direction.
const TEMPERATURE_STEP: f64 = 0.1;

/// Width, in characters, of the prompt window kept by a prompt mutation.
const PROMPT_WINDOW: usize = 50;

/// Synthetic tool names are drawn from `tool_0` ..= `tool_99`.
const SYNTHETIC_TOOL_RANGE: u32 = 100;

/// Temperatures are kept to nine decimal places.
fn quantize(temperature: f64) -> f64 {
    (temperature * 1e9).round() / 1e9
}

/// A random contiguous window of `width` characters, if the prompt is longer.
fn prompt_window<R: Rng>(prompt: &str, width: usize, rng: &mut R) -> Option<String> {
    let chars: Vec<char> = prompt.chars().collect();
    if chars.len() <= width {
        return None;
    }
    let start = rng.random_range(0..=chars.len() - width);
    Some(chars[start..start + width].iter().collect())
}

fn first_half(s: &str) -> String {
    let mid = s.chars().count() / 2;
    s.chars().take(mid).collect()
}

fn second_half(s: &str) -> String {
    let mid = s.chars().count() / 2;
    s.chars().skip(mid).collect()
}

/// Perturb a copy of `genome`.
///
/// Each of temperature, prompt and tools is mutated independently with
/// probability `rate`.
pub fn mutate<R: Rng>(genome: &AgentGenome, rate: f64, rng: &mut R) -> AgentGenome {
    let mut child = genome.clone_as_new();

    if rng.random::<f64>() < rate {
        let delta = (rng.random::<f64>() - 0.5) * 2.0 * TEMPERATURE_STEP;
        child.temperature = quantize((genome.temperature + delta).clamp(0.0, MAX_TEMPERATURE));
    }

    if rng.random::<f64>() < rate {
        if let Some(window) = prompt_window(&genome.system_prompt, PROMPT_WINDOW, rng) {
            child.system_prompt = window;
        }
    }

    if rng.random::<f64>() < rate {
        if !child.tools.is_empty() && rng.random_bool(0.5) {
            let idx = rng.random_range(0..child.tools.len());
            if let Some(tool) = child.tools.iter().nth(idx).cloned() {
                child.tools.remove(&tool);
            }
        } else {
            let n = rng.random_range(0..SYNTHETIC_TOOL_RANGE);
            child.tools.insert(format!("tool_{}", n));
        }
    }

    child
}

/// Combine two genomes into one child based on `a`.
///
/// The prompt is spliced from both halves with probability 0.5, each of
/// `b`'s tools joins with probability 0.5, temperatures are averaged and
/// fitness resets to the default.
pub fn crossover<R: Rng>(a: &AgentGenome, b: &AgentGenome, rng: &mut R) -> AgentGenome {
    let mut child = a.clone_as_new();

    if rng.random_bool(0.5) && !a.system_prompt.is_empty() && !b.system_prompt.is_empty() {
        child.system_prompt = format!("{}{}", first_half(&a.system_prompt), second_half(&b.system_prompt));
    }

    for tool in &b.tools {
        if rng.random_bool(0.5) {
            child.tools.insert(tool.clone());
        }
    }

    child.temperature = quantize((a.temperature + b.temperature) / 2.0);
    child.fitness = DEFAULT_FITNESS;
    child
}
