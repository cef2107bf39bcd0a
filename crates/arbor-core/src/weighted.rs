//! Weighted sampling for pool-style composites.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rng::{derive_seed, DeterministicRng, SplitMix64};

/// How a weighted pool seeds its generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SeedMode {
    /// Seed derived from the owning evaluator's identity: the same evaluator
    /// reproduces the same draws on every run.
    #[default]
    PerEvaluator,
    /// Fresh entropy every time the owning node starts.
    RandomOnStart,
}

/// Weight reported by candidates that do not declare one.
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// Clamps a candidate weight into the non-negative finite range.
pub fn sanitize_weight(weight: f32) -> f32 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Draws candidates proportionally to their weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedSelector {
    rng: SplitMix64,
}

impl WeightedSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SplitMix64::new(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: SplitMix64::from_entropy(),
        }
    }

    /// Selector for an evaluator-owned pool.
    ///
    /// `stream` separates pools that share an evaluator (the pool's node id).
    pub fn per_evaluator(global_seed: u64, evaluator_id: u64, stream: u64) -> Self {
        Self::new(derive_seed(global_seed, evaluator_id, stream))
    }

    /// Picks one index, or `None` when `weights` is empty.
    ///
    /// Draws `r` uniformly in `[0, total)` and returns the first index whose
    /// cumulative weight reaches `r`. Negative and non-finite weights count as zero.
    pub fn draw_index(&mut self, weights: &[f32]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }

        let total: f64 = weights.iter().map(|w| sanitize_weight(*w) as f64).sum();
        let r = self.rng.next_f64_unit() * total;

        let mut cumulative = 0.0f64;
        for (index, weight) in weights.iter().enumerate() {
            cumulative += sanitize_weight(*weight) as f64;
            if cumulative >= r {
                return Some(index);
            }
        }

        // Rounding can leave `r` marginally above the final sum.
        Some(weights.len() - 1)
    }

    /// Picks one candidate from `(candidate, weight)` pairs.
    pub fn draw<T: Copy>(&mut self, candidates: &[(T, f32)]) -> Option<T> {
        let weights: Vec<f32> = candidates.iter().map(|(_, w)| *w).collect();
        self.draw_index(&weights).map(|i| candidates[i].0)
    }

    /// Draws every index once, excluding already-drawn ones from later draws.
    pub fn permutation(&mut self, weights: &[f32]) -> Vec<usize> {
        let mut remaining: Vec<usize> = (0..weights.len()).collect();
        let mut order = Vec::with_capacity(weights.len());

        while !remaining.is_empty() {
            let pool: Vec<f32> = remaining.iter().map(|&i| weights[i]).collect();
            let Some(pick) = self.draw_index(&pool) else {
                break;
            };
            order.push(remaining.remove(pick));
        }

        order
    }
}
