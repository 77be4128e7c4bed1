//! Fitness-proportionate selection.
//!
//! # Normalization
//!
//! Scores are turned into probabilities that sum to one. Fitness can be zero
//! or negative (penalties dominate early generations), so when the smallest
//! score is not positive every score is shifted so that the smallest maps to
//! `epsilon`:
//!
//! ```text
//! weight_i = score_i - min + epsilon    (only when min <= 0)
//! p_i      = weight_i / Σ weight
//! ```
//!
//! An all-tied population therefore becomes uniform instead of dividing by
//! zero.
//!
//! # Spinning
//!
//! A spin draws `u` uniformly from `[0, 1)` and walks the cumulative
//! probabilities until they reach `u`. Rounding can leave the sum slightly
//! below one; the walk stops at the last index rather than running past it.

use rand::Rng;

use crate::EvolutionError;

#[derive(Debug, Clone)]
pub struct RouletteWheel {
    probabilities: Vec<f32>,
}

impl RouletteWheel {
    /// Builds a wheel over `scores`.
    ///
    /// Fails with [`EvolutionError::InsufficientFitnessData`] when `scores`
    /// is empty. Non-finite scores are treated as the worst finite score.
    pub fn new(scores: &[f32], epsilon: f32) -> Result<Self, EvolutionError> {
        if scores.is_empty() {
            return Err(EvolutionError::InsufficientFitnessData);
        }

        let finite_min = scores
            .iter()
            .copied()
            .filter(|s| s.is_finite())
            .fold(f32::INFINITY, f32::min);
        let floor = if finite_min.is_finite() { finite_min } else { 0.0 };
        let sanitized = scores
            .iter()
            .map(|&s| if s.is_finite() { s } else { floor });

        let weights: Vec<f32> = if floor <= 0.0 {
            sanitized.map(|s| s - floor + epsilon).collect()
        } else {
            sanitized.collect()
        };
        let total: f32 = weights.iter().sum();
        let probabilities = weights.iter().map(|w| w / total).collect();
        Ok(Self { probabilities })
    }

    /// Normalized selection probability of every entry.
    #[must_use]
    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    /// Draws one index.
    pub fn spin<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let turn: f32 = rng.random();
        let last = self.probabilities.len() - 1;
        let mut index = 0;
        let mut counter = self.probabilities[0];
        while counter < turn && index < last {
            index += 1;
            counter += self.probabilities[index];
        }
        index
    }
}
