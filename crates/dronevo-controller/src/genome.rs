//! Flat weight vectors evolved by the training loop.
//!
//! A [`Genome`] is immutable once built: genetic operators read parents and
//! produce new genomes rather than editing in place.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{codec, layer_shape::LayerShape};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome(Vec<f32>);

impl Genome {
    #[must_use]
    pub fn from_vec(weights: Vec<f32>) -> Self {
        Self(weights)
    }

    /// Creates a genome with Glorot-uniform weights for `shape`.
    ///
    /// See [`codec::random_layers`].
    pub fn random<R>(shape: &LayerShape, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        codec::encode(&codec::random_layers(shape, rng))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Euclidean distance between two genomes.
    ///
    /// Extra trailing weights of the longer genome count as distance from zero.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let (long, short) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let shared = short
            .0
            .iter()
            .zip(&long.0)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>();
        let tail = long.0[short.len()..].iter().map(|w| w * w).sum::<f32>();
        (shared + tail).sqrt()
    }
}

impl From<Vec<f32>> for Genome {
    fn from(weights: Vec<f32>) -> Self {
        Self(weights)
    }
}

impl AsRef<[f32]> for Genome {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}
