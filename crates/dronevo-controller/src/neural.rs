//! Feed-forward controller built from a decoded genome.
//!
//! # Forward Pass
//!
//! The observation is treated as a row vector and multiplied through each
//! weight layer in turn, with `tanh` after every layer. The final outputs
//! therefore lie in `(-1, 1)` and are turned into discrete commands by a
//! [`ThresholdPolicy`]:
//!
//! - output 0 drives the vertical axis (positive means up)
//! - output 1 drives the horizontal axis (positive means right)

use dronevo_engine::{ControlInput, Controller, Horizontal, Vertical};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::{
    ShapeMismatchError,
    codec::{self, WeightLayer},
    genome::Genome,
    layer_shape::LayerShape,
};

/// How raw network outputs become commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Fire only when the output leaves `[-threshold, threshold]`.
    Band { threshold: f32 },
    /// Fire on the sign of the output; exactly zero means idle.
    ///
    /// Unless `vertical_down` is set, a negative vertical output is idle and
    /// only gravity brings the drone down.
    Sign {
        #[serde(default)]
        vertical_down: bool,
    },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::Band { threshold: 0.5 }
    }
}

impl ThresholdPolicy {
    /// Sign thresholding with up-or-idle vertical control.
    pub const SIGN: Self = Self::Sign {
        vertical_down: false,
    };

    /// Classifies one output as positive (`Some(true)`), negative
    /// (`Some(false)`) or idle (`None`).
    fn classify(self, value: f32) -> Option<bool> {
        let threshold = match self {
            Self::Band { threshold } => threshold,
            Self::Sign { .. } => 0.0,
        };
        if value > threshold {
            Some(true)
        } else if value < -threshold {
            Some(false)
        } else {
            None
        }
    }

    fn allows_down(self) -> bool {
        match self {
            Self::Band { .. } => true,
            Self::Sign { vertical_down } => vertical_down,
        }
    }

    /// Turns `[vertical, horizontal]` outputs into a control command.
    ///
    /// Missing outputs are treated as idle.
    #[must_use]
    pub fn command(self, outputs: &[f32]) -> ControlInput {
        let vertical = match outputs.first().and_then(|&v| self.classify(v)) {
            Some(true) => Vertical::Up,
            Some(false) if self.allows_down() => Vertical::Down,
            Some(false) | None => Vertical::Idle,
        };
        let horizontal = match outputs.get(1).and_then(|&v| self.classify(v)) {
            Some(true) => Horizontal::Right,
            Some(false) => Horizontal::Left,
            None => Horizontal::Idle,
        };
        ControlInput::new(vertical, horizontal)
    }
}

/// Network layout and output policy shared by a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub layer_shape: LayerShape,
    #[serde(default)]
    pub threshold: ThresholdPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::hover()
    }
}

impl ControllerConfig {
    /// Two relative inputs wired straight to two outputs, banded at ±0.5.
    #[must_use]
    pub fn hover() -> Self {
        Self {
            layer_shape: LayerShape(vec![2, 2]),
            threshold: ThresholdPolicy::default(),
        }
    }

    /// Six absolute inputs wired straight to two outputs, sign-thresholded.
    #[must_use]
    pub fn gravity() -> Self {
        Self {
            layer_shape: LayerShape(vec![6, 2]),
            threshold: ThresholdPolicy::SIGN,
        }
    }
}

/// Dense tanh network driving one drone.
#[derive(Debug, Clone)]
pub struct NeuralController {
    layers: Vec<WeightLayer>,
    policy: ThresholdPolicy,
}

impl NeuralController {
    /// Wraps already decoded weight layers.
    #[must_use]
    pub fn new(layers: Vec<WeightLayer>, policy: ThresholdPolicy) -> Self {
        Self { layers, policy }
    }

    /// Decodes `genome` for `shape` and wraps the result.
    pub fn from_genome(
        genome: &Genome,
        shape: &LayerShape,
        policy: ThresholdPolicy,
    ) -> Result<Self, ShapeMismatchError> {
        Ok(Self::new(codec::decode(genome, shape)?, policy))
    }

    #[must_use]
    pub fn layers(&self) -> &[WeightLayer] {
        &self.layers
    }

    #[must_use]
    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    /// Number of inputs the first layer expects.
    #[must_use]
    pub fn input_width(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.nrows())
    }

    /// Raw network outputs for `observation`.
    ///
    /// Returns `None` when the observation width does not match the first layer.
    #[must_use]
    pub fn forward(&self, observation: &[f32]) -> Option<Array1<f32>> {
        if observation.len() != self.input_width() {
            return None;
        }
        let mut activation = ArrayView1::from(observation).to_owned();
        for layer in &self.layers {
            activation = activation.dot(layer);
            activation.mapv_inplace(f32::tanh);
        }
        Some(activation)
    }
}

impl Controller for NeuralController {
    fn act(&self, observation: &[f32]) -> ControlInput {
        match self.forward(observation) {
            Some(outputs) => self.policy.command(outputs.as_slice().unwrap_or(&[])),
            None => ControlInput::IDLE,
        }
    }
}
