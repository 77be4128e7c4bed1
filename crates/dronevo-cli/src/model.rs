use std::path::Path;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use dronevo_controller::{
    genome::Genome,
    layer_shape::LayerShape,
    neural::{ControllerConfig, NeuralController, ThresholdPolicy},
};
use dronevo_engine::SimulationConfig;
use dronevo_training::config::StrategyKind;
use serde::{Deserialize, Serialize};

use crate::util;

/// A trained controller together with the world it was trained in.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DroneModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub final_fitness: f32,
    pub generations: u32,
    pub seed: u64,
    pub strategy: StrategyKind,
    pub layer_shape: LayerShape,
    #[serde(default)]
    pub threshold: ThresholdPolicy,
    pub simulation: SimulationConfig,
    pub genome: Genome,
}

impl DroneModel {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        util::read_json_file("drone model", path)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            layer_shape: self.layer_shape.clone(),
            threshold: self.threshold,
        }
    }

    /// Decodes the stored genome, failing when it does not fit the stored shape
    /// or cannot read the stored world's observation.
    pub fn controller(&self) -> anyhow::Result<NeuralController> {
        let controller = NeuralController::from_genome(&self.genome, &self.layer_shape, self.threshold)
            .with_context(|| format!("Model {:?} has a corrupt genome", self.name))?;
        let observation = self.simulation.environment.observation;
        if controller.input_width() != observation.width() {
            bail!(
                "Model {:?} reads {} inputs but a {observation:?} observation has {}",
                self.name,
                controller.input_width(),
                observation.width(),
            );
        }
        Ok(controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(genome: Vec<f32>) -> DroneModel {
        let controller = ControllerConfig::hover();
        DroneModel {
            name: "test".to_owned(),
            trained_at: Utc::now(),
            final_fitness: 9.5,
            generations: 3,
            seed: 42,
            strategy: StrategyKind::Roulette,
            layer_shape: controller.layer_shape,
            threshold: controller.threshold,
            simulation: SimulationConfig::hover(),
            genome: Genome::from_vec(genome),
        }
    }

    #[test]
    fn test_json_keeps_genome_and_shape() {
        let model = model(vec![0.1, -0.2, 0.3, -0.4]);
        let json = serde_json::to_string(&model).unwrap();
        let parsed: DroneModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.genome, model.genome);
        assert_eq!(parsed.layer_shape, model.layer_shape);
        assert_eq!(parsed.controller_config(), ControllerConfig::hover());
        assert!(parsed.controller().is_ok());
    }

    #[test]
    fn test_mismatched_genome_is_rejected() {
        assert!(model(vec![0.0; 3]).controller().is_err());
    }

    #[test]
    fn test_controller_must_read_the_stored_observation() {
        let mut model = model(vec![0.0; 4]);
        model.simulation = SimulationConfig::gravity();
        let err = model.controller().unwrap_err();
        assert!(err.to_string().contains("reads 2 inputs"));

        let gravity = ControllerConfig::gravity();
        model.layer_shape = gravity.layer_shape;
        model.threshold = gravity.threshold;
        model.genome = Genome::from_vec(vec![0.0; 12]);
        let controller = model.controller().unwrap();
        assert_eq!(controller.input_width(), 6);
        assert_eq!(controller.policy(), ThresholdPolicy::SIGN);
    }
}
