//! Training configuration.
//!
//! A [`TrainingConfig`] bundles the simulation, the controller layout and the
//! evolution parameters of one run. Every section deserializes with defaults
//! for missing fields, so a JSON file only needs the values it changes.

use dronevo_controller::neural::ControllerConfig;
use dronevo_engine::SimulationConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Reproduction strategy used between generations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Roulette-wheel selection and single-point crossover.
    #[default]
    Roulette,
    /// Distance-based species with fitness sharing.
    Speciated,
}

/// What to do when a generation produced no scored genomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyGenerationPolicy {
    /// Start the next generation from fresh random genomes.
    #[default]
    Reseed,
    /// Stop training and report the error.
    Halt,
}

/// Parameters of the speciated strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciationConfig {
    /// Genomes closer than this to a species representative join that species.
    pub compatibility_threshold: f32,
    /// Fraction of each species (best first) allowed to breed.
    pub survival_fraction: f32,
    /// Generations without improvement before a species stops reproducing.
    pub stagnation_limit: u32,
    /// Number of best species protected from stagnation removal.
    pub species_elitism: usize,
    pub crossover_probability: f32,
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
}

impl Default for SpeciationConfig {
    fn default() -> Self {
        Self {
            compatibility_threshold: 1.5,
            survival_fraction: 0.2,
            stagnation_limit: 20,
            species_elitism: 2,
            crossover_probability: 0.75,
            mutation_rate: 0.8,
            mutation_sigma: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    /// Number of episodes to run.
    pub generations: u32,
    pub strategy: StrategyKind,
    /// Probability that a selected pair is crossed over instead of copied.
    pub crossover_probability: f32,
    /// Best genomes copied unchanged into the next roulette generation.
    pub elite_count: usize,
    /// Per-weight probability of Gaussian mutation after crossover.
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
    /// Smallest selection weight after shifting non-positive fitness.
    pub selection_epsilon: f32,
    pub speciation: SpeciationConfig,
    pub empty_generation: EmptyGenerationPolicy,
    /// Compute agents of a tick on the rayon thread pool.
    pub parallel: bool,
    /// Seed of the run's random number generator; drawn from the OS when unset.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 50,
            strategy: StrategyKind::default(),
            crossover_probability: 1.0,
            elite_count: 0,
            mutation_rate: 0.0,
            mutation_sigma: 0.1,
            selection_epsilon: 1e-3,
            speciation: SpeciationConfig::default(),
            empty_generation: EmptyGenerationPolicy::default(),
            parallel: false,
            seed: None,
        }
    }
}

/// Everything needed to run one training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub simulation: SimulationConfig,
    pub controller: ControllerConfig,
    pub evolution: EvolutionConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::hover()
    }
}

impl TrainingConfig {
    /// Weightless hovering toward a target, scored with a time cost.
    #[must_use]
    pub fn hover() -> Self {
        Self {
            simulation: SimulationConfig::hover(),
            controller: ControllerConfig::hover(),
            evolution: EvolutionConfig::default(),
        }
    }

    /// Flying against gravity with absolute observations.
    #[must_use]
    pub fn gravity() -> Self {
        Self {
            simulation: SimulationConfig::gravity(),
            controller: ControllerConfig::gravity(),
            evolution: EvolutionConfig::default(),
        }
    }

    /// Checks that the sections agree with each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let shape = &self.controller.layer_shape;
        let observation = self.simulation.environment.observation.width();
        if shape.input_width() != observation {
            return Err(ConfigError::ObservationWidthMismatch {
                observation,
                input: shape.input_width(),
            });
        }
        if shape.output_width() != 2 {
            return Err(ConfigError::OutputWidth {
                width: shape.output_width(),
            });
        }

        let evolution = &self.evolution;
        if evolution.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall {
                size: evolution.population_size,
            });
        }
        if evolution.elite_count >= evolution.population_size {
            return Err(ConfigError::TooManyElites {
                elite_count: evolution.elite_count,
                population_size: evolution.population_size,
            });
        }
        if evolution.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }

        let speciation = &evolution.speciation;
        for (name, value) in [
            ("crossover_probability", evolution.crossover_probability),
            ("mutation_rate", evolution.mutation_rate),
            ("speciation.crossover_probability", speciation.crossover_probability),
            ("speciation.mutation_rate", speciation.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("selection_epsilon", evolution.selection_epsilon),
            ("speciation.compatibility_threshold", speciation.compatibility_threshold),
            ("speciation.survival_fraction", speciation.survival_fraction),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if speciation.survival_fraction > 1.0 {
            return Err(ConfigError::ProbabilityOutOfRange {
                name: "speciation.survival_fraction",
                value: speciation.survival_fraction,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dronevo_controller::layer_shape::LayerShape;

    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert_eq!(TrainingConfig::hover().validate(), Ok(()));
        assert_eq!(TrainingConfig::gravity().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_observation_width_mismatch() {
        let mut config = TrainingConfig::gravity();
        config.controller.layer_shape = LayerShape::new(vec![2, 2]).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::ObservationWidthMismatch {
                observation: 6,
                input: 2
            })
        );
    }

    #[test]
    fn test_rejects_wrong_output_width() {
        let mut config = TrainingConfig::hover();
        config.controller.layer_shape = LayerShape::new(vec![2, 4, 3]).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::OutputWidth { width: 3 }));
    }

    #[test]
    fn test_rejects_bad_evolution_parameters() {
        let mut config = TrainingConfig::hover();
        config.evolution.population_size = 1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::PopulationTooSmall { size: 1 })
        );

        let mut config = TrainingConfig::hover();
        config.evolution.crossover_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProbabilityOutOfRange {
                name: "crossover_probability",
                ..
            })
        ));

        let mut config = TrainingConfig::hover();
        config.evolution.generations = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroGenerations));

        let mut config = TrainingConfig::hover();
        config.evolution.selection_epsilon = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { .. })
        ));

        let mut config = TrainingConfig::hover();
        config.evolution.elite_count = config.evolution.population_size;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyElites { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrainingConfig = serde_json::from_str(
            r#"{ "evolution": { "population_size": 8, "strategy": "speciated" } }"#,
        )
        .unwrap();
        assert_eq!(config.evolution.population_size, 8);
        assert_eq!(config.evolution.strategy, StrategyKind::Speciated);
        assert_eq!(config.evolution.crossover_probability, 1.0);
        assert_eq!(config.controller, ControllerConfig::hover());
    }

    #[test]
    fn test_roundtrips_through_json() {
        let config = TrainingConfig::gravity();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TrainingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
