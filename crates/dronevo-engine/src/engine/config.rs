use serde::{Deserialize, Serialize};

use crate::{EnvironmentConfig, EpisodeConfig, core::PhysicsConfig};

/// Everything needed to reproduce an episode apart from the controllers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub physics: PhysicsConfig,
    pub environment: EnvironmentConfig,
    pub episode: EpisodeConfig,
}

impl SimulationConfig {
    /// Gravity-free world with drag on both axes and relative observations.
    #[must_use]
    pub fn hover() -> Self {
        Self {
            physics: PhysicsConfig::hover(),
            environment: EnvironmentConfig::hover(),
            episode: EpisodeConfig::default(),
        }
    }

    /// World with constant gravity and absolute observations.
    #[must_use]
    pub fn gravity() -> Self {
        Self {
            physics: PhysicsConfig::gravity(),
            environment: EnvironmentConfig::gravity(),
            episode: EpisodeConfig {
                tick_rate: 30,
                tick_budget: 5 * 30,
            },
        }
    }
}
