//! Generational training of drone controllers.
//!
//! This crate turns the simulation core and the neural controllers into an
//! evolutionary search that improves genomes one episode at a time.
//!
//! # How Training Works
//!
//! 1. **Population** - Every genome is decoded into a controller and paired
//!    with a freshly spawned agent
//! 2. **Episode** - All agents fly against the same target until every agent
//!    has finished or the tick budget runs out
//! 3. **Scoring** - Each agent's accumulated fitness is paired with its genome
//! 4. **Selection** - A [`GenerationStrategy`](strategy::GenerationStrategy)
//!    produces the next generation's genomes from the scored ones
//! 5. **Repeat** - Until the generation budget is spent
//!
//! # Architecture
//!
//! ```text
//! EvolutionEngine ──owns──► Pcg32, history, best genome
//!     │ runs
//!     ▼
//! Episode ──► Population ──► NeuralController ──► Environment::advance
//!     │ finishes into
//!     ▼
//! ScoredGenome[] ──► GenerationStrategy ──► Genome[]
//! ```
//!
//! Two strategies ship with the crate:
//!
//! - [`RouletteCrossover`](strategy::RouletteCrossover) - fitness-proportionate
//!   selection followed by single-point crossover
//! - [`SpeciatedReproduction`](species::SpeciatedReproduction) - genomes are
//!   grouped into species by weight distance and reproduce within them
//!
//! # Determinism
//!
//! The engine owns the only random number generator. Target placement,
//! initial genomes, selection, crossover and mutation all draw from it, while
//! physics, observation, forward pass and scoring consume no randomness. The
//! optional parallel tick computes agents concurrently but applies their
//! results in agent order, so a seeded run is reproducible either way.
//!
//! # Example
//!
//! ```
//! use dronevo_training::{config::TrainingConfig, evolution::EvolutionEngine};
//!
//! let mut config = TrainingConfig::hover();
//! config.evolution.population_size = 6;
//! config.evolution.generations = 2;
//! config.evolution.seed = Some(7);
//! config.simulation.episode.tick_budget = 20;
//!
//! let mut engine = EvolutionEngine::new(config).unwrap();
//! engine.run().unwrap();
//! assert_eq!(engine.generation(), 2);
//! assert_eq!(engine.history().len(), 2);
//! ```

pub mod config;
pub mod episode;
pub mod evolution;
pub mod operators;
pub mod population;
pub mod selection;
pub mod snapshot;
pub mod species;
pub mod strategy;

/// A training configuration that cannot produce a meaningful run.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("controller expects {input} inputs but the environment observes {observation}")]
    ObservationWidthMismatch { observation: usize, input: usize },
    #[display("controller must produce 2 outputs, got {width}")]
    OutputWidth { width: usize },
    #[display("population size must be at least 2, got {size}")]
    PopulationTooSmall { size: usize },
    #[display("elite count {elite_count} must be smaller than population size {population_size}")]
    TooManyElites {
        elite_count: usize,
        population_size: usize,
    },
    #[display("generation budget must be positive")]
    ZeroGenerations,
    #[display("{name} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f32 },
    #[display("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
}

/// Failure while producing the next generation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EvolutionError {
    #[display("no scored genomes to select from")]
    InsufficientFitnessData,
}
