//! The generational loop.
//!
//! # Phases
//!
//! ```text
//! Idle ──► RunningEpisode ──► Scoring ──► Selecting ──► NextGeneration ─┐
//!               ▲                │                                     │
//!               │                └──► Done (generation budget spent)   │
//!               └──────────────────────────────────────────────────────┘
//! ```
//!
//! - **Idle** - The initial genomes are drawn.
//! - **RunningEpisode** - A fresh target is placed, the genomes are spawned
//!   and the episode runs to its end.
//! - **Scoring** - The episode's statistics are recorded, the best genome is
//!   updated and the generation counter advances by one.
//! - **Selecting** - The strategy builds the next genomes. An empty scored
//!   set is handled by [`EmptyGenerationPolicy`].
//! - **NextGeneration** - The new genomes replace the old ones.
//!
//! Every transition is available individually through
//! [`EvolutionEngine::advance`], so callers can observe or interleave the
//! phases. [`EvolutionEngine::run_generation`] and [`EvolutionEngine::run`]
//! drive them in bulk.

use dronevo_controller::genome::Genome;
use dronevo_engine::Environment;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    ConfigError, EvolutionError,
    config::{EmptyGenerationPolicy, StrategyKind, TrainingConfig},
    episode::{Episode, EpisodeStats},
    population::{Population, ScoredGenome},
    species::SpeciatedReproduction,
    strategy::{GenerationStrategy, RouletteCrossover},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum EnginePhase {
    Idle,
    RunningEpisode,
    Scoring,
    Selecting,
    NextGeneration,
    Done,
}

/// Summary of one completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Zero-based index of the generation.
    pub generation: u32,
    pub stats: EpisodeStats,
    /// `None` when the generation had no agents.
    pub best_fitness: Option<f32>,
    pub mean_fitness: Option<f32>,
    /// Whether the genomes for the following generation were drawn afresh.
    pub reseeded: bool,
    /// Random genomes added because the strategy returned too few.
    #[serde(default)]
    pub topped_up: usize,
}

#[derive(Debug)]
pub struct EvolutionEngine {
    config: TrainingConfig,
    strategy: Box<dyn GenerationStrategy>,
    seed: u64,
    rng: Pcg32,
    phase: EnginePhase,
    generation: u32,
    genomes: Vec<Genome>,
    scored: Vec<ScoredGenome>,
    best: Option<ScoredGenome>,
    history: Vec<GenerationReport>,
}

impl EvolutionEngine {
    /// Creates an engine with the strategy named in the configuration.
    pub fn new(config: TrainingConfig) -> Result<Self, ConfigError> {
        let strategy: Box<dyn GenerationStrategy> = match config.evolution.strategy {
            StrategyKind::Roulette => Box::new(RouletteCrossover::from_config(&config.evolution)),
            StrategyKind::Speciated => Box::new(SpeciatedReproduction::new(
                config.evolution.speciation.clone(),
            )),
        };
        Self::with_strategy(config, strategy)
    }

    /// Creates an engine with a caller-supplied strategy.
    pub fn with_strategy(
        config: TrainingConfig,
        strategy: Box<dyn GenerationStrategy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.evolution.seed.unwrap_or_else(rand::random);
        Ok(Self {
            config,
            strategy,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: EnginePhase::Idle,
            generation: 0,
            genomes: vec![],
            scored: vec![],
            best: None,
            history: vec![],
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Seed of the engine's random number generator.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Number of completed episodes.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Genomes of the generation about to fly (or that just flew).
    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Best genome seen in any generation so far.
    #[must_use]
    pub fn best(&self) -> Option<&ScoredGenome> {
        self.best.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &[GenerationReport] {
        &self.history
    }

    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Performs one phase transition and returns the new phase.
    pub fn advance(&mut self) -> Result<EnginePhase, EvolutionError> {
        self.phase = match self.phase {
            EnginePhase::Idle => {
                self.genomes = self.random_genomes();
                EnginePhase::RunningEpisode
            }
            EnginePhase::RunningEpisode => {
                let episode = self.build_episode();
                self.run_episode(episode);
                EnginePhase::Scoring
            }
            // scoring happens at the end of `run_episode`
            EnginePhase::Scoring => {
                if self.generation >= self.config.evolution.generations {
                    EnginePhase::Done
                } else {
                    EnginePhase::Selecting
                }
            }
            EnginePhase::Selecting => self.select()?,
            EnginePhase::NextGeneration => EnginePhase::RunningEpisode,
            EnginePhase::Done => EnginePhase::Done,
        };
        Ok(self.phase)
    }

    /// Runs phases until one more generation has been scored.
    ///
    /// Returns the report of that generation, or `None` if the engine was
    /// already done.
    pub fn run_generation(&mut self) -> Result<Option<&GenerationReport>, EvolutionError> {
        let target = self.generation + 1;
        while !self.phase.is_done() && self.generation < target {
            self.advance()?;
        }
        if self.generation < target {
            return Ok(None);
        }
        // settle into Selecting or Done
        self.advance()?;
        Ok(self.history.last())
    }

    /// Runs until the generation budget is spent.
    pub fn run(&mut self) -> Result<&[GenerationReport], EvolutionError> {
        while !self.phase.is_done() {
            self.advance()?;
        }
        Ok(&self.history)
    }

    /// Builds the episode for the current genomes without running it.
    ///
    /// The target is placed with the engine's generator, so building an
    /// episode consumes randomness exactly like a training step does.
    pub fn build_episode(&mut self) -> Episode {
        let simulation = &self.config.simulation;
        let environment = Environment::with_random_target(simulation.environment.clone(), &mut self.rng);
        let population = Population::spawn(
            self.genomes.clone(),
            &self.config.controller,
            &environment,
            &mut self.rng,
        )
        .with_parallel(self.config.evolution.parallel);
        Episode::new(self.generation, population, environment, simulation)
    }

    /// Runs `episode` to its end and scores it as the current generation.
    ///
    /// Lets callers drive or observe the episode tick by tick (for example to
    /// move the target) and hand it back afterwards.
    pub fn run_episode(&mut self, mut episode: Episode) {
        episode.run_to_end();
        let outcome = episode.finish();
        self.score(outcome.scored, outcome.stats);
        self.phase = EnginePhase::Scoring;
    }

    fn score(&mut self, scored: Vec<ScoredGenome>, stats: EpisodeStats) {
        debug!(
            generation = self.generation,
            ticks = stats.ticks,
            survivors = stats.survivors,
            "episode finished"
        );
        if stats.substitutions > 0 {
            warn!(
                generation = self.generation,
                substitutions = stats.substitutions,
                "genomes replaced because of a layer shape mismatch"
            );
        }

        let best = scored
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .cloned();
        #[expect(clippy::cast_precision_loss)]
        let mean_fitness = (!scored.is_empty())
            .then(|| scored.iter().map(|s| s.fitness).sum::<f32>() / scored.len() as f32);
        let best_fitness = best.as_ref().map(|b| b.fitness);

        if let Some(best) = best
            && self.best.as_ref().is_none_or(|b| best.fitness > b.fitness)
        {
            self.best = Some(best);
        }

        info!(
            generation = self.generation,
            captures = stats.captures,
            out_of_bounds = stats.out_of_bounds,
            best_fitness,
            mean_fitness,
            first_capture_secs = stats.first_capture_time.map(|t| t.as_secs_f32()),
            "generation scored"
        );
        self.history.push(GenerationReport {
            generation: self.generation,
            stats,
            best_fitness,
            mean_fitness,
            reseeded: false,
            topped_up: 0,
        });
        self.scored = scored;
        self.generation += 1;
    }

    fn select(&mut self) -> Result<EnginePhase, EvolutionError> {
        let size = self.config.evolution.population_size;
        let result = if self.scored.is_empty() {
            Err(EvolutionError::InsufficientFitnessData)
        } else {
            self.strategy
                .next_generation(&self.scored, size, &mut self.rng)
        };

        match result {
            Ok(genomes) => {
                self.genomes = self.fill_to_size(genomes, size);
                Ok(EnginePhase::NextGeneration)
            }
            Err(e) => match self.config.evolution.empty_generation {
                EmptyGenerationPolicy::Reseed => {
                    warn!(generation = self.generation, "{e}; reseeding the population");
                    self.genomes = self.random_genomes();
                    if let Some(report) = self.history.last_mut() {
                        report.reseeded = true;
                    }
                    Ok(EnginePhase::NextGeneration)
                }
                EmptyGenerationPolicy::Halt => {
                    self.phase = EnginePhase::Done;
                    Err(e)
                }
            },
        }
    }

    /// Pads a short generation with random genomes and cuts a long one.
    fn fill_to_size(&mut self, mut genomes: Vec<Genome>, size: usize) -> Vec<Genome> {
        if genomes.len() > size {
            warn!(
                strategy = self.strategy.name(),
                returned = genomes.len(),
                size,
                "strategy returned too many genomes; truncating"
            );
            genomes.truncate(size);
        }
        let missing = size - genomes.len();
        if missing > 0 {
            warn!(
                strategy = self.strategy.name(),
                returned = genomes.len(),
                size,
                "strategy returned too few genomes; topping up with random ones"
            );
            let shape = &self.config.controller.layer_shape;
            genomes.extend((0..missing).map(|_| Genome::random(shape, &mut self.rng)));
            if let Some(report) = self.history.last_mut() {
                report.topped_up = missing;
            }
        }
        genomes
    }

    fn random_genomes(&mut self) -> Vec<Genome> {
        let shape = &self.config.controller.layer_shape;
        (0..self.config.evolution.population_size)
            .map(|_| Genome::random(shape, &mut self.rng))
            .collect()
    }
}
