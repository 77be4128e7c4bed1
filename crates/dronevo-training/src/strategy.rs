//! Reproduction strategies.
//!
//! A [`GenerationStrategy`] turns one generation's scored genomes into the
//! next generation's genomes. The engine, population and environment do not
//! depend on which strategy is used.

use dronevo_controller::genome::Genome;
use rand::{Rng as _, RngCore};

use crate::{
    EvolutionError,
    config::EvolutionConfig,
    operators,
    population::ScoredGenome,
    selection::RouletteWheel,
};

pub trait GenerationStrategy: std::fmt::Debug + Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Produces exactly `size` genomes from `scored`.
    ///
    /// Fails with [`EvolutionError::InsufficientFitnessData`] when `scored`
    /// is empty.
    fn next_generation(
        &mut self,
        scored: &[ScoredGenome],
        size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Genome>, EvolutionError>;
}

/// Roulette-wheel selection followed by single-point crossover.
///
/// Half as many parents as there are scored genomes are drawn with
/// replacement. Pairs of parents, again drawn with replacement from that
/// pool, each produce two children until the generation is full. The best
/// `elite_count` genomes are copied first, and children go through Gaussian
/// mutation when `mutation_rate` is positive.
#[derive(Debug, Clone)]
pub struct RouletteCrossover {
    pub crossover_probability: f32,
    pub elite_count: usize,
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
    pub selection_epsilon: f32,
}

impl Default for RouletteCrossover {
    fn default() -> Self {
        Self::from_config(&EvolutionConfig::default())
    }
}

impl RouletteCrossover {
    #[must_use]
    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self {
            crossover_probability: config.crossover_probability,
            elite_count: config.elite_count,
            mutation_rate: config.mutation_rate,
            mutation_sigma: config.mutation_sigma,
            selection_epsilon: config.selection_epsilon,
        }
    }
}

impl GenerationStrategy for RouletteCrossover {
    fn name(&self) -> &'static str {
        "roulette"
    }

    fn next_generation(
        &mut self,
        scored: &[ScoredGenome],
        size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Genome>, EvolutionError> {
        let scores = scored.iter().map(|s| s.fitness).collect::<Vec<_>>();
        let wheel = RouletteWheel::new(&scores, self.selection_epsilon)?;

        let mut next = elites(scored, self.elite_count.min(size));

        let parent_count = (scored.len() / 2).max(1);
        let parents = (0..parent_count)
            .map(|_| &scored[wheel.spin(rng)].genome)
            .collect::<Vec<_>>();

        while next.len() < size {
            let p1 = parents[rng.random_range(0..parents.len())];
            let p2 = parents[rng.random_range(0..parents.len())];
            let (c1, c2) = operators::single_point_crossover(p1, p2, self.crossover_probability, rng);
            for child in [c1, c2] {
                next.push(operators::mutate(child, self.mutation_sigma, self.mutation_rate, rng));
            }
        }
        next.truncate(size);
        Ok(next)
    }
}

/// The `count` fittest genomes, best first.
fn elites(scored: &[ScoredGenome], count: usize) -> Vec<Genome> {
    if count == 0 {
        return vec![];
    }
    let mut order = (0..scored.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| scored[b].fitness.total_cmp(&scored[a].fitness));
    order
        .into_iter()
        .take(count)
        .map(|i| scored[i].genome.clone())
        .collect()
}
