//! Speciated reproduction.
//!
//! An alternative to roulette selection that protects new structure from
//! being outcompeted before it matures:
//!
//! 1. **Speciate** - Each genome joins the first species whose representative
//!    lies within `compatibility_threshold` (Euclidean weight distance), or
//!    founds a new species. Species persist across generations; each one's
//!    new representative is the member closest to its old one.
//! 2. **Stagnation** - A species whose best fitness has not improved for
//!    `stagnation_limit` generations is dropped, except for the
//!    `species_elitism` best species.
//! 3. **Fitness sharing** - A species is worth the mean of its members'
//!    fitness, rescaled against the whole generation's range so negative
//!    fitness still yields a usable share.
//! 4. **Offspring** - The generation is divided among species in proportion
//!    to their share (largest remainder rounding, so the total is exact).
//! 5. **Breeding** - Each species keeps its champion unchanged; the rest of
//!    its offspring come from its top `survival_fraction`, by uniform
//!    crossover with probability `crossover_probability` and Gaussian
//!    mutation.

use dronevo_controller::genome::Genome;
use rand::{Rng as _, RngCore};
use tracing::debug;

use crate::{
    EvolutionError, config::SpeciationConfig, operators, population::ScoredGenome,
    strategy::GenerationStrategy,
};

#[derive(Debug, Clone)]
pub struct Species {
    pub id: u32,
    pub representative: Genome,
    /// Best fitness any member ever reached.
    pub best_fitness: f32,
    /// Generations since `best_fitness` last improved.
    pub stagnant_for: u32,
    members: Vec<usize>,
}

impl Species {
    fn new(id: u32, representative: Genome) -> Self {
        Self {
            id,
            representative,
            best_fitness: f32::NEG_INFINITY,
            stagnant_for: 0,
            members: vec![],
        }
    }

    /// Indices into the last scored generation.
    #[must_use]
    pub fn members(&self) -> &[usize] {
        &self.members
    }
}

#[derive(Debug, Clone)]
pub struct SpeciatedReproduction {
    config: SpeciationConfig,
    species: Vec<Species>,
    next_id: u32,
}

impl SpeciatedReproduction {
    #[must_use]
    pub fn new(config: SpeciationConfig) -> Self {
        Self {
            config,
            species: vec![],
            next_id: 0,
        }
    }

    /// Species that took part in the last generation.
    #[must_use]
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    fn speciate(&mut self, scored: &[ScoredGenome]) {
        for species in &mut self.species {
            species.members.clear();
        }
        let threshold = self.config.compatibility_threshold;
        for (index, entry) in scored.iter().enumerate() {
            let found = self
                .species
                .iter()
                .position(|s| s.representative.distance(&entry.genome) < threshold);
            match found {
                Some(position) => self.species[position].members.push(index),
                None => {
                    let mut species = Species::new(self.next_id, entry.genome.clone());
                    species.members.push(index);
                    self.species.push(species);
                    self.next_id += 1;
                }
            }
        }
        self.species.retain(|s| !s.members.is_empty());

        for species in &mut self.species {
            let old = &species.representative;
            let closest = species
                .members
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    let da = old.distance(&scored[a].genome);
                    let db = old.distance(&scored[b].genome);
                    da.total_cmp(&db)
                });
            if let Some(closest) = closest {
                species.representative = scored[closest].genome.clone();
            }
        }
    }

    fn update_stagnation(&mut self, scored: &[ScoredGenome]) {
        for species in &mut self.species {
            let best = species
                .members
                .iter()
                .map(|&i| scored[i].fitness)
                .fold(f32::NEG_INFINITY, f32::max);
            if best > species.best_fitness {
                species.best_fitness = best;
                species.stagnant_for = 0;
            } else {
                species.stagnant_for += 1;
            }
        }

        // protect the best species, then drop the stagnant rest
        self.species
            .sort_by(|a, b| b.best_fitness.total_cmp(&a.best_fitness));
        let limit = self.config.stagnation_limit;
        let protected = self.config.species_elitism.max(1);
        let mut rank = 0;
        self.species.retain(|s| {
            rank += 1;
            rank <= protected || s.stagnant_for < limit
        });
    }

    /// Mean member fitness of every species, rescaled into `[0, 1]`.
    fn shared_fitness(&self, scored: &[ScoredGenome]) -> Vec<f32> {
        let (min, max) = scored
            .iter()
            .map(|s| s.fitness)
            .filter(|f| f.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), f| {
                (lo.min(f), hi.max(f))
            });
        let range = (max - min).max(1.0);
        self.species
            .iter()
            .map(|species| {
                #[expect(clippy::cast_precision_loss)]
                let len = species.members.len() as f32;
                let mean = species
                    .members
                    .iter()
                    .map(|&i| scored[i].fitness)
                    .filter(|f| f.is_finite())
                    .sum::<f32>()
                    / len;
                if mean.is_finite() {
                    ((mean - min) / range).max(0.0)
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn breed(
        &self,
        species: &Species,
        scored: &[ScoredGenome],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Genome> {
        let mut ranked = species.members.clone();
        ranked.sort_by(|&a, &b| scored[b].fitness.total_cmp(&scored[a].fitness));

        let mut children = Vec::with_capacity(count);
        if count == 0 {
            return children;
        }
        children.push(scored[ranked[0]].genome.clone());

        #[expect(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let breeders = ((ranked.len() as f32 * self.config.survival_fraction).ceil() as usize)
            .clamp(1, ranked.len());
        let pool = &ranked[..breeders];

        while children.len() < count {
            let p1 = &scored[pool[rng.random_range(0..pool.len())]].genome;
            let p2 = &scored[pool[rng.random_range(0..pool.len())]].genome;
            let crossover = rng.random_bool(f64::from(self.config.crossover_probability.clamp(0.0, 1.0)));
            let child = if crossover {
                operators::uniform_crossover(p1, p2, rng)
            } else {
                p1.clone()
            };
            children.push(operators::mutate(
                child,
                self.config.mutation_sigma,
                self.config.mutation_rate,
                rng,
            ));
        }
        children
    }
}

/// Splits `total` proportionally to `shares`, rounding by largest remainder.
///
/// All-zero shares split evenly.
fn allot(shares: &[f32], total: usize) -> Vec<usize> {
    if shares.is_empty() {
        return vec![];
    }
    let sum: f32 = shares.iter().sum();
    #[expect(clippy::cast_precision_loss)]
    let exact = if sum > 0.0 {
        shares.iter().map(|s| s / sum * total as f32).collect::<Vec<_>>()
    } else {
        vec![total as f32 / shares.len() as f32; shares.len()]
    };

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut counts = exact.iter().map(|e| e.floor() as usize).collect::<Vec<_>>();
    let assigned: usize = counts.iter().sum();
    let mut order = (0..shares.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| (exact[b] - exact[b].floor()).total_cmp(&(exact[a] - exact[a].floor())));
    for &i in order.iter().cycle().take(total.saturating_sub(assigned)) {
        counts[i] += 1;
    }
    counts
}

impl GenerationStrategy for SpeciatedReproduction {
    fn name(&self) -> &'static str {
        "speciated"
    }

    fn next_generation(
        &mut self,
        scored: &[ScoredGenome],
        size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Genome>, EvolutionError> {
        if scored.is_empty() {
            return Err(EvolutionError::InsufficientFitnessData);
        }

        self.speciate(scored);
        self.update_stagnation(scored);
        let shares = self.shared_fitness(scored);
        let counts = allot(&shares, size);

        let mut next = Vec::with_capacity(size);
        for (species, &count) in self.species.iter().zip(&counts) {
            debug!(
                species = species.id,
                members = species.members.len(),
                offspring = count,
                stagnant_for = species.stagnant_for,
                "species"
            );
            next.extend(self.breed(species, scored, count, rng));
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn entry(weights: &[f32], fitness: f32) -> ScoredGenome {
        ScoredGenome {
            genome: Genome::from_vec(weights.to_vec()),
            fitness,
        }
    }

    /// Two tight clusters far apart.
    fn two_clusters() -> Vec<ScoredGenome> {
        vec![
            entry(&[0.0, 0.0], 1.0),
            entry(&[0.1, 0.0], 2.0),
            entry(&[10.0, 10.0], 8.0),
            entry(&[10.0, 10.1], 9.0),
            entry(&[0.0, 0.1], 3.0),
        ]
    }

    #[test]
    fn test_groups_by_distance() {
        let mut strategy = SpeciatedReproduction::new(SpeciationConfig::default());
        strategy.speciate(&two_clusters());
        let mut groups = strategy
            .species()
            .iter()
            .map(|s| s.members().to_vec())
            .collect::<Vec<_>>();
        groups.sort();
        assert_eq!(groups, [vec![0, 1, 4], vec![2, 3]]);
    }

    #[test]
    fn test_species_persist_across_generations() {
        let mut strategy = SpeciatedReproduction::new(SpeciationConfig::default());
        let mut rng = Pcg32::seed_from_u64(0);
        strategy.next_generation(&two_clusters(), 10, &mut rng).unwrap();
        let mut ids = strategy.species().iter().map(|s| s.id).collect::<Vec<_>>();
        ids.sort_unstable();

        strategy.next_generation(&two_clusters(), 10, &mut rng).unwrap();
        let mut again = strategy.species().iter().map(|s| s.id).collect::<Vec<_>>();
        again.sort_unstable();
        assert_eq!(ids, again);
    }

    #[test]
    fn test_produces_exact_size_and_keeps_champions() {
        let mut strategy = SpeciatedReproduction::new(SpeciationConfig::default());
        let mut rng = Pcg32::seed_from_u64(1);
        let scored = two_clusters();
        for size in [2, 5, 9, 20] {
            let next = strategy.next_generation(&scored, size, &mut rng).unwrap();
            assert_eq!(next.len(), size);
        }
        let next = strategy.next_generation(&scored, 10, &mut rng).unwrap();
        assert!(next.contains(&scored[3].genome));
        assert!(next.contains(&scored[4].genome));
    }

    #[test]
    fn test_fitter_species_get_more_offspring() {
        let mut strategy = SpeciatedReproduction::new(SpeciationConfig::default());
        let scored = two_clusters();
        strategy.speciate(&scored);
        strategy.update_stagnation(&scored);
        let shares = strategy.shared_fitness(&scored);
        let counts = allot(&shares, 20);
        // the better cluster sorts first after the stagnation pass
        assert!(counts[0] > counts[1]);
        assert_eq!(counts.iter().sum::<usize>(), 20);
    }

    #[test]
    fn test_stagnant_species_are_dropped_but_best_survives() {
        let config = SpeciationConfig {
            stagnation_limit: 2,
            species_elitism: 1,
            ..SpeciationConfig::default()
        };
        let mut strategy = SpeciatedReproduction::new(config);
        let scored = two_clusters();
        for _ in 0..3 {
            strategy.speciate(&scored);
            strategy.update_stagnation(&scored);
        }
        assert_eq!(strategy.species().len(), 1);
        assert_eq!(strategy.species()[0].best_fitness, 9.0);
    }

    #[test]
    fn test_allot_is_exact() {
        assert_eq!(allot(&[1.0, 1.0, 1.0], 10).iter().sum::<usize>(), 10);
        assert_eq!(allot(&[0.0, 0.0], 5).iter().sum::<usize>(), 5);
        assert_eq!(allot(&[3.0, 1.0], 4), [3, 1]);
        assert_eq!(allot(&[1.0], 0), [0]);
        assert!(allot(&[], 3).is_empty());
    }

    #[test]
    fn test_empty_input_is_insufficient() {
        let mut strategy = SpeciatedReproduction::new(SpeciationConfig::default());
        let mut rng = Pcg32::seed_from_u64(2);
        assert_eq!(
            strategy.next_generation(&[], 4, &mut rng),
            Err(EvolutionError::InsufficientFitnessData)
        );
    }
}
