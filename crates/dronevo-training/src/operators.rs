//! Genetic operators on genomes.
//!
//! Operators never edit a parent: they read the parents' weights and return
//! newly built genomes.
//!
//! - [`single_point_crossover`] - Swap the tails of two parents after a random cut
//! - [`uniform_crossover`] - Pick each weight from either parent
//! - [`mutate`] - Add Gaussian noise to a fraction of the weights

use dronevo_controller::genome::Genome;
use rand::Rng;
use rand_distr::Normal;

/// Crosses two parents at a single random cut point.
///
/// With probability `probability` the cut point `k` is drawn uniformly from
/// `[1, L - 1]` and the children are `p1[..k] + p2[k..]` and
/// `p2[..k] + p1[k..]`. Otherwise the children are copies of the parents.
/// Parents shorter than two weights, or of different lengths, are always
/// copied.
pub fn single_point_crossover<R>(
    p1: &Genome,
    p2: &Genome,
    probability: f32,
    rng: &mut R,
) -> (Genome, Genome)
where
    R: Rng + ?Sized,
{
    let (a, b) = (p1.as_slice(), p2.as_slice());
    let crossed = rng.random_bool(f64::from(probability.clamp(0.0, 1.0)));
    if !crossed || a.len() != b.len() || a.len() < 2 {
        return (p1.clone(), p2.clone());
    }

    let point = rng.random_range(1..a.len());
    let c1 = a[..point].iter().chain(&b[point..]).copied().collect::<Vec<_>>();
    let c2 = b[..point].iter().chain(&a[point..]).copied().collect::<Vec<_>>();
    (Genome::from_vec(c1), Genome::from_vec(c2))
}

/// Builds one child taking each weight from either parent with equal odds.
///
/// If the parents differ in length the child has the length of `p1`, taking
/// the weights `p2` lacks from `p1`.
pub fn uniform_crossover<R>(p1: &Genome, p2: &Genome, rng: &mut R) -> Genome
where
    R: Rng + ?Sized,
{
    let (a, b) = (p1.as_slice(), p2.as_slice());
    let child = a
        .iter()
        .enumerate()
        .map(|(i, &x)| match b.get(i) {
            Some(&y) if rng.random_bool(0.5) => y,
            _ => x,
        })
        .collect();
    Genome::from_vec(child)
}

/// Applies Gaussian mutation, returning the mutated genome.
///
/// Each weight is perturbed by a sample of `N(0, sigma)` with probability
/// `rate`. A zero rate or a non-positive `sigma` returns the genome unchanged
/// without consuming randomness.
pub fn mutate<R>(genome: Genome, sigma: f32, rate: f32, rng: &mut R) -> Genome
where
    R: Rng + ?Sized,
{
    if rate <= 0.0 || sigma <= 0.0 {
        return genome;
    }
    let Ok(normal) = Normal::new(0.0, sigma) else {
        return genome;
    };
    let rate = f64::from(rate.min(1.0));
    let mut weights = genome.into_vec();
    for w in &mut weights {
        if rng.random_bool(rate) {
            *w += rng.sample(normal);
        }
    }
    Genome::from_vec(weights)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn genome(values: &[f32]) -> Genome {
        Genome::from_vec(values.to_vec())
    }

    #[test]
    fn test_crossover_with_zero_probability_copies_parents() {
        let mut rng = Pcg32::seed_from_u64(0);
        let p1 = genome(&[1.0, 2.0, 3.0, 4.0]);
        let p2 = genome(&[5.0, 6.0, 7.0, 8.0]);
        for _ in 0..100 {
            let (c1, c2) = single_point_crossover(&p1, &p2, 0.0, &mut rng);
            assert_eq!(c1, p1);
            assert_eq!(c2, p2);
        }
    }

    #[test]
    fn test_crossover_with_full_probability_swaps_tails() {
        let mut rng = Pcg32::seed_from_u64(1);
        let p1 = genome(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let p2 = genome(&[-1.0, -2.0, -3.0, -4.0, -5.0]);
        for _ in 0..200 {
            let (c1, c2) = single_point_crossover(&p1, &p2, 1.0, &mut rng);
            assert_ne!(c1, p1);
            assert_ne!(c2, p2);

            // c1 starts with p1 and ends with p2; the cut is never at either end
            let point = c1.as_slice().iter().position(|&w| w < 0.0).unwrap();
            assert!((1..5).contains(&point));
            assert_eq!(&c1.as_slice()[..point], &p1.as_slice()[..point]);
            assert_eq!(&c1.as_slice()[point..], &p2.as_slice()[point..]);
            assert_eq!(&c2.as_slice()[..point], &p2.as_slice()[..point]);
            assert_eq!(&c2.as_slice()[point..], &p1.as_slice()[point..]);
        }
    }

    #[test]
    fn test_crossover_of_identical_parents_is_identity() {
        let mut rng = Pcg32::seed_from_u64(2);
        let p = genome(&[0.5, 0.25, -1.0]);
        let (c1, c2) = single_point_crossover(&p, &p, 1.0, &mut rng);
        assert_eq!(c1, p);
        assert_eq!(c2, p);
    }

    #[test]
    fn test_crossover_of_tiny_or_mismatched_parents_copies() {
        let mut rng = Pcg32::seed_from_u64(3);
        let (c1, c2) = single_point_crossover(&genome(&[1.0]), &genome(&[2.0]), 1.0, &mut rng);
        assert_eq!((c1, c2), (genome(&[1.0]), genome(&[2.0])));

        let (c1, _) = single_point_crossover(&genome(&[1.0, 2.0]), &genome(&[3.0]), 1.0, &mut rng);
        assert_eq!(c1, genome(&[1.0, 2.0]));
    }

    #[test]
    fn test_uniform_crossover_takes_each_weight_from_a_parent() {
        let mut rng = Pcg32::seed_from_u64(4);
        let p1 = genome(&[0.0; 32]);
        let p2 = genome(&[1.0; 32]);
        let child = uniform_crossover(&p1, &p2, &mut rng);
        assert_eq!(child.len(), 32);
        assert!(child.as_slice().iter().all(|&w| w == 0.0 || w == 1.0));
        assert!(child.as_slice().contains(&0.0));
        assert!(child.as_slice().contains(&1.0));
    }

    #[test]
    fn test_mutate_with_zero_rate_is_identity() {
        let mut rng = Pcg32::seed_from_u64(5);
        let g = genome(&[1.0, 2.0, 3.0]);
        assert_eq!(mutate(g.clone(), 1.0, 0.0, &mut rng), g);
        assert_eq!(mutate(g.clone(), 0.0, 1.0, &mut rng), g);
    }

    #[test]
    fn test_mutate_with_full_rate_changes_every_weight() {
        let mut rng = Pcg32::seed_from_u64(6);
        let g = genome(&[0.0; 16]);
        let mutated = mutate(g, 0.5, 1.0, &mut rng);
        assert_eq!(mutated.len(), 16);
        assert!(mutated.as_slice().iter().all(|&w| w != 0.0));
    }
}
