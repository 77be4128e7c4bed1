use std::time::Duration;

use dronevo_engine::{Environment, EpisodeClock, PhysicsConfig, SimulationConfig};
use serde::{Deserialize, Serialize};

use crate::{
    population::{Population, ScoredGenome, TickReport},
    snapshot::FrameSnapshot,
};

/// Aggregate counters of a finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    /// Ticks actually simulated.
    pub ticks: u32,
    pub agents: usize,
    pub captures: u32,
    pub out_of_bounds: u32,
    /// Agents still flying when the episode ended.
    pub survivors: usize,
    pub first_capture_tick: Option<u32>,
    /// Simulated time of the first capture at the configured tick rate.
    pub first_capture_time: Option<Duration>,
    pub substitutions: usize,
}

#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    pub scored: Vec<ScoredGenome>,
    pub stats: EpisodeStats,
}

/// One population flying against one environment until it ends.
///
/// The episode ends when no agent is active or the tick budget is spent,
/// whichever comes first. The target may be moved between ticks through
/// [`Episode::environment_mut`].
#[derive(Debug, Clone)]
pub struct Episode {
    generation: u32,
    population: Population,
    environment: Environment,
    physics: PhysicsConfig,
    clock: EpisodeClock,
}

impl Episode {
    #[must_use]
    pub fn new(
        generation: u32,
        population: Population,
        environment: Environment,
        simulation: &SimulationConfig,
    ) -> Self {
        Self {
            generation,
            population,
            environment,
            physics: simulation.physics.clone(),
            clock: EpisodeClock::new(&simulation.episode),
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.population.is_extinct() || self.clock.is_exhausted()
    }

    /// Simulates one tick. Returns `None` once the episode has ended.
    pub fn step(&mut self) -> Option<TickReport> {
        if self.is_finished() {
            return None;
        }
        self.clock.advance()?;
        Some(
            self.population
                .step_all(&self.environment, &self.physics, self.clock.tick()),
        )
    }

    /// Steps until the episode ends.
    pub fn run_to_end(&mut self) {
        while self.step().is_some() {}
    }

    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    #[must_use]
    pub fn clock(&self) -> &EpisodeClock {
        &self.clock
    }

    #[must_use]
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            generation: self.generation,
            tick: self.clock.tick(),
            target: self.environment.target().position,
            captures: self.population.captures(),
            agents: self.population.agent_snapshots(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> EpisodeStats {
        let first_capture_tick = self.population.first_capture_tick();
        EpisodeStats {
            ticks: self.clock.tick(),
            agents: self.population.len(),
            captures: self.population.captures(),
            out_of_bounds: self.population.out_of_bounds(),
            survivors: self.population.active().len(),
            first_capture_tick,
            first_capture_time: first_capture_tick.map(|tick| self.clock.duration_of(tick)),
            substitutions: self.population.substitutions(),
        }
    }

    /// Ends the episode, pairing every genome with its fitness.
    #[must_use]
    pub fn finish(self) -> EpisodeOutcome {
        let stats = self.stats();
        EpisodeOutcome {
            scored: self.population.into_scored(),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use dronevo_controller::{genome::Genome, neural::ControllerConfig};
    use dronevo_engine::Vec2;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn idle_episode(simulation: &SimulationConfig, target: Vec2, agents: usize) -> Episode {
        let environment = Environment::new(simulation.environment.clone(), target);
        let genomes = vec![Genome::from_vec(vec![0.0; 4]); agents];
        let mut rng = Pcg32::seed_from_u64(0);
        let population =
            Population::spawn(genomes, &ControllerConfig::hover(), &environment, &mut rng);
        Episode::new(3, population, environment, simulation)
    }

    #[test]
    fn test_runs_until_tick_budget() {
        let mut simulation = SimulationConfig::hover();
        simulation.episode.tick_budget = 25;
        let mut episode = idle_episode(&simulation, Vec2::new(100.0, 100.0), 2);
        episode.run_to_end();
        assert!(episode.is_finished());
        assert_eq!(episode.step(), None);

        let outcome = episode.finish();
        assert_eq!(outcome.stats.ticks, 25);
        assert_eq!(outcome.stats.survivors, 2);
        assert_eq!(outcome.stats.captures, 0);
        assert_eq!(outcome.scored.len(), 2);
        // active agents are scored with the fitness they reached
        let expected = -25.0 * simulation.environment.rewards.time_cost;
        assert!(outcome.scored.iter().all(|s| (s.fitness - expected).abs() < 1e-4));
    }

    #[test]
    fn test_ends_early_when_everyone_finished() {
        let simulation = SimulationConfig::hover();
        let target = simulation.environment.spawn_point() + simulation.environment.payload_offset;
        let mut episode = idle_episode(&simulation, target, 3);
        episode.run_to_end();

        let stats = episode.stats();
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.captures, 3);
        assert_eq!(stats.first_capture_tick, Some(1));
        assert_eq!(
            stats.first_capture_time,
            Some(Duration::from_secs(1) / simulation.episode.tick_rate)
        );
    }

    #[test]
    fn test_empty_population_finishes_immediately() {
        let simulation = SimulationConfig::hover();
        let mut episode = idle_episode(&simulation, Vec2::new(10.0, 10.0), 0);
        assert!(episode.is_finished());
        assert_eq!(episode.step(), None);
        assert!(episode.finish().scored.is_empty());
    }

    #[test]
    fn test_target_can_move_between_ticks() {
        let simulation = SimulationConfig::hover();
        let mut episode = idle_episode(&simulation, Vec2::new(100.0, 100.0), 1);
        episode.step();
        assert_eq!(episode.population().active().len(), 1);

        let payload = simulation.environment.spawn_point() + simulation.environment.payload_offset;
        episode.environment_mut().set_target(payload);
        episode.step();
        assert!(episode.population().is_extinct());
        assert_eq!(episode.stats().captures, 1);
        assert_eq!(episode.stats().first_capture_tick, Some(2));
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let simulation = SimulationConfig::hover();
        let mut episode = idle_episode(&simulation, Vec2::new(100.0, 120.0), 2);
        episode.step();
        let snapshot = episode.snapshot();
        assert_eq!(snapshot.generation, 3);
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.target, Vec2::new(100.0, 120.0));
        assert_eq!(snapshot.agents.len(), 2);
        assert_eq!(snapshot.agents[1].index, 1);

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: FrameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
