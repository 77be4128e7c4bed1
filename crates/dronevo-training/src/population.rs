//! One generation's agents and their per-tick lifecycle.
//!
//! # Removal Order
//!
//! [`Population::step_all`] advances every active agent over a snapshot of
//! the active indices taken at the start of the tick. Agents that finish
//! during the tick are moved to the finished list only after the whole pass,
//! so a finishing agent never shifts or skips another agent in the same tick.
//! Agent indices are never reused within an episode.

use dronevo_controller::{
    codec,
    genome::Genome,
    neural::{ControllerConfig, NeuralController},
};
use dronevo_engine::{AgentState, AgentStatus, Controller as _, DroneBody, Environment, PhysicsConfig};
use rand::Rng;
use rayon::prelude::*;
use tracing::warn;

use crate::snapshot::AgentSnapshot;

/// A genome together with the fitness it earned in one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredGenome {
    pub genome: Genome,
    pub fitness: f32,
}

#[derive(Debug, Clone)]
struct Member {
    genome: Genome,
    controller: NeuralController,
    state: AgentState,
}

/// What happened during one call to [`Population::step_all`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub stepped: usize,
    pub captured: usize,
    pub out_of_bounds: usize,
}

#[derive(Debug, Clone)]
pub struct Population {
    members: Vec<Member>,
    active: Vec<usize>,
    finished: Vec<usize>,
    captures: u32,
    out_of_bounds: u32,
    first_capture_tick: Option<u32>,
    substitutions: usize,
    parallel: bool,
}

impl Population {
    /// Decodes every genome and spawns its agent at the environment's spawn point.
    ///
    /// A genome whose length does not fit the controller's layer shape is
    /// replaced by a fresh random genome; the replacement is counted in
    /// [`Population::substitutions`].
    pub fn spawn<R>(
        genomes: Vec<Genome>,
        controller: &ControllerConfig,
        environment: &Environment,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let body = DroneBody::at_rest(environment.config().spawn_point());
        let initial_distance = environment.distance(&body);
        let shape = &controller.layer_shape;
        let policy = controller.threshold;

        let mut substitutions = 0;
        let members = genomes
            .into_iter()
            .enumerate()
            .map(|(index, genome)| {
                let (genome, controller) = match NeuralController::from_genome(&genome, shape, policy) {
                    Ok(controller) => (genome, controller),
                    Err(e) => {
                        warn!(agent = index, "substituting genome: {e}");
                        substitutions += 1;
                        let layers = codec::random_layers(shape, rng);
                        (codec::encode(&layers), NeuralController::new(layers, policy))
                    }
                };
                Member {
                    genome,
                    controller,
                    state: AgentState::spawn(body, initial_distance),
                }
            })
            .collect::<Vec<_>>();

        Self {
            active: (0..members.len()).collect(),
            members,
            finished: vec![],
            captures: 0,
            out_of_bounds: 0,
            first_capture_tick: None,
            substitutions,
            parallel: false,
        }
    }

    /// Computes agents of a tick on the rayon thread pool.
    ///
    /// Results are applied in agent order either way, so the outcome is
    /// identical to the sequential path.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Advances every active agent by one tick.
    ///
    /// `tick` is the number of ticks elapsed once this one completes; it is
    /// recorded as the first capture tick if a capture happens.
    pub fn step_all(&mut self, environment: &Environment, physics: &PhysicsConfig, tick: u32) -> TickReport {
        let members = &self.members;
        let advance = |&index: &usize| {
            let member = &members[index];
            let observation = environment.observe(&member.state.body);
            let input = member.controller.act(&observation);
            (index, environment.advance(&member.state, input, physics))
        };
        let updates: Vec<(usize, AgentState)> = if self.parallel {
            self.active.par_iter().map(advance).collect()
        } else {
            self.active.iter().map(advance).collect()
        };

        let mut report = TickReport {
            stepped: updates.len(),
            ..TickReport::default()
        };
        for (index, state) in updates {
            self.members[index].state = state;
            match state.status {
                AgentStatus::Active => {}
                AgentStatus::Collided => {
                    report.captured += 1;
                    self.captures += 1;
                    self.first_capture_tick.get_or_insert(tick);
                }
                AgentStatus::OutOfBounds => {
                    report.out_of_bounds += 1;
                    self.out_of_bounds += 1;
                }
            }
        }

        let members = &self.members;
        let (active, finished): (Vec<usize>, Vec<usize>) = self
            .active
            .iter()
            .copied()
            .partition(|&index| members[index].state.status.is_active());
        self.active = active;
        self.finished.extend(finished);
        report
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Indices of agents still flying, in spawn order.
    #[must_use]
    pub fn active(&self) -> &[usize] {
        &self.active
    }

    /// Indices of agents that have finished, in the order they finished.
    #[must_use]
    pub fn finished(&self) -> &[usize] {
        &self.finished
    }

    #[must_use]
    pub fn is_extinct(&self) -> bool {
        self.active.is_empty()
    }

    #[must_use]
    pub fn state(&self, index: usize) -> Option<&AgentState> {
        self.members.get(index).map(|member| &member.state)
    }

    #[must_use]
    pub fn captures(&self) -> u32 {
        self.captures
    }

    #[must_use]
    pub fn out_of_bounds(&self) -> u32 {
        self.out_of_bounds
    }

    #[must_use]
    pub fn first_capture_tick(&self) -> Option<u32> {
        self.first_capture_tick
    }

    /// Number of genomes replaced at spawn because of a shape mismatch.
    #[must_use]
    pub fn substitutions(&self) -> usize {
        self.substitutions
    }

    /// Read-only view of every agent, in agent order.
    #[must_use]
    pub fn agent_snapshots(&self) -> Vec<AgentSnapshot> {
        self.members
            .iter()
            .enumerate()
            .map(|(index, member)| AgentSnapshot {
                index,
                position: member.state.body.position,
                rotation: member.state.body.rotation,
                status: member.state.status,
                fitness: member.state.fitness,
            })
            .collect()
    }

    /// Every genome with its fitness, in agent order.
    ///
    /// Agents still active are included with the fitness they reached.
    #[must_use]
    pub fn into_scored(self) -> Vec<ScoredGenome> {
        self.members
            .into_iter()
            .map(|member| ScoredGenome {
                genome: member.genome,
                fitness: member.state.fitness,
            })
            .collect()
    }
}
