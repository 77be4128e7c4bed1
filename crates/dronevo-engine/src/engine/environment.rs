//! Episode environment: target placement, observations and scoring.
//!
//! # Scoring order
//!
//! [`Environment::score`] evaluates one agent after its physics step:
//!
//! 1. **Out of bounds** - body origin beyond the world plus margin: the
//!    out-of-bounds penalty is the whole delta for the tick.
//! 2. **Capture** - payload point within the capture radius: the capture bonus
//!    is the whole delta for the tick.
//! 3. **Shaping** - otherwise the agent stays active and receives
//!    `+shaping_reward` if it got closer, `-shaping_reward` if it moved away,
//!    nothing if the distance is unchanged, and always `-time_cost`.
//!
//! Out of bounds takes precedence when both terminal conditions hold.

use arrayvec::ArrayVec;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    AgentState, AgentStatus,
    core::{ControlInput, DroneBody, PhysicsConfig, Vec2},
};

/// Maximum number of values in any observation vector.
pub const MAX_OBSERVATION_WIDTH: usize = 6;

/// Fixed-capacity observation vector fed to a controller.
pub type Observation = ArrayVec<f32, MAX_OBSERVATION_WIDTH>;

/// What an agent perceives each tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationKind {
    /// Payload-to-target displacement `(dx, dy)`.
    #[default]
    Relative,
    /// `(payload x, payload y, target x, target y, vx, vy)`.
    Absolute,
}

impl ObservationKind {
    /// Number of values produced by this observation kind.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Relative => 2,
            Self::Absolute => 6,
        }
    }
}

/// Fitness deltas granted by the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    /// Terminal delta for reaching the target.
    pub capture_bonus: f32,
    /// Terminal delta for leaving the world (negative).
    pub out_of_bounds_penalty: f32,
    /// Magnitude of the per-tick reward for closing in (and penalty for
    /// drifting away).
    pub shaping_reward: f32,
    /// Magnitude subtracted every tick an agent stays active.
    pub time_cost: f32,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            capture_bonus: 10.0,
            out_of_bounds_penalty: -1.0,
            shaping_reward: 0.1,
            time_cost: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub world_width: f32,
    pub world_height: f32,
    /// How far past the world edge the body may drift before it is lost.
    pub out_of_bounds_margin: f32,
    pub capture_radius: f32,
    /// Minimum distance between a freshly spawned target and the world edge.
    pub target_spawn_margin: f32,
    /// Offset from the body origin to the payload point used for distances.
    pub payload_offset: Vec2,
    pub observation: ObservationKind,
    pub rewards: Rewards,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self::hover()
    }
}

impl EnvironmentConfig {
    #[must_use]
    pub fn hover() -> Self {
        Self {
            world_width: 1200.0,
            world_height: 700.0,
            out_of_bounds_margin: 50.0,
            capture_radius: 5.0,
            target_spawn_margin: 30.0,
            payload_offset: Vec2::new(32.0, 43.0),
            observation: ObservationKind::Relative,
            rewards: Rewards::default(),
        }
    }

    #[must_use]
    pub fn gravity() -> Self {
        Self {
            out_of_bounds_margin: 20.0,
            capture_radius: 15.0,
            observation: ObservationKind::Absolute,
            rewards: Rewards {
                time_cost: 0.0,
                ..Rewards::default()
            },
            ..Self::hover()
        }
    }

    /// Centre of the world, where every agent spawns.
    #[must_use]
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.world_width / 2.0, self.world_height / 2.0)
    }
}

/// The point agents are trying to reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub position: Vec2,
}

/// Result of scoring one agent for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreOutcome {
    pub fitness_delta: f32,
    pub status: AgentStatus,
    /// Distance from the payload point to the target after the step.
    pub distance: f32,
}

/// Owns the target and the rules for a single episode.
#[derive(Debug, Clone)]
pub struct Environment {
    config: EnvironmentConfig,
    target: Target,
}

impl Environment {
    /// Creates an environment with the target at `position` (clamped into the world).
    #[must_use]
    pub fn new(config: EnvironmentConfig, position: Vec2) -> Self {
        let mut this = Self {
            config,
            target: Target {
                position: Vec2::ZERO,
            },
        };
        this.set_target(position);
        this
    }

    /// Creates an environment with a randomly placed target.
    pub fn with_random_target<R>(config: EnvironmentConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let position = random_target_position(&config, rng);
        Self::new(config, position)
    }

    #[must_use]
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Moves the target, clamping it into the world.
    ///
    /// Safe to call between ticks; the next tick observes and scores against
    /// the new position.
    pub fn set_target(&mut self, position: Vec2) {
        let max = Vec2::new(self.config.world_width, self.config.world_height);
        self.target.position = position.clamp(Vec2::ZERO, max);
    }

    /// Places the target at a fresh random position.
    pub fn respawn_target<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let position = random_target_position(&self.config, rng);
        self.set_target(position);
    }

    #[must_use]
    pub fn payload_point(&self, body: &DroneBody) -> Vec2 {
        body.position + self.config.payload_offset
    }

    /// Euclidean distance between the payload point and the target.
    #[must_use]
    pub fn distance(&self, body: &DroneBody) -> f32 {
        self.payload_point(body).distance(self.target.position)
    }

    #[must_use]
    pub fn is_out_of_bounds(&self, body: &DroneBody) -> bool {
        let margin = self.config.out_of_bounds_margin;
        let Vec2 { x, y } = body.position;
        x > self.config.world_width + margin
            || x < -margin
            || y > self.config.world_height + margin
            || y < -margin
    }

    /// Builds the observation vector for `body`.
    #[must_use]
    pub fn observe(&self, body: &DroneBody) -> Observation {
        let payload = self.payload_point(body);
        let target = self.target.position;
        let mut observation = Observation::new();
        match self.config.observation {
            ObservationKind::Relative => {
                observation.push(payload.x - target.x);
                observation.push(payload.y - target.y);
            }
            ObservationKind::Absolute => {
                observation.push(payload.x);
                observation.push(payload.y);
                observation.push(target.x);
                observation.push(target.y);
                observation.push(body.velocity.x);
                observation.push(body.velocity.y);
            }
        }
        observation
    }

    /// Scores a body that has just been stepped.
    ///
    /// See the [module documentation](self) for the order of the deltas.
    #[must_use]
    pub fn score(&self, body: &DroneBody, previous_distance: f32) -> ScoreOutcome {
        let rewards = &self.config.rewards;
        let distance = self.distance(body);

        if self.is_out_of_bounds(body) {
            return ScoreOutcome {
                fitness_delta: rewards.out_of_bounds_penalty,
                status: AgentStatus::OutOfBounds,
                distance,
            };
        }
        if distance < self.config.capture_radius {
            return ScoreOutcome {
                fitness_delta: rewards.capture_bonus,
                status: AgentStatus::Collided,
                distance,
            };
        }

        let mut fitness_delta = 0.0;
        if distance < previous_distance {
            fitness_delta += rewards.shaping_reward;
        } else if distance > previous_distance {
            fitness_delta -= rewards.shaping_reward;
        }
        fitness_delta -= rewards.time_cost;

        ScoreOutcome {
            fitness_delta,
            status: AgentStatus::Active,
            distance,
        }
    }

    /// Steps and scores one active agent, returning its next state.
    ///
    /// Agents that are no longer active are returned unchanged.
    #[must_use]
    pub fn advance(
        &self,
        state: &AgentState,
        input: ControlInput,
        physics: &PhysicsConfig,
    ) -> AgentState {
        if !state.status.is_active() {
            return *state;
        }
        let body = state.body.step(input, physics);
        let outcome = self.score(&body, state.previous_distance);
        AgentState {
            body,
            status: outcome.status,
            previous_distance: outcome.distance,
            fitness: state.fitness + outcome.fitness_delta,
            ticks_alive: state.ticks_alive + 1,
        }
    }
}

fn random_target_position<R>(config: &EnvironmentConfig, rng: &mut R) -> Vec2
where
    R: Rng + ?Sized,
{
    let axis = |rng: &mut R, extent: f32| {
        let low = config.target_spawn_margin.min(extent / 2.0);
        let high = (extent - config.target_spawn_margin).max(low);
        rng.random_range(low..=high)
    };
    let x = axis(&mut *rng, config.world_width);
    let y = axis(&mut *rng, config.world_height);
    Vec2::new(x, y)
}
