//! Episode-level rules built on top of the core physics.
//!
//! This module turns the stateless [`DroneBody`](crate::DroneBody) integration
//! into a scored episode:
//!
//! - [`Environment`] - Target placement, observations, termination and fitness deltas
//! - [`AgentState`] - Per-agent record mutated every tick
//! - [`EpisodeClock`] - Logical tick counter with a fixed budget
//! - [`Controller`] - Seam between observations and control commands
//! - [`SimulationConfig`] - Physics, environment and episode settings in one place
//!
//! # Tick Flow
//!
//! For every active agent, one tick is:
//!
//! 1. [`Environment::observe`] builds the observation vector
//! 2. [`Controller::act`] turns it into a [`ControlInput`](crate::ControlInput)
//! 3. [`Environment::advance`] steps the body and scores the result
//!
//! # Example
//!
//! ```
//! use dronevo_engine::{
//!     AgentState, ControlInput, Controller, DroneBody, Environment, SimulationConfig, Vec2,
//! };
//!
//! struct Hover;
//!
//! impl Controller for Hover {
//!     fn act(&self, _observation: &[f32]) -> ControlInput {
//!         ControlInput::IDLE
//!     }
//! }
//!
//! let config = SimulationConfig::hover();
//! let env = Environment::new(config.environment.clone(), Vec2::new(100.0, 100.0));
//! let body = DroneBody::at_rest(env.config().spawn_point());
//! let mut state = AgentState::spawn(body, env.distance(&body));
//!
//! let observation = env.observe(&state.body);
//! let input = Hover.act(&observation);
//! state = env.advance(&state, input, &config.physics);
//! assert!(state.status.is_active());
//! ```

pub use self::{agent::*, clock::*, config::*, controller::*, environment::*};

mod agent;
mod clock;
mod config;
mod controller;
mod environment;
