//! Deterministic 2D simulation of thrust-controlled drones chasing a target.
//!
//! - [`core`] - Vectors, control commands and the physics step
//! - [`engine`] - Environment rules, agent state and episode pacing
//!
//! Nothing in this crate draws random numbers except target placement, which
//! takes the generator as an argument.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
