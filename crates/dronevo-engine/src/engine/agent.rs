use serde::{Deserialize, Serialize};

use crate::core::DroneBody;

/// Lifecycle status of one agent inside an episode.
///
/// Agents start `Active`; any other status is terminal for the episode.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
pub enum AgentStatus {
    #[default]
    Active,
    /// Reached the target within the capture radius.
    Collided,
    /// Left the world by more than the out-of-bounds margin.
    OutOfBounds,
}

/// Per-tick mutable record of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub body: DroneBody,
    pub status: AgentStatus,
    /// Distance from the payload point to the target at the end of the last tick.
    pub previous_distance: f32,
    /// Fitness accumulated over the episode so far.
    pub fitness: f32,
    /// Number of ticks this agent has been stepped.
    pub ticks_alive: u32,
}

impl AgentState {
    /// Creates an active agent with zero fitness.
    #[must_use]
    pub fn spawn(body: DroneBody, initial_distance: f32) -> Self {
        Self {
            body,
            status: AgentStatus::Active,
            previous_distance: initial_distance,
            fitness: 0.0,
            ticks_alive: 0,
        }
    }
}
