use dronevo_engine::{AgentStatus, Vec2};
use serde::{Deserialize, Serialize};

/// Read-only view of one agent for renderers and traces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub index: usize,
    pub position: Vec2,
    pub rotation: f32,
    pub status: AgentStatus,
    pub fitness: f32,
}

/// Everything a renderer needs to draw one tick.
///
/// Snapshots are copies; holding one never borrows the episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub generation: u32,
    pub tick: u32,
    pub target: Vec2,
    pub captures: u32,
    pub agents: Vec<AgentSnapshot>,
}
