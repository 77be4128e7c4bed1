use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Length and pacing of one episode, in logical ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Logical ticks per simulated second (used only for reporting).
    pub tick_rate: u32,
    /// Maximum ticks before the episode ends with agents still active.
    pub tick_budget: u32,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            tick_budget: 5 * 60,
        }
    }
}

/// Counts logical ticks against the episode budget.
///
/// The clock is independent of wall-clock time: an episode always lasts the
/// same number of ticks for the same agents and target.
#[derive(Debug, Clone)]
pub struct EpisodeClock {
    tick_rate: u32,
    tick_budget: u32,
    tick: u32,
}

impl EpisodeClock {
    /// Creates a clock at tick zero.
    ///
    /// A zero tick rate or budget is clamped to one.
    #[must_use]
    pub fn new(config: &EpisodeConfig) -> Self {
        Self {
            tick_rate: config.tick_rate.max(1),
            tick_budget: config.tick_budget.max(1),
            tick: 0,
        }
    }

    /// Number of ticks elapsed so far.
    #[must_use]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    #[must_use]
    pub fn tick_budget(&self) -> u32 {
        self.tick_budget
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.tick >= self.tick_budget
    }

    /// Consumes one tick, returning the index of the tick that starts.
    ///
    /// Returns `None` once the budget is exhausted.
    pub fn advance(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }
        let current = self.tick;
        self.tick += 1;
        Some(current)
    }

    /// Simulated time covered by `ticks` at this clock's tick rate.
    #[must_use]
    pub fn duration_of(&self, ticks: u32) -> Duration {
        const NANOS_PER_SEC: u64 = 1_000_000_000;
        let ticks = u64::from(ticks);
        let rate = u64::from(self.tick_rate);
        let secs = ticks / rate;
        let nanos = (ticks % rate) * NANOS_PER_SEC / rate;
        Duration::new(secs, u32::try_from(nanos).unwrap_or(u32::MAX))
    }

    /// Simulated time elapsed so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.duration_of(self.tick)
    }
}
