use serde::{Deserialize, Serialize};

/// Vertical thrust command for a single tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum Vertical {
    #[default]
    Idle,
    Up,
    Down,
}

impl Vertical {
    /// Signed acceleration along `y` for the given thrust magnitude.
    ///
    /// `Up` is negative because `y` grows downwards.
    #[must_use]
    pub fn acceleration(self, thrust: f32) -> f32 {
        match self {
            Self::Idle => 0.0,
            Self::Up => -thrust,
            Self::Down => thrust,
        }
    }
}

/// Horizontal thrust command for a single tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum Horizontal {
    #[default]
    Idle,
    Left,
    Right,
}

impl Horizontal {
    /// Signed acceleration along `x` for the given thrust magnitude.
    #[must_use]
    pub fn acceleration(self, thrust: f32) -> f32 {
        match self {
            Self::Idle => 0.0,
            Self::Left => -thrust,
            Self::Right => thrust,
        }
    }

    /// Signed tilt applied to the body when this command fires.
    ///
    /// Banking right tilts the sprite clockwise (negative angle).
    #[must_use]
    pub fn tilt(self, step: f32) -> f32 {
        match self {
            Self::Idle => 0.0,
            Self::Left => step,
            Self::Right => -step,
        }
    }
}

/// Control vector consumed by the physics step.
///
/// Produced either by a neural controller (thresholded outputs) or directly
/// by manual input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInput {
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

impl ControlInput {
    pub const IDLE: Self = Self::new(Vertical::Idle, Horizontal::Idle);

    #[must_use]
    pub const fn new(vertical: Vertical, horizontal: Horizontal) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }
}
