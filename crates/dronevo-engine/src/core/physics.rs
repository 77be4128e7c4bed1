//! Kinematic integration for a single drone body.
//!
//! [`DroneBody::step`] is a pure function of the current body and a
//! [`ControlInput`]: it never reads global state and consumes no randomness,
//! so replaying the same inputs always yields the same trajectory.
//!
//! # Integration order
//!
//! 1. Vertical velocity accumulates thrust and gravity, is clamped to
//!    `[vertical_velocity_up_bound, vertical_velocity_down_bound]`, then
//!    (optionally) drag pulls it towards zero.
//! 2. Vertical position advances by the vertical velocity.
//! 3. Horizontal velocity accumulates thrust, drag pulls it towards zero, then
//!    it is clamped to `[-max_horizontal_velocity, max_horizontal_velocity]`.
//! 4. Horizontal position advances by the horizontal velocity.
//! 5. Rotation tilts by `rotation_step` when a horizontal command fired, is
//!    clamped to `[-rotation_limit, rotation_limit]` and decays towards zero.
//!    Rotation is cosmetic and never feeds back into the motion.

use serde::{Deserialize, Serialize};

use super::{control::ControlInput, vec2::Vec2};

/// How a fixed drag decrement treats velocities smaller than the drag itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragMode {
    /// Subtract the full drag regardless of magnitude, which can flip the sign
    /// of a small velocity.
    #[default]
    Overshoot,
    /// Stop at zero instead of flipping sign.
    ClampAtZero,
}

impl DragMode {
    fn apply(self, velocity: f32, drag: f32) -> f32 {
        match self {
            Self::Overshoot => {
                if velocity > 0.0 {
                    velocity - drag
                } else if velocity < 0.0 {
                    velocity + drag
                } else {
                    velocity
                }
            }
            Self::ClampAtZero => {
                if velocity > 0.0 {
                    (velocity - drag).max(0.0)
                } else if velocity < 0.0 {
                    (velocity + drag).min(0.0)
                } else {
                    velocity
                }
            }
        }
    }
}

/// Physical constants shared by every drone in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration added every tick.
    pub gravity: f32,
    /// Acceleration magnitude of a single thrust command.
    pub thrust: f32,
    /// Fixed velocity decrement towards zero applied every tick.
    pub drag: f32,
    pub drag_mode: DragMode,
    /// Whether drag also applies to the vertical axis.
    pub vertical_drag: bool,
    /// Most negative (upward) vertical velocity.
    pub vertical_velocity_up_bound: f32,
    /// Most positive (downward) vertical velocity.
    pub vertical_velocity_down_bound: f32,
    pub max_horizontal_velocity: f32,
    /// Tilt in degrees added per horizontal command.
    pub rotation_step: f32,
    /// Maximum absolute tilt in degrees.
    pub rotation_limit: f32,
    /// Tilt in degrees recovered towards level every tick.
    pub rotation_decay: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::hover()
    }
}

impl PhysicsConfig {
    /// Gravity-free tuning with drag on both axes.
    #[must_use]
    pub fn hover() -> Self {
        Self {
            gravity: 0.0,
            thrust: 1.0,
            drag: 0.5,
            drag_mode: DragMode::Overshoot,
            vertical_drag: true,
            vertical_velocity_up_bound: -5.0,
            vertical_velocity_down_bound: 5.0,
            max_horizontal_velocity: 10.0,
            rotation_step: 5.0,
            rotation_limit: 30.0,
            rotation_decay: 2.0,
        }
    }

    /// Tuning with constant gravity and no vertical drag.
    #[must_use]
    pub fn gravity() -> Self {
        Self {
            gravity: 0.5,
            vertical_drag: false,
            vertical_velocity_up_bound: -15.0,
            vertical_velocity_down_bound: 15.0,
            ..Self::hover()
        }
    }
}

/// Kinematic state of one drone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DroneBody {
    /// Top-left corner of the body in world coordinates.
    pub position: Vec2,
    pub velocity: Vec2,
    /// Cosmetic tilt in degrees.
    pub rotation: f32,
    /// Control input applied during the most recent step.
    pub last_input: ControlInput,
}

impl DroneBody {
    /// Creates a body at rest.
    #[must_use]
    pub fn at_rest(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Advances the body by one tick.
    #[must_use]
    pub fn step(&self, input: ControlInput, physics: &PhysicsConfig) -> Self {
        let mut velocity = self.velocity;
        let mut position = self.position;

        velocity.y += input.vertical.acceleration(physics.thrust) + physics.gravity;
        velocity.y = velocity.y.clamp(
            physics.vertical_velocity_up_bound,
            physics.vertical_velocity_down_bound,
        );
        if physics.vertical_drag {
            velocity.y = physics.drag_mode.apply(velocity.y, physics.drag);
        }
        position.y += velocity.y;

        velocity.x += input.horizontal.acceleration(physics.thrust);
        velocity.x = physics.drag_mode.apply(velocity.x, physics.drag);
        velocity.x = velocity.x.clamp(
            -physics.max_horizontal_velocity,
            physics.max_horizontal_velocity,
        );
        position.x += velocity.x;

        let rotation = (self.rotation + input.horizontal.tilt(physics.rotation_step))
            .clamp(-physics.rotation_limit, physics.rotation_limit);
        let rotation = if rotation > 0.0 {
            (rotation - physics.rotation_decay).max(0.0)
        } else {
            (rotation + physics.rotation_decay).min(0.0)
        };

        Self {
            position,
            velocity,
            rotation,
            last_input: input,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use super::*;
    use crate::core::control::{Horizontal, Vertical};

    fn random_input<R: rand::Rng>(rng: &mut R) -> ControlInput {
        let vertical = match rng.random_range(0..3) {
            0 => Vertical::Idle,
            1 => Vertical::Up,
            _ => Vertical::Down,
        };
        let horizontal = match rng.random_range(0..3) {
            0 => Horizontal::Idle,
            1 => Horizontal::Left,
            _ => Horizontal::Right,
        };
        ControlInput::new(vertical, horizontal)
    }

    #[test]
    fn test_step_is_deterministic() {
        let physics = PhysicsConfig::gravity();
        let body = DroneBody {
            position: Vec2::new(100.0, 200.0),
            velocity: Vec2::new(1.5, -2.0),
            rotation: 12.0,
            last_input: ControlInput::IDLE,
        };
        let input = ControlInput::new(Vertical::Up, Horizontal::Right);
        assert_eq!(body.step(input, &physics), body.step(input, &physics));
    }

    #[test]
    fn test_gravity_accumulates_without_input() {
        let physics = PhysicsConfig::gravity();
        let body = DroneBody::at_rest(Vec2::new(0.0, 0.0));
        let body = body.step(ControlInput::IDLE, &physics);
        assert_eq!(body.velocity.y, 0.5);
        assert_eq!(body.position.y, 0.5);
        let body = body.step(ControlInput::IDLE, &physics);
        assert_eq!(body.velocity.y, 1.0);
        assert_eq!(body.position.y, 1.5);
    }

    #[test]
    fn test_vertical_drag_applies_after_clamp() {
        let physics = PhysicsConfig::hover();
        let body = DroneBody {
            velocity: Vec2::new(0.0, -5.0),
            ..DroneBody::default()
        };
        // -5 - 1 clamps to -5, then drag brings it to -4.5
        let body = body.step(ControlInput::new(Vertical::Up, Horizontal::Idle), &physics);
        assert_eq!(body.velocity.y, -4.5);
    }

    #[test]
    fn test_horizontal_drag_overshoots_small_velocity() {
        let physics = PhysicsConfig {
            drag_mode: DragMode::Overshoot,
            ..PhysicsConfig::hover()
        };
        let body = DroneBody {
            velocity: Vec2::new(0.2, 0.0),
            ..DroneBody::default()
        };
        let body = body.step(ControlInput::IDLE, &physics);
        assert!((body.velocity.x - (-0.3)).abs() < 1e-6);
    }

    #[test]
    fn test_horizontal_drag_clamped_at_zero() {
        let physics = PhysicsConfig {
            drag_mode: DragMode::ClampAtZero,
            ..PhysicsConfig::hover()
        };
        let body = DroneBody {
            velocity: Vec2::new(0.2, -0.2),
            ..DroneBody::default()
        };
        let body = body.step(ControlInput::IDLE, &physics);
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_rotation_tilts_and_decays() {
        let physics = PhysicsConfig::hover();
        let body = DroneBody::default();
        let left = ControlInput::new(Vertical::Idle, Horizontal::Left);
        let right = ControlInput::new(Vertical::Idle, Horizontal::Right);
        let body = body.step(left, &physics);
        assert_eq!(body.rotation, 3.0);
        let body = body.step(left, &physics);
        assert_eq!(body.rotation, 6.0);
        let body = body.step(ControlInput::IDLE, &physics);
        assert_eq!(body.rotation, 4.0);
        // 4 - 5 = -1, decay stops at level instead of bouncing
        let body = body.step(right, &physics);
        assert_eq!(body.rotation, 0.0);
    }

    #[test]
    fn test_bounds_hold_for_random_inputs() {
        let mut rng = Pcg32::seed_from_u64(7);
        for physics in [PhysicsConfig::hover(), PhysicsConfig::gravity()] {
            let mut body = DroneBody::default();
            for _ in 0..5_000 {
                body = body.step(random_input(&mut rng), &physics);
                assert!(body.velocity.y >= physics.vertical_velocity_up_bound);
                assert!(body.velocity.y <= physics.vertical_velocity_down_bound);
                assert!(body.velocity.x.abs() <= physics.max_horizontal_velocity);
                assert!(body.rotation.abs() <= physics.rotation_limit);
            }
        }
    }

    #[test]
    fn test_sustained_banking_saturates_rotation() {
        let physics = PhysicsConfig::hover();
        let mut body = DroneBody::default();
        for _ in 0..50 {
            body = body.step(ControlInput::new(Vertical::Idle, Horizontal::Left), &physics);
        }
        assert_eq!(body.rotation, physics.rotation_limit - physics.rotation_decay);
        assert_eq!(body.velocity.x, -physics.max_horizontal_velocity);
    }
}
