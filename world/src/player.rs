//! Velocity-based player motion with friction and wall sliding.

use std::f32::consts::FRAC_1_SQRT_2;

use delve_core::config::PlayerTuning;
use glam::Vec2;

use crate::{agent::Agent, collision, level::Level};

/// Velocity carried by the player between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerMotion {
    velocity: Vec2,
}

impl PlayerMotion {
    /// Current velocity in pixels per tick.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Advances the player one tick along `intent`.
    ///
    /// Axes without input decay by friction, the magnitude is clamped to the
    /// configured maximum, and every axis the resolver blocks loses its velocity.
    pub fn advance(&mut self, player: &mut Agent, intent: Vec2, tuning: &PlayerTuning, level: &Level) {
        if player.is_dead() {
            self.velocity = Vec2::ZERO;
            return;
        }

        let mut acceleration = sanitize(intent) * tuning.acceleration;
        if acceleration.x != 0.0 && acceleration.y != 0.0 {
            acceleration *= FRAC_1_SQRT_2;
        }

        let mut velocity = self.velocity + acceleration;
        if acceleration.x == 0.0 {
            velocity.x = apply_friction(velocity.x, tuning.friction);
        }
        if acceleration.y == 0.0 {
            velocity.y = apply_friction(velocity.y, tuning.friction);
        }
        velocity = velocity.clamp_length_max(tuning.max_speed.max(0.0));

        let current = player.position();
        let outcome = collision::resolve(current, current + velocity, player.size(), level);
        if !outcome.x_allowed {
            velocity.x = 0.0;
        }
        if !outcome.y_allowed {
            velocity.y = 0.0;
        }

        player.set_position(outcome.position);
        self.velocity = velocity;
    }
}

fn sanitize(intent: Vec2) -> Vec2 {
    let axis = |value: f32| {
        if value.is_finite() {
            value.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    };
    Vec2::new(axis(intent.x), axis(intent.y))
}

fn apply_friction(velocity: f32, friction: f32) -> f32 {
    if velocity.abs() <= friction {
        0.0
    } else {
        velocity - friction * velocity.signum()
    }
}
