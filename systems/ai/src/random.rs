//! Wandering strategy that drifts along a held heading.

use std::time::Duration;

use delve_core::{config::RandomTuning, AiKind, AiState};
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitCircle};

use crate::{roll, AiContext, EnemyAi};

/// Wanders along a random heading, re-drawn on a fixed interval or after
/// hitting a wall, and chases any target that comes into view.
#[derive(Clone, Debug)]
pub struct RandomMovement {
    tuning: RandomTuning,
    rng: ChaCha8Rng,
    state: AiState,
    direction: Vec2,
    last_direction_change: Duration,
    last_movement_check: Duration,
}

impl RandomMovement {
    /// Creates an idle wanderer with a freshly drawn heading.
    #[must_use]
    pub fn new(tuning: RandomTuning, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let direction = draw_direction(&mut rng);
        Self {
            tuning,
            rng,
            state: AiState::Idle,
            direction,
            last_direction_change: Duration::ZERO,
            last_movement_check: Duration::ZERO,
        }
    }

    /// Unit heading currently held.
    #[must_use]
    pub const fn direction(&self) -> Vec2 {
        self.direction
    }

    fn step(&mut self, ctx: &mut AiContext<'_>) {
        let before = ctx.agent.position();
        let target = before + self.direction * ctx.agent.stats().speed * self.tuning.step_multiplier;
        let _ = ctx.agent.move_towards(target, ctx.level);

        let after = ctx.agent.position();
        let threshold = self.tuning.stuck_threshold;
        let moved = (after.x - before.x).abs() > threshold || (after.y - before.y).abs() > threshold;
        if moved {
            return;
        }

        if roll(&mut self.rng, self.tuning.reverse_probability) {
            self.direction = -self.direction;
        } else {
            self.direction = draw_direction(&mut self.rng);
        }
    }
}

impl EnemyAi for RandomMovement {
    fn update(&mut self, ctx: &mut AiContext<'_>) {
        if ctx.agent.is_dead() {
            self.state = AiState::Dead;
            return;
        }

        if ctx.target_detected() {
            self.state = ctx.pursue();
            return;
        }

        self.state = AiState::Patrolling;

        if ctx.now.saturating_sub(self.last_direction_change) > self.tuning.direction_interval {
            self.direction = draw_direction(&mut self.rng);
            self.last_direction_change = ctx.now;
        }

        if ctx.now.saturating_sub(self.last_movement_check) > self.tuning.movement_check_interval {
            if roll(&mut self.rng, self.tuning.movement_probability) {
                self.step(ctx);
            }
            self.last_movement_check = ctx.now;
        }
    }

    fn state(&self) -> AiState {
        self.state
    }

    fn reset(&mut self) {
        self.state = AiState::Idle;
        self.direction = draw_direction(&mut self.rng);
        self.last_direction_change = Duration::ZERO;
        self.last_movement_check = Duration::ZERO;
    }

    fn kind(&self) -> AiKind {
        AiKind::Random
    }
}

fn draw_direction(rng: &mut ChaCha8Rng) -> Vec2 {
    let [x, y]: [f32; 2] = UnitCircle.sample(rng);
    Vec2::new(x, y)
}
