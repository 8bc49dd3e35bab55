//! Waypoint circuit around a fixed centre.

use std::{f32::consts::TAU, time::Duration};

use delve_core::{config::PatrolTuning, AiKind, AiState};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{AiContext, EnemyAi};

/// Walks a cyclic list of waypoints placed around its spawn point, pausing
/// at each one, and breaks off to chase a detected target.
#[derive(Clone, Debug)]
pub struct Patrol {
    tuning: PatrolTuning,
    rng: ChaCha8Rng,
    center: Vec2,
    waypoints: Vec<Vec2>,
    index: usize,
    waiting_since: Option<Duration>,
    state: AiState,
}

impl Patrol {
    /// Creates a patrol around `center` with freshly jittered waypoints.
    #[must_use]
    pub fn new(center: Vec2, tuning: PatrolTuning, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let waypoints = waypoints_around(center, &tuning, &mut rng);
        Self {
            tuning,
            rng,
            center,
            waypoints,
            index: 0,
            waiting_since: None,
            state: AiState::Patrolling,
        }
    }

    /// Waypoints in visiting order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Waypoint currently walked towards or waited at.
    #[must_use]
    pub fn active_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.index).copied()
    }

    /// Reports whether the patrol is pausing at a waypoint.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        self.waiting_since.is_some()
    }

    fn walk(&mut self, ctx: &mut AiContext<'_>) {
        if let Some(since) = self.waiting_since {
            if ctx.now.saturating_sub(since) >= self.tuning.wait_time {
                self.waiting_since = None;
                self.index = (self.index + 1) % self.waypoints.len().max(1);
            }
            return;
        }

        let Some(waypoint) = self.active_waypoint() else {
            self.state = AiState::Idle;
            return;
        };

        if ctx.agent.distance_to(waypoint) < self.tuning.arrival_distance {
            self.waiting_since = Some(ctx.now);
            self.state = AiState::Idle;
        } else {
            self.state = AiState::Patrolling;
            let _ = ctx.agent.move_towards(waypoint, ctx.level);
        }
    }
}

impl EnemyAi for Patrol {
    fn update(&mut self, ctx: &mut AiContext<'_>) {
        if ctx.agent.is_dead() {
            self.state = AiState::Dead;
            return;
        }

        if ctx.target_detected() {
            self.state = ctx.pursue();
            return;
        }

        if matches!(self.state, AiState::Chasing | AiState::Attacking) {
            self.state = AiState::Patrolling;
            self.waiting_since = None;
        }

        self.walk(ctx);
    }

    fn state(&self) -> AiState {
        self.state
    }

    fn reset(&mut self) {
        self.waypoints = waypoints_around(self.center, &self.tuning, &mut self.rng);
        self.index = 0;
        self.waiting_since = None;
        self.state = AiState::Patrolling;
    }

    fn kind(&self) -> AiKind {
        AiKind::Patrol
    }
}

/// Spreads the waypoints evenly by angle, each at a jittered fraction of the radius.
fn waypoints_around(center: Vec2, tuning: &PatrolTuning, rng: &mut ChaCha8Rng) -> Vec<Vec2> {
    let count = tuning.point_count;
    let floor = tuning.jitter_floor.clamp(0.0, 1.0);
    let mut jitter = || tuning.radius * (floor + rng.gen::<f32>() * (1.0 - floor));

    (0..count)
        .map(|step| {
            let angle = step as f32 / count as f32 * TAU;
            let offset = Vec2::new(angle.cos() * jitter(), angle.sin() * jitter());
            center + offset
        })
        .collect()
}
