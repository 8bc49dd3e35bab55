//! Relentless pursuer that keeps hunting after losing sight of its target.

use std::time::Duration;

use delve_core::{config::AggressiveTuning, AiKind, AiState};
use glam::Vec2;

use crate::{AiContext, EnemyAi};

/// Chases a detected target and, once it escapes, walks to where it was
/// last seen for a bounded search window.
#[derive(Clone, Debug)]
pub struct Aggressive {
    tuning: AggressiveTuning,
    last_seen: Option<Vec2>,
    searched: Duration,
    state: AiState,
}

impl Aggressive {
    /// Creates an idle pursuer with no memory of the target.
    #[must_use]
    pub const fn new(tuning: AggressiveTuning) -> Self {
        Self {
            tuning,
            last_seen: None,
            searched: Duration::ZERO,
            state: AiState::Idle,
        }
    }

    /// Where the target was last detected, while the search is still on.
    #[must_use]
    pub const fn last_seen(&self) -> Option<Vec2> {
        self.last_seen
    }

    /// Time spent searching since the target was lost.
    #[must_use]
    pub const fn searched(&self) -> Duration {
        self.searched
    }

    fn forget(&mut self) {
        self.last_seen = None;
        self.searched = Duration::ZERO;
    }
}

impl EnemyAi for Aggressive {
    fn update(&mut self, ctx: &mut AiContext<'_>) {
        if ctx.agent.is_dead() {
            self.state = AiState::Dead;
            return;
        }

        if ctx.target_detected() {
            self.last_seen = Some(ctx.target.position());
            self.searched = Duration::ZERO;
            self.state = ctx.pursue();
            return;
        }

        match self.last_seen {
            Some(spot) if self.searched < self.tuning.search_time => {
                self.state = AiState::Chasing;
                self.searched += ctx.dt;
                let _ = ctx.agent.move_towards(spot, ctx.level);

                if ctx.agent.distance_to(spot) < self.tuning.arrival_distance {
                    self.forget();
                }
            }
            _ => {
                self.state = AiState::Idle;
                self.forget();
            }
        }
    }

    fn state(&self) -> AiState {
        self.state
    }

    fn reset(&mut self) {
        self.state = AiState::Idle;
        self.forget();
    }

    fn kind(&self) -> AiKind {
        AiKind::Aggressive
    }
}
