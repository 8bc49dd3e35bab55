//! Anchored strategy that defends the area around its spawn point.

use delve_core::{config::GuardTuning, AiKind, AiState};
use glam::Vec2;

use crate::{AiContext, EnemyAi};

/// Holds position at an anchor and only engages targets that stand within
/// the leash distance of it.
#[derive(Clone, Debug)]
pub struct Guard {
    tuning: GuardTuning,
    anchor: Vec2,
    state: AiState,
}

impl Guard {
    /// Creates an idle guard anchored at `anchor`.
    #[must_use]
    pub const fn new(anchor: Vec2, tuning: GuardTuning) -> Self {
        Self {
            tuning,
            anchor,
            state: AiState::Idle,
        }
    }

    /// Point the guard defends and returns to.
    #[must_use]
    pub const fn anchor(&self) -> Vec2 {
        self.anchor
    }
}

impl EnemyAi for Guard {
    fn update(&mut self, ctx: &mut AiContext<'_>) {
        if ctx.agent.is_dead() {
            self.state = AiState::Dead;
            return;
        }

        let intruder = ctx.target.position().distance(self.anchor) <= self.tuning.leash_distance;
        if ctx.target_detected() && intruder {
            self.state = ctx.pursue();
            return;
        }

        if ctx.agent.distance_to(self.anchor) > self.tuning.return_threshold {
            self.state = AiState::Patrolling;
            let _ = ctx.agent.move_towards(self.anchor, ctx.level);
            return;
        }

        self.state = AiState::Idle;
    }

    fn state(&self) -> AiState {
        self.state
    }

    fn reset(&mut self) {
        self.state = AiState::Idle;
    }

    fn kind(&self) -> AiKind {
        AiKind::Guard
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Guard;
    use crate::{AiContext, EnemyAi};
    use delve_core::{
        config::GuardTuning, AgentId, AgentKind, AiState, Archetype, CellCoord, CellType, Event, Grid, Size,
        Stats,
    };
    use delve_world::{agent::Agent, level::Level};
    use glam::Vec2;

    fn stats() -> Stats {
        Stats {
            health: 40,
            speed: 2.0,
            damage: 8,
            defense: 0,
            detection_radius: 150.0,
            attack_range: 12.0,
            attack_cooldown: Duration::from_millis(800),
            experience_reward: 2,
        }
    }

    fn open_level() -> Level {
        let mut grid = Grid::filled(40, 40, CellType::Wall);
        for row in 1..39 {
            for column in 1..39 {
                grid.carve(CellCoord::new(column, row), CellType::Room);
            }
        }
        Level::new(grid, 10.0)
    }

    fn agent(id: u32, kind: AgentKind, position: Vec2) -> Agent {
        Agent::new(AgentId::new(id), kind, position, Size::square(4.0), stats())
    }

    fn step(guard: &mut Guard, enemy: &mut Agent, player: &mut Agent, level: &Level, events: &mut Vec<Event>) {
        let mut ctx = AiContext {
            agent: enemy,
            target: player,
            level,
            now: Duration::from_millis(1_000),
            dt: Duration::from_millis(16),
            events,
        };
        guard.update(&mut ctx);
    }

    #[test]
    fn ignores_targets_beyond_the_leash() {
        let level = open_level();
        let anchor = Vec2::new(200.0, 200.0);
        let mut guard = Guard::new(anchor, GuardTuning::default());
        let mut enemy = agent(1, AgentKind::Enemy(Archetype::Troll), anchor);
        // Detected (120 away) but 120 from the anchor, past the 100 leash.
        let mut player = agent(0, AgentKind::Player, Vec2::new(320.0, 200.0));
        let mut events = Vec::new();

        step(&mut guard, &mut enemy, &mut player, &level, &mut events);

        assert_eq!(guard.state(), AiState::Idle);
        assert_eq!(enemy.position(), anchor);
    }

    #[test]
    fn engages_intruders_inside_the_leash() {
        let level = open_level();
        let anchor = Vec2::new(200.0, 200.0);
        let mut guard = Guard::new(anchor, GuardTuning::default());
        let mut enemy = agent(1, AgentKind::Enemy(Archetype::Troll), anchor);
        let mut player = agent(0, AgentKind::Player, Vec2::new(260.0, 200.0));
        let mut events = Vec::new();

        step(&mut guard, &mut enemy, &mut player, &level, &mut events);

        assert_eq!(guard.state(), AiState::Chasing);
        assert_eq!(enemy.position(), Vec2::new(202.0, 200.0));
    }

    #[test]
    fn strikes_adjacent_intruders() {
        let level = open_level();
        let anchor = Vec2::new(200.0, 200.0);
        let mut guard = Guard::new(anchor, GuardTuning::default());
        let mut enemy = agent(1, AgentKind::Enemy(Archetype::Troll), anchor);
        let mut player = agent(0, AgentKind::Player, Vec2::new(210.0, 200.0));
        let mut events = Vec::new();

        step(&mut guard, &mut enemy, &mut player, &level, &mut events);

        assert_eq!(guard.state(), AiState::Attacking);
        assert_eq!(player.health(), 32);
        assert!(matches!(events.as_slice(), [Event::AgentDamaged { amount: 8, .. }]));
    }

    #[test]
    fn walks_home_when_displaced() {
        let level = open_level();
        let anchor = Vec2::new(200.0, 200.0);
        let mut guard = Guard::new(anchor, GuardTuning::default());
        let mut enemy = agent(1, AgentKind::Enemy(Archetype::Troll), Vec2::new(250.0, 200.0));
        let mut player = agent(0, AgentKind::Player, Vec2::new(20.0, 20.0));
        let mut events = Vec::new();

        step(&mut guard, &mut enemy, &mut player, &level, &mut events);

        assert_eq!(guard.state(), AiState::Patrolling);
        assert_eq!(enemy.position(), Vec2::new(248.0, 200.0));
    }

    #[test]
    fn rests_near_the_anchor() {
        let level = open_level();
        let anchor = Vec2::new(200.0, 200.0);
        let mut guard = Guard::new(anchor, GuardTuning::default());
        let mut enemy = agent(1, AgentKind::Enemy(Archetype::Troll), Vec2::new(215.0, 200.0));
        let mut player = agent(0, AgentKind::Player, Vec2::new(20.0, 20.0));
        let mut events = Vec::new();

        step(&mut guard, &mut enemy, &mut player, &level, &mut events);

        assert_eq!(guard.state(), AiState::Idle);
        assert_eq!(enemy.position(), Vec2::new(215.0, 200.0));
    }
}
