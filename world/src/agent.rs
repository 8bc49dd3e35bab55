//! Shared agent contract: position, health, attack and movement primitives.

use std::time::Duration;

use delve_core::{AgentId, AgentKind, Event, Size, Stats};
use glam::Vec2;

use crate::{collision, level::Level};

/// Damage actually removed from an agent by a single hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Damage {
    /// Health removed after defense.
    pub applied: u32,
    /// Health left afterwards.
    pub remaining: u32,
    /// Whether the hit was lethal.
    pub died: bool,
}

/// Mobile combatant occupying an axis-aligned bounding box.
///
/// `position` is the box's upper-left corner in pixels. Health never exceeds
/// the stats record and saturates at zero; an agent with no health is dead
/// and every move or attack it attempts is a silent no-op.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    position: Vec2,
    size: Size,
    stats: Stats,
    health: u32,
    last_attack: Option<Duration>,
    died_at: Option<Duration>,
}

impl Agent {
    /// Creates an agent at full health that has never attacked.
    ///
    /// An agent whose stats grant no health starts out dead.
    #[must_use]
    pub fn new(id: AgentId, kind: AgentKind, position: Vec2, size: Size, stats: Stats) -> Self {
        Self {
            id,
            kind,
            position,
            size,
            stats,
            health: stats.health,
            last_attack: None,
            died_at: (stats.health == 0).then_some(Duration::ZERO),
        }
    }

    /// Identifier of the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Whether the agent is the player or which enemy archetype it is.
    #[must_use]
    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Upper-left corner of the bounding box.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Bounding box extents.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Statistics record.
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Whether health reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.died_at.is_some()
    }

    /// Simulation time of death, if dead.
    #[must_use]
    pub const fn died_at(&self) -> Option<Duration> {
        self.died_at
    }

    /// Simulation time of the last landed or attempted swing.
    #[must_use]
    pub const fn last_attack(&self) -> Option<Duration> {
        self.last_attack
    }

    /// Euclidean distance between this agent's upper-left corner and `point`.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Reports whether `point` lies within the detection radius.
    #[must_use]
    pub fn can_detect(&self, point: Vec2) -> bool {
        !self.is_dead() && self.distance_to(point) <= self.stats.detection_radius
    }

    /// Reports whether the cooldown elapsed at `now`.
    #[must_use]
    pub fn cooldown_ready(&self, now: Duration) -> bool {
        self.last_attack
            .map_or(true, |last| now.saturating_sub(last) >= self.stats.attack_cooldown)
    }

    /// Reports whether an attack on a target at `target` may start at `now`.
    #[must_use]
    pub fn can_attack(&self, target: Vec2, now: Duration) -> bool {
        !self.is_dead()
            && self.cooldown_ready(now)
            && self.distance_to(target) <= self.stats.attack_range
    }

    /// Attacks `target` if allowed, returning whether damage was applied.
    ///
    /// A rejected attack leaves the cooldown untouched.
    pub fn attack(&mut self, target: &mut Agent, now: Duration, out_events: &mut Vec<Event>) -> bool {
        if target.is_dead() || !self.can_attack(target.position(), now) {
            return false;
        }

        self.last_attack = Some(now);
        self.strike(target, now, out_events)
    }

    /// Starts the cooldown without picking a target.
    pub(crate) fn begin_swing(&mut self, now: Duration) -> bool {
        if self.is_dead() || !self.cooldown_ready(now) {
            return false;
        }

        self.last_attack = Some(now);
        true
    }

    /// Applies this agent's damage to `target` and reports the outcome as events.
    pub(crate) fn strike(&self, target: &mut Agent, now: Duration, out_events: &mut Vec<Event>) -> bool {
        let Some(damage) = target.take_damage(self.stats.damage, now) else {
            return false;
        };

        out_events.push(Event::AgentDamaged {
            attacker: self.id,
            target: target.id,
            amount: damage.applied,
            remaining: damage.remaining,
        });

        if damage.died {
            tracing::debug!(agent = target.id.get(), attacker = self.id.get(), "agent died");
            out_events.push(Event::AgentDied {
                agent: target.id,
                experience_reward: target.stats.experience_reward,
            });
        }

        true
    }

    /// Subtracts `raw` minus defense, at least one point, from health.
    ///
    /// Returns `None` when the agent was already dead.
    pub fn take_damage(&mut self, raw: u32, now: Duration) -> Option<Damage> {
        if self.is_dead() {
            return None;
        }

        let applied = raw.saturating_sub(self.stats.defense).max(1);
        let before = self.health;
        self.health = self.health.saturating_sub(applied);

        let died = self.health == 0;
        if died {
            self.died_at = Some(now);
        }

        Some(Damage {
            applied: before - self.health,
            remaining: self.health,
            died,
        })
    }

    /// Steps `speed` pixels toward `point` through the collision resolver.
    ///
    /// Returns whether the position changed.
    pub fn move_towards(&mut self, point: Vec2, level: &Level) -> bool {
        if self.is_dead() {
            return false;
        }

        let delta = point - self.position;
        let distance = delta.length();
        if distance.is_nan() || distance <= 0.0 {
            return false;
        }

        let candidate = self.position + delta / distance * self.stats.speed;
        let outcome = collision::resolve(self.position, candidate, self.size, level);
        let moved = outcome.moved_from(self.position);
        self.position = outcome.position;
        moved
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Agent;
    use crate::level::Level;
    use delve_core::{AgentId, AgentKind, Archetype, CellCoord, CellType, Event, Grid, Size, Stats};
    use glam::Vec2;

    fn stats(health: u32, damage: u32, defense: u32) -> Stats {
        Stats {
            health,
            speed: 2.0,
            damage,
            defense,
            detection_radius: 100.0,
            attack_range: 30.0,
            attack_cooldown: Duration::from_millis(1_000),
            experience_reward: 25,
        }
    }

    fn goblin(id: u32, position: Vec2, stats: Stats) -> Agent {
        Agent::new(
            AgentId::new(id),
            AgentKind::Enemy(Archetype::Goblin),
            position,
            Size::square(8.0),
            stats,
        )
    }

    fn open_floor() -> Level {
        let mut grid = Grid::filled(6, 6, CellType::Wall);
        for row in 1..5 {
            for column in 1..5 {
                grid.carve(CellCoord::new(column, row), CellType::Room);
            }
        }
        Level::new(grid, 10.0)
    }

    #[test]
    fn second_attack_inside_cooldown_is_rejected() {
        let mut attacker = goblin(1, Vec2::new(10.0, 10.0), stats(50, 15, 0));
        let mut target = goblin(2, Vec2::new(20.0, 10.0), stats(100, 15, 0));
        let mut events = Vec::new();

        assert!(attacker.attack(&mut target, Duration::from_millis(0), &mut events));
        assert_eq!(target.health(), 85);

        assert!(!attacker.attack(&mut target, Duration::from_millis(500), &mut events));
        assert_eq!(target.health(), 85);
        assert_eq!(attacker.last_attack(), Some(Duration::from_millis(0)));
        assert_eq!(events.len(), 1);

        assert!(attacker.attack(&mut target, Duration::from_millis(1_000), &mut events));
        assert_eq!(target.health(), 70);
    }

    #[test]
    fn lethal_hit_clamps_health_to_zero() {
        let mut victim = goblin(1, Vec2::ZERO, stats(50, 0, 0));

        let damage = victim
            .take_damage(60, Duration::from_secs(3))
            .expect("alive");

        assert_eq!(damage.remaining, 0);
        assert_eq!(damage.applied, 50);
        assert!(damage.died);
        assert_eq!(victim.health(), 0);
        assert!(victim.is_dead());
        assert_eq!(victim.died_at(), Some(Duration::from_secs(3)));
        assert!(victim.take_damage(5, Duration::from_secs(4)).is_none());
    }

    #[test]
    fn defense_never_reduces_a_hit_below_one() {
        let mut tank = goblin(1, Vec2::ZERO, stats(10, 0, 40));
        let damage = tank.take_damage(15, Duration::ZERO).expect("alive");
        assert_eq!(damage.applied, 1);
        assert_eq!(tank.health(), 9);
    }

    #[test]
    fn lethal_attack_reports_death_with_reward() {
        let mut attacker = goblin(1, Vec2::ZERO, stats(50, 80, 0));
        let mut target = goblin(2, Vec2::new(5.0, 0.0), stats(50, 0, 0));
        let mut events = Vec::new();

        assert!(attacker.attack(&mut target, Duration::ZERO, &mut events));

        assert_eq!(
            events,
            vec![
                Event::AgentDamaged {
                    attacker: AgentId::new(1),
                    target: AgentId::new(2),
                    amount: 50,
                    remaining: 0,
                },
                Event::AgentDied {
                    agent: AgentId::new(2),
                    experience_reward: 25,
                },
            ]
        );
    }

    #[test]
    fn dead_agents_neither_move_nor_attack() {
        let level = open_floor();
        let mut corpse = goblin(1, Vec2::new(15.0, 15.0), stats(1, 10, 0));
        let mut target = goblin(2, Vec2::new(20.0, 15.0), stats(10, 0, 0));
        let _ = corpse.take_damage(5, Duration::ZERO);

        assert!(!corpse.move_towards(Vec2::new(30.0, 30.0), &level));
        assert!(!corpse.can_attack(target.position(), Duration::from_secs(9)));
        assert!(!corpse.attack(&mut target, Duration::from_secs(9), &mut Vec::new()));
        assert_eq!(corpse.position(), Vec2::new(15.0, 15.0));
        assert_eq!(target.health(), 10);
    }

    #[test]
    fn agents_without_health_start_dead() {
        let level = open_floor();
        let mut hollow = goblin(1, Vec2::new(15.0, 15.0), stats(0, 10, 0));
        let mut target = goblin(2, Vec2::new(20.0, 15.0), stats(10, 0, 0));
        let mut events = Vec::new();

        assert!(hollow.is_dead());
        assert_eq!(hollow.died_at(), Some(Duration::ZERO));
        assert!(!hollow.move_towards(Vec2::new(30.0, 30.0), &level));
        assert!(!hollow.attack(&mut target, Duration::ZERO, &mut events));
        assert!(hollow.take_damage(5, Duration::ZERO).is_none());
        assert!(events.is_empty());
        assert_eq!(target.health(), 10);
    }

    #[test]
    fn out_of_range_targets_cannot_be_attacked() {
        let attacker = goblin(1, Vec2::ZERO, stats(10, 10, 0));
        assert!(attacker.can_attack(Vec2::new(30.0, 0.0), Duration::ZERO));
        assert!(!attacker.can_attack(Vec2::new(30.5, 0.0), Duration::ZERO));
    }

    #[test]
    fn move_towards_steps_by_speed() {
        let level = open_floor();
        let mut walker = goblin(1, Vec2::new(12.0, 12.0), stats(10, 0, 0));

        assert!(walker.move_towards(Vec2::new(32.0, 12.0), &level));
        assert_eq!(walker.position(), Vec2::new(14.0, 12.0));
        assert!(!walker.move_towards(walker.position(), &level));
    }

    #[test]
    fn move_towards_stops_at_walls() {
        let level = open_floor();
        let mut walker = goblin(1, Vec2::new(41.5, 20.0), stats(10, 0, 0));

        assert!(!walker.move_towards(Vec2::new(60.0, 20.0), &level));
        assert_eq!(walker.position(), Vec2::new(41.5, 20.0));
    }
}
