#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Delve dungeon simulation.
//!
//! The world owns the read-only [`level::Level`], the player, and the live
//! enemy set. Adapters and systems mutate it through [`apply`]; behaviour
//! strategies borrow disjoint agents through [`World::combatants_mut`].

pub mod agent;
pub mod collision;
pub mod level;
pub mod navigation;
pub mod player;

use std::time::Duration;

use delve_core::{config::Tuning, AgentId, AgentKind, Command, Event, Grid};
use glam::Vec2;
use thiserror::Error;

use crate::{
    agent::Agent,
    level::{Level, LevelError},
    player::PlayerMotion,
};

/// Identifier reserved for the player agent.
pub const PLAYER_ID: AgentId = AgentId::new(0);

/// Failures raised while bootstrapping a world.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// The grid cannot host a player.
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Represents the authoritative dungeon world state.
#[derive(Debug)]
pub struct World {
    level: Level,
    tuning: Tuning,
    player: Agent,
    motion: PlayerMotion,
    intent: Vec2,
    enemies: Vec<Agent>,
    clock: Duration,
    tick_index: u64,
    next_agent: u32,
}

impl World {
    /// Creates a world over `grid` with the player centred on the start tile.
    pub fn new(grid: Grid, tuning: Tuning) -> Result<Self, WorldError> {
        let level = Level::new(grid, tuning.grid.tile_size);
        let start = level.start_position()?;
        let size = tuning.player.bounding_box();
        let offset = Vec2::splat(level.tile_size() / 2.0) - size.as_vec2() / 2.0;
        let player = Agent::new(
            PLAYER_ID,
            AgentKind::Player,
            start + offset,
            size,
            tuning.player.stats(),
        );

        Ok(Self {
            level,
            tuning,
            player,
            motion: PlayerMotion::default(),
            intent: Vec2::ZERO,
            enemies: Vec::new(),
            clock: Duration::ZERO,
            tick_index: 0,
            next_agent: PLAYER_ID.get() + 1,
        })
    }

    /// Borrows the level, player and enemies at once so behaviours can mutate agents.
    pub fn combatants_mut(&mut self) -> Combatants<'_> {
        Combatants {
            level: &self.level,
            player: &mut self.player,
            enemies: &mut self.enemies,
            now: self.clock,
        }
    }

    fn allocate_id(&mut self) -> AgentId {
        let id = AgentId::new(self.next_agent);
        self.next_agent = self.next_agent.saturating_add(1);
        id
    }

    fn remove_corpses(&mut self, out_events: &mut Vec<Event>) {
        let grace = self.tuning.simulation.corpse_grace;
        let now = self.clock;
        let expired = |agent: &Agent| {
            agent
                .died_at()
                .is_some_and(|died_at| now.saturating_sub(died_at) >= grace)
        };

        for agent in self.enemies.iter().filter(|agent| expired(agent)) {
            tracing::debug!(agent = agent.id().get(), "removing corpse");
            out_events.push(Event::AgentRemoved { agent: agent.id() });
        }
        self.enemies.retain(|agent| !expired(agent));
    }

    fn player_swing(&mut self, out_events: &mut Vec<Event>) {
        let now = self.clock;
        if !self.player.begin_swing(now) {
            return;
        }

        let origin = self.player.position();
        let reach = self.player.stats().attack_range;
        for enemy in self
            .enemies
            .iter_mut()
            .filter(|enemy| !enemy.is_dead() && enemy.distance_to(origin) <= reach)
        {
            let _ = self.player.strike(enemy, now, out_events);
        }
    }
}

/// Disjoint mutable borrows of every agent alongside the read-only level.
#[derive(Debug)]
pub struct Combatants<'a> {
    /// Level the agents move through.
    pub level: &'a Level,
    /// The player agent.
    pub player: &'a mut Agent,
    /// Every enemy still in the live set, corpses included.
    pub enemies: &'a mut [Agent],
    /// Current simulation time.
    pub now: Duration,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });

            world.motion.advance(
                &mut world.player,
                world.intent,
                &world.tuning.player,
                &world.level,
            );
            world.remove_corpses(out_events);
        }
        Command::SetPlayerIntent { intent } => {
            world.intent = intent;
        }
        Command::PlayerAttack => world.player_swing(out_events),
        Command::SpawnEnemy {
            archetype,
            ai,
            position,
        } => {
            let profile = world.tuning.archetypes.get(archetype);
            let (size, stats) = (profile.bounding_box(), profile.stats);
            let agent = world.allocate_id();
            world.enemies.push(Agent::new(
                agent,
                AgentKind::Enemy(archetype),
                position,
                size,
                stats,
            ));
            tracing::trace!(agent = agent.get(), archetype = archetype.name(), ?ai, "enemy spawned");
            out_events.push(Event::EnemySpawned {
                agent,
                archetype,
                ai,
                position,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::{collections::BTreeMap, time::Duration};

    use delve_core::{config::Tuning, AgentId, AgentKind, Archetype};
    use glam::Vec2;

    use super::World;
    use crate::{agent::Agent, level::Level, player::PlayerMotion};

    /// Provides read-only access to the level.
    #[must_use]
    pub fn level(world: &World) -> &Level {
        &world.level
    }

    /// Tuning the world was created with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }

    /// The player agent.
    #[must_use]
    pub fn player(world: &World) -> &Agent {
        &world.player
    }

    /// The player's velocity state.
    #[must_use]
    pub fn player_motion(world: &World) -> PlayerMotion {
        world.motion
    }

    /// Every enemy in the live set, corpses within their grace period included.
    #[must_use]
    pub fn enemies(world: &World) -> &[Agent] {
        &world.enemies
    }

    /// Enemy with the provided identifier, if still in the live set.
    #[must_use]
    pub fn enemy(world: &World, agent: AgentId) -> Option<&Agent> {
        world.enemies.iter().find(|enemy| enemy.id() == agent)
    }

    /// Simulation time accumulated from ticks.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of enemies that are still alive.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world.enemies.iter().filter(|enemy| !enemy.is_dead()).count()
    }

    /// Number of dead enemies awaiting removal.
    #[must_use]
    pub fn dead_enemy_count(world: &World) -> usize {
        world.enemies.iter().filter(|enemy| enemy.is_dead()).count()
    }

    /// Live enemy counts keyed by archetype; archetypes with no live enemy are omitted.
    #[must_use]
    pub fn archetype_census(world: &World) -> BTreeMap<Archetype, usize> {
        let mut census = BTreeMap::new();
        for enemy in world.enemies.iter().filter(|enemy| !enemy.is_dead()) {
            if let AgentKind::Enemy(archetype) = enemy.kind() {
                *census.entry(archetype).or_insert(0) += 1;
            }
        }
        census
    }

    /// Live enemies whose position lies within `range` of `point`.
    #[must_use]
    pub fn enemies_in_range(world: &World, point: Vec2, range: f32) -> Vec<AgentId> {
        world
            .enemies
            .iter()
            .filter(|enemy| !enemy.is_dead() && enemy.distance_to(point) <= range)
            .map(Agent::id)
            .collect()
    }

    /// Live enemy closest to `point`; ties resolve to the earliest spawned.
    #[must_use]
    pub fn closest_enemy(world: &World, point: Vec2) -> Option<AgentId> {
        world
            .enemies
            .iter()
            .filter(|enemy| !enemy.is_dead())
            .map(|enemy| (enemy.id(), enemy.distance_to(point)))
            .fold(None, |best: Option<(AgentId, f32)>, candidate| match best {
                Some((_, distance)) if distance <= candidate.1 => best,
                _ => Some(candidate),
            })
            .map(|(agent, _)| agent)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{apply, query, World, WorldError, PLAYER_ID};
    use crate::level::LevelError;
    use delve_core::{config::Tuning, AiKind, Archetype, CellCoord, CellType, Command, Event, Grid};
    use glam::Vec2;

    fn arena() -> Grid {
        let mut grid = Grid::filled(9, 9, CellType::Wall);
        for row in 1..8 {
            for column in 1..8 {
                grid.carve(CellCoord::new(column, row), CellType::Room);
            }
        }
        grid.carve(CellCoord::new(1, 1), CellType::Start);
        grid.carve(CellCoord::new(7, 7), CellType::End);
        grid
    }

    #[test]
    fn player_spawns_centred_on_start_tile() {
        let world = World::new(arena(), Tuning::default()).expect("world");
        assert_eq!(query::player(&world).position(), Vec2::new(42.0, 42.0));
        assert_eq!(query::player(&world).id(), PLAYER_ID);
    }

    #[test]
    fn grids_without_start_are_rejected() {
        let error = World::new(Grid::filled(5, 5, CellType::Wall), Tuning::default())
            .expect_err("missing start");
        assert_eq!(error, WorldError::Level(LevelError::StartNotFound));
    }

    #[test]
    fn spawn_command_assigns_fresh_identifiers() {
        let mut world = World::new(arena(), Tuning::default()).expect("world");
        let mut events = Vec::new();

        for _ in 0..2 {
            apply(
                &mut world,
                Command::SpawnEnemy {
                    archetype: Archetype::Spider,
                    ai: AiKind::Random,
                    position: Vec2::new(150.0, 150.0),
                },
                &mut events,
            );
        }

        let ids: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                Event::EnemySpawned { agent, .. } => Some(agent.get()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(query::enemies(&world)[0].size().width, 21.0);
        assert_eq!(query::enemies(&world)[0].health(), 30);
    }

    #[test]
    fn tick_advances_clock_and_moves_player() {
        let mut world = World::new(arena(), Tuning::default()).expect("world");
        let mut events = Vec::new();
        let dt = Duration::from_millis(16);

        apply(&mut world, Command::SetPlayerIntent { intent: Vec2::X }, &mut events);
        apply(&mut world, Command::Tick { dt }, &mut events);

        assert_eq!(events, vec![Event::TimeAdvanced { dt }]);
        assert_eq!(query::clock(&world), dt);
        assert_eq!(query::tick_index(&world), 1);
        assert_eq!(query::player(&world).position(), Vec2::new(42.5, 42.0));
    }

    #[test]
    fn player_swing_hits_every_enemy_in_reach() {
        let mut world = World::new(arena(), Tuning::default()).expect("world");
        let mut events = Vec::new();
        for position in [Vec2::new(60.0, 42.0), Vec2::new(42.0, 70.0), Vec2::new(200.0, 200.0)] {
            apply(
                &mut world,
                Command::SpawnEnemy {
                    archetype: Archetype::Goblin,
                    ai: AiKind::Guard,
                    position,
                },
                &mut events,
            );
        }
        events.clear();

        apply(&mut world, Command::PlayerAttack, &mut events);

        let damaged = events
            .iter()
            .filter(|event| matches!(event, Event::AgentDamaged { amount: 20, .. }))
            .count();
        assert_eq!(damaged, 2);
        assert_eq!(query::enemies(&world)[2].health(), 50);

        events.clear();
        apply(&mut world, Command::PlayerAttack, &mut events);
        assert!(events.is_empty(), "swing inside cooldown must be ignored");
    }

    #[test]
    fn corpses_leave_after_grace_period() {
        let mut tuning = Tuning::default();
        tuning.player.damage = 500;
        let mut world = World::new(arena(), tuning).expect("world");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                archetype: Archetype::Troll,
                ai: AiKind::Aggressive,
                position: Vec2::new(50.0, 50.0),
            },
            &mut events,
        );
        apply(&mut world, Command::PlayerAttack, &mut events);
        assert!(events.contains(&Event::AgentDied {
            agent: delve_core::AgentId::new(1),
            experience_reward: 75,
        }));
        assert_eq!(query::dead_enemy_count(&world), 1);
        assert_eq!(query::live_enemy_count(&world), 0);

        events.clear();
        apply(&mut world, Command::Tick { dt: Duration::from_millis(4_999) }, &mut events);
        assert_eq!(query::enemies(&world).len(), 1);

        events.clear();
        apply(&mut world, Command::Tick { dt: Duration::from_millis(1) }, &mut events);
        assert!(events.contains(&Event::AgentRemoved {
            agent: delve_core::AgentId::new(1),
        }));
        assert!(query::enemies(&world).is_empty());
    }

    #[test]
    fn census_queries_ignore_corpses() {
        let mut world = World::new(arena(), Tuning::default()).expect("world");
        let mut events = Vec::new();
        let spawns = [
            (Archetype::Goblin, Vec2::new(100.0, 100.0)),
            (Archetype::Goblin, Vec2::new(200.0, 200.0)),
            (Archetype::Spider, Vec2::new(60.0, 42.0)),
        ];
        for (archetype, position) in spawns {
            apply(
                &mut world,
                Command::SpawnEnemy {
                    archetype,
                    ai: AiKind::Patrol,
                    position,
                },
                &mut events,
            );
        }

        let census = query::archetype_census(&world);
        assert_eq!(census.get(&Archetype::Goblin), Some(&2));
        assert_eq!(census.get(&Archetype::Spider), Some(&1));
        assert_eq!(census.get(&Archetype::Troll), None);

        let origin = Vec2::new(42.0, 42.0);
        assert_eq!(
            query::closest_enemy(&world, origin),
            Some(delve_core::AgentId::new(3))
        );
        assert_eq!(query::enemies_in_range(&world, origin, 100.0).len(), 2);

        for _ in 0..2 {
            apply(&mut world, Command::PlayerAttack, &mut events);
            apply(&mut world, Command::Tick { dt: Duration::from_millis(400) }, &mut events);
        }

        assert_eq!(query::live_enemy_count(&world), 2);
        assert_eq!(query::archetype_census(&world).get(&Archetype::Spider), None);
        assert_eq!(
            query::closest_enemy(&world, origin),
            Some(delve_core::AgentId::new(1))
        );
    }
}
