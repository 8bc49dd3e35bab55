//! Wiring of the world, its systems and the scene snapshot.

use std::{collections::BTreeMap, time::Duration};

use anyhow::{Context, Result};
use delve_core::{config::Tuning, AgentKind, AiState, Archetype, CellCoord, CellType, Command, Event};
use delve_rendering::{AgentPresentation, Scene};
use delve_system_ai::Behaviors;
use delve_system_generation::DungeonGenerator;
use delve_world::{agent::Agent, apply, navigation::NavigationField, query, World, PLAYER_ID};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// How the player is steered while the simulation runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pilot {
    /// Swing whenever an enemy is in reach.
    pub(crate) auto_attack: bool,
    /// Follow the shortest route to the exit.
    pub(crate) autopilot: bool,
}

/// Outcome of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) player_health: u32,
    pub(crate) experience: u32,
    pub(crate) kills: usize,
    pub(crate) live_enemies: usize,
    pub(crate) census: BTreeMap<Archetype, usize>,
    pub(crate) reached_exit: bool,
}

/// One generated dungeon and everything simulating it.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    behaviors: Behaviors,
    exit_field: Option<NavigationField>,
    scene: Scene,
    pilot: Pilot,
    tick_interval: Duration,
    experience: u32,
    kills: usize,
}

impl Session {
    /// Generates a `width`×`height` dungeon from `seed`, then plans and spawns its population.
    pub(crate) fn new(tuning: Tuning, seed: u64, width: u32, height: u32, pilot: Pilot) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let dungeon = DungeonGenerator::new(tuning.rooms.clone())
            .generate(width, height, &mut rng)
            .context("failed to generate the dungeon")?;
        tracing::info!(width, height, rooms = dungeon.rooms().len(), seed, "dungeon generated");

        let behaviors = Behaviors::new(tuning.ai.clone(), rng.gen());
        let tick_interval = tuning.simulation.tick_interval();
        let world = World::new(dungeon.into_grid(), tuning).context("failed to create the world")?;

        let level = query::level(&world);
        let scene = Scene::new(level.grid(), level.tile_size()).context("failed to describe the level")?;
        let exit_field = level
            .grid()
            .find_first(CellType::End)
            .map(|end| NavigationField::from_level(level, &[end]));
        let route = level
            .grid()
            .find_first(CellType::Start)
            .zip(exit_field.as_ref())
            .and_then(|(start, field)| field.distance(start));
        tracing::info!(route_length = ?route, "exit route measured");

        let plans = delve_system_spawning::plan(level, query::tuning(&world), &mut rng)
            .context("failed to plan the population")?;
        let mut session = Self {
            world,
            behaviors,
            exit_field,
            scene,
            pilot,
            tick_interval,
            experience: 0,
            kills: 0,
        };

        for plan in plans {
            session.submit(plan.into_command());
        }
        tracing::info!(enemies = query::live_enemy_count(&session.world), "population spawned");

        session.refresh_scene();
        Ok(session)
    }

    /// Advances the simulation by one fixed tick.
    pub(crate) fn step(&mut self) {
        let intent = if self.pilot.autopilot {
            self.route_intent()
        } else {
            Vec2::ZERO
        };
        self.submit(Command::SetPlayerIntent { intent });

        if self.pilot.auto_attack && self.enemy_in_reach() {
            self.submit(Command::PlayerAttack);
        }

        self.submit(Command::Tick {
            dt: self.tick_interval,
        });
    }

    /// Whether the run cannot meaningfully continue.
    pub(crate) fn is_over(&self) -> bool {
        query::player(&self.world).is_dead() || self.player_on_exit()
    }

    /// Scene reflecting the latest tick.
    pub(crate) fn scene(&mut self) -> &Scene {
        self.refresh_scene();
        &self.scene
    }

    /// Totals describing the run so far.
    pub(crate) fn summary(&self) -> Summary {
        Summary {
            ticks: query::tick_index(&self.world),
            player_health: query::player(&self.world).health(),
            experience: self.experience,
            kills: self.kills,
            live_enemies: query::live_enemy_count(&self.world),
            census: query::archetype_census(&self.world),
            reached_exit: self.player_on_exit(),
        }
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        apply(&mut self.world, command, &mut events);

        let mut reactions = Vec::new();
        self.behaviors
            .handle(&events, self.world.combatants_mut(), &mut reactions);

        for event in events.iter().chain(&reactions) {
            if let Event::AgentDied {
                agent,
                experience_reward,
            } = event
            {
                if *agent == PLAYER_ID {
                    tracing::info!(tick = query::tick_index(&self.world), "player died");
                } else {
                    self.kills += 1;
                    self.experience = self.experience.saturating_add(*experience_reward);
                }
            }
        }
    }

    fn enemy_in_reach(&self) -> bool {
        let player = query::player(&self.world);
        !query::enemies_in_range(&self.world, player.position(), player.stats().attack_range).is_empty()
    }

    fn player_tile(&self) -> Option<CellCoord> {
        let player = query::player(&self.world);
        let center = player.position() + player.size().as_vec2() / 2.0;
        query::level(&self.world).tile_at(center)
    }

    fn player_on_exit(&self) -> bool {
        self.player_tile()
            .is_some_and(|tile| query::level(&self.world).cell_type(tile) == CellType::End)
    }

    /// Direction from the player's centre toward the next tile on the exit route.
    fn route_intent(&self) -> Vec2 {
        let (Some(field), Some(tile)) = (self.exit_field.as_ref(), self.player_tile()) else {
            return Vec2::ZERO;
        };
        let Some(here) = field.distance(tile) else {
            return Vec2::ZERO;
        };

        let next = tile
            .cardinal_neighbors()
            .into_iter()
            .find(|neighbor| field.distance(*neighbor).is_some_and(|distance| distance < here))
            .unwrap_or(tile);

        let level = query::level(&self.world);
        let player = query::player(&self.world);
        let center = player.position() + player.size().as_vec2() / 2.0;
        (level.tile_center(next) - center).normalize_or_zero()
    }

    fn refresh_scene(&mut self) {
        let player = query::player(&self.world);
        let mut agents = vec![present(player, None)];
        agents.extend(
            query::enemies(&self.world)
                .iter()
                .map(|enemy| present(enemy, self.behaviors.state_of(enemy))),
        );

        self.scene.agents = agents;
        self.scene.clock = query::clock(&self.world);
    }
}

fn present(agent: &Agent, state: Option<AiState>) -> AgentPresentation {
    AgentPresentation {
        id: agent.id(),
        kind: agent.kind(),
        position: agent.position(),
        size: agent.size(),
        health: agent.health(),
        max_health: agent.stats().health,
        state: match agent.kind() {
            AgentKind::Player => None,
            AgentKind::Enemy(_) => state,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{Pilot, Session};
    use delve_core::config::{SpawnTuning, Tuning};

    fn run(seed: u64, pilot: Pilot, ticks: usize) -> super::Summary {
        let mut session = Session::new(Tuning::default(), seed, 41, 31, pilot).expect("valid session");
        for _ in 0..ticks {
            session.step();
        }
        session.summary()
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let pilot = Pilot {
            auto_attack: true,
            autopilot: true,
        };

        assert_eq!(run(12, pilot, 240), run(12, pilot, 240));
    }

    #[test]
    fn idle_player_never_earns_experience() {
        let summary = run(4, Pilot::default(), 120);

        assert_eq!(summary.ticks, 120);
        assert_eq!(summary.kills, 0);
        assert_eq!(summary.experience, 0);
    }

    #[test]
    fn empty_spawn_table_leaves_the_dungeon_quiet() {
        let tuning = Tuning {
            spawn: SpawnTuning {
                table: Vec::new(),
                ..SpawnTuning::default()
            },
            ..Tuning::default()
        };
        let mut session = Session::new(tuning, 8, 21, 21, Pilot::default()).expect("valid session");
        session.step();

        let scene = session.scene();
        assert_eq!(scene.agents.len(), 1);
        assert!(scene.player().is_some_and(|player| player.is_alive()));
        assert_eq!(session.summary().live_enemies, 0);
    }

    #[test]
    fn undersized_dungeons_are_reported() {
        let outcome = Session::new(Tuning::default(), 0, 3, 3, Pilot::default());

        let message = format!("{:#}", outcome.expect_err("grid too small"));
        assert!(message.contains("failed to generate the dungeon"));
    }
}
