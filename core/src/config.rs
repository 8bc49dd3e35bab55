//! Tunable constants consumed at construction time by the generator, world and systems.
//!
//! Every section carries `#[serde(default)]`, so a partial configuration
//! file only overrides the keys it names. Durations travel as whole
//! milliseconds under `*_ms` keys.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AiKind, Archetype, Size, Stats};

/// Aggregated tuning knobs controlling every adjustable aspect of the dungeon simulation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Grid dimensions and tile scale.
    pub grid: GridTuning,
    /// Room placement and connection parameters.
    pub rooms: RoomTuning,
    /// Player motion and combat parameters.
    pub player: PlayerTuning,
    /// Per-archetype enemy statistics.
    pub archetypes: ArchetypeTable,
    /// Timing constants of the behaviour strategies.
    pub ai: AiTuning,
    /// Population planner probabilities, distances and weight table.
    pub spawn: SpawnTuning,
    /// Tick rate and corpse lifetime.
    pub simulation: SimulationTuning,
}

/// Viewport-derived grid dimensions and the pixel size of a tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridTuning {
    /// Viewport width in pixels.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
    /// How many viewports fit along each axis of the dungeon.
    pub size_multiplier: u32,
    /// Edge length of a square tile in pixels.
    pub tile_size: f32,
}

impl GridTuning {
    /// Grid dimensions in tiles: viewport × multiplier ÷ tile size, floored.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        let scale = |viewport: u32| {
            if self.tile_size <= 0.0 {
                return 0;
            }
            let tiles = (viewport as f32 * self.size_multiplier as f32 / self.tile_size).floor();
            tiles as u32
        };
        (scale(self.viewport_width), scale(self.viewport_height))
    }
}

impl Default for GridTuning {
    fn default() -> Self {
        Self {
            viewport_width: 1_024,
            viewport_height: 768,
            size_multiplier: 5,
            tile_size: 36.0,
        }
    }
}

/// Room placement and room-to-maze connection parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomTuning {
    /// Smallest footprint edge, perimeter included.
    pub min_size: u32,
    /// Largest footprint edge, perimeter included.
    pub max_size: u32,
    /// Placement attempts granted per targeted room.
    pub attempts_per_room: u32,
    /// Lower bound of the targeted room count.
    pub min_count: u32,
    /// Upper bound of the targeted room count.
    pub max_count: u32,
    /// Cells every footprint is grown by before overlap checks.
    pub buffer: i32,
    /// Cells kept free between any footprint and the grid edge.
    pub margin: i32,
    /// Maximum cells walked from an opening while looking for a corridor.
    pub connection_search: i32,
    /// Fewest perimeter cells opened per room.
    pub min_openings: u32,
    /// Most perimeter cells opened per room.
    pub max_openings: u32,
}

impl Default for RoomTuning {
    fn default() -> Self {
        Self {
            min_size: 3,
            max_size: 7,
            attempts_per_room: 10,
            min_count: 20,
            max_count: 40,
            buffer: 2,
            margin: 2,
            connection_search: 5,
            min_openings: 1,
            max_openings: 2,
        }
    }
}

/// Player motion physics and combat statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Edge length of the player's square bounding box.
    pub size: f32,
    /// Starting and maximum health.
    pub health: u32,
    /// Raw damage of a swing.
    pub damage: u32,
    /// Damage subtracted from every hit received.
    pub defense: u32,
    /// Velocity gained per tick along an axis with input.
    pub acceleration: f32,
    /// Velocity lost per tick along an axis without input.
    pub friction: f32,
    /// Upper bound of the velocity magnitude.
    pub max_speed: f32,
    /// Reach of a swing in pixels.
    pub attack_range: f32,
    /// Minimum time between two swings.
    #[serde(rename = "attack_cooldown_ms", with = "millis")]
    pub attack_cooldown: Duration,
}

impl PlayerTuning {
    /// Edge lengths of the player's bounding box.
    #[must_use]
    pub const fn bounding_box(&self) -> Size {
        Size::square(self.size)
    }

    /// Statistics record carried by the player agent.
    #[must_use]
    pub const fn stats(&self) -> Stats {
        Stats {
            health: self.health,
            speed: self.max_speed,
            damage: self.damage,
            defense: self.defense,
            detection_radius: 0.0,
            attack_range: self.attack_range,
            attack_cooldown: self.attack_cooldown,
            experience_reward: 0,
        }
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: 24.0,
            health: 100,
            damage: 20,
            defense: 2,
            acceleration: 0.5,
            friction: 0.3,
            max_speed: 6.0,
            attack_range: 40.0,
            attack_cooldown: Duration::from_millis(400),
        }
    }
}

/// Size and statistics describing one enemy archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeTuning {
    /// Edge length of the square bounding box.
    pub size: f32,
    /// Combat and movement statistics.
    #[serde(flatten)]
    pub stats: Stats,
}

impl ArchetypeTuning {
    fn new(
        size: f32,
        health: u32,
        damage: u32,
        speed: f32,
        detection_radius: f32,
        attack_range: f32,
        cooldown_ms: u64,
        experience_reward: u32,
    ) -> Self {
        Self {
            size,
            stats: Stats {
                health,
                speed,
                damage,
                defense: 0,
                detection_radius,
                attack_range,
                attack_cooldown: Duration::from_millis(cooldown_ms),
                experience_reward,
            },
        }
    }

    /// Edge lengths of the archetype's bounding box.
    #[must_use]
    pub const fn bounding_box(&self) -> Size {
        Size::square(self.size)
    }
}

/// Statistics for every archetype, keyed by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeTable {
    /// Goblin profile.
    pub goblin: ArchetypeTuning,
    /// Skeleton profile.
    pub skeleton: ArchetypeTuning,
    /// Spider profile.
    pub spider: ArchetypeTuning,
    /// Troll profile.
    pub troll: ArchetypeTuning,
}

impl ArchetypeTable {
    /// Profile configured for the archetype.
    #[must_use]
    pub const fn get(&self, archetype: Archetype) -> &ArchetypeTuning {
        match archetype {
            Archetype::Goblin => &self.goblin,
            Archetype::Skeleton => &self.skeleton,
            Archetype::Spider => &self.spider,
            Archetype::Troll => &self.troll,
        }
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self {
            goblin: ArchetypeTuning::new(24.0, 50, 15, 1.5, 120.0, 30.0, 1_000, 25),
            skeleton: ArchetypeTuning::new(27.0, 75, 20, 2.0, 150.0, 36.0, 800, 35),
            spider: ArchetypeTuning::new(21.0, 30, 10, 2.5, 90.0, 24.0, 600, 15),
            troll: ArchetypeTuning::new(36.0, 150, 35, 0.8, 180.0, 45.0, 1_500, 75),
        }
    }
}

/// Timing constants for each behaviour strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Wandering strategy.
    pub random: RandomTuning,
    /// Waypoint strategy.
    pub patrol: PatrolTuning,
    /// Anchored strategy.
    pub guard: GuardTuning,
    /// Pursuing strategy.
    pub aggressive: AggressiveTuning,
}

/// Wandering strategy parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomTuning {
    /// How long a heading is held before a new one is drawn.
    #[serde(rename = "direction_interval_ms", with = "millis")]
    pub direction_interval: Duration,
    /// Throttle between two movement rolls.
    #[serde(rename = "movement_check_interval_ms", with = "millis")]
    pub movement_check_interval: Duration,
    /// Chance that a movement roll produces a step.
    pub movement_probability: f64,
    /// Step target distance as a multiple of the agent's speed.
    pub step_multiplier: f32,
    /// Displacement below which a step counts as blocked.
    pub stuck_threshold: f32,
    /// Chance that a blocked agent reverses instead of drawing a new heading.
    pub reverse_probability: f64,
}

impl Default for RandomTuning {
    fn default() -> Self {
        Self {
            direction_interval: Duration::from_millis(2_000),
            movement_check_interval: Duration::from_millis(100),
            movement_probability: 0.8,
            step_multiplier: 2.0,
            stuck_threshold: 0.1,
            reverse_probability: 0.5,
        }
    }
}

/// Waypoint strategy parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolTuning {
    /// Number of waypoints placed around the centre.
    pub point_count: u32,
    /// Pause at each waypoint.
    #[serde(rename = "wait_time_ms", with = "millis")]
    pub wait_time: Duration,
    /// Nominal distance of the waypoints from the centre.
    pub radius: f32,
    /// Smallest fraction of the radius a jittered waypoint may use.
    pub jitter_floor: f32,
    /// Distance under which a waypoint counts as reached.
    pub arrival_distance: f32,
}

impl Default for PatrolTuning {
    fn default() -> Self {
        Self {
            point_count: 3,
            wait_time: Duration::from_millis(2_000),
            radius: 150.0,
            jitter_floor: 0.5,
            arrival_distance: 10.0,
        }
    }
}

/// Anchored strategy parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardTuning {
    /// Largest target-to-anchor distance the guard still engages.
    pub leash_distance: f32,
    /// Self-to-anchor distance beyond which the guard walks home.
    pub return_threshold: f32,
}

impl Default for GuardTuning {
    fn default() -> Self {
        Self {
            leash_distance: 100.0,
            return_threshold: 20.0,
        }
    }
}

/// Pursuing strategy parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggressiveTuning {
    /// How long the last known position is pursued after losing sight.
    #[serde(rename = "search_time_ms", with = "millis")]
    pub search_time: Duration,
    /// Distance under which the last known position counts as reached.
    pub arrival_distance: f32,
}

impl Default for AggressiveTuning {
    fn default() -> Self {
        Self {
            search_time: Duration::from_millis(5_000),
            arrival_distance: 20.0,
        }
    }
}

/// Weighted archetype and strategy pairing available to the planner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnWeight {
    /// Archetype spawned when the entry is drawn.
    pub archetype: Archetype,
    /// Strategy attached when the entry is drawn.
    pub ai: AiKind,
    /// Relative weight; entries are drawn proportionally.
    pub weight: f32,
}

impl SpawnWeight {
    /// Creates a new weighted entry.
    #[must_use]
    pub const fn new(archetype: Archetype, ai: AiKind, weight: f32) -> Self {
        Self {
            archetype,
            ai,
            weight,
        }
    }
}

/// Population planner parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Chance that a room centre receives enemies.
    pub room_chance: f64,
    /// Chance that a sampled corridor cell receives an enemy.
    pub path_chance: f64,
    /// Most enemies placed around one room centre.
    pub max_per_room: u32,
    /// Smallest Euclidean distance between a spawn and the start position, in pixels.
    pub min_distance_from_start: f32,
    /// Fraction of corridor cells considered as spawn candidates.
    pub path_sample_fraction: f32,
    /// Room centres closer than this many tiles on both axes collapse into one.
    pub room_center_separation: i32,
    /// Half-width, in tiles, of the square around a room centre used for scatter.
    pub room_scatter_tiles: f32,
    /// Archetype and strategy table.
    pub table: Vec<SpawnWeight>,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            room_chance: 0.7,
            path_chance: 0.2,
            max_per_room: 3,
            min_distance_from_start: 225.0,
            path_sample_fraction: 0.1,
            room_center_separation: 3,
            room_scatter_tiles: 1.0,
            table: vec![
                SpawnWeight::new(Archetype::Goblin, AiKind::Random, 0.4),
                SpawnWeight::new(Archetype::Goblin, AiKind::Patrol, 0.3),
                SpawnWeight::new(Archetype::Skeleton, AiKind::Aggressive, 0.2),
                SpawnWeight::new(Archetype::Skeleton, AiKind::Guard, 0.2),
                SpawnWeight::new(Archetype::Spider, AiKind::Random, 0.3),
                SpawnWeight::new(Archetype::Spider, AiKind::Patrol, 0.2),
                SpawnWeight::new(Archetype::Troll, AiKind::Guard, 0.1),
                SpawnWeight::new(Archetype::Troll, AiKind::Aggressive, 0.1),
            ],
        }
    }
}

/// Tick cadence and corpse lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationTuning {
    /// Target number of ticks per simulated second.
    pub target_fps: u32,
    /// How long a dead enemy stays in the live set before removal.
    #[serde(rename = "corpse_grace_ms", with = "millis")]
    pub corpse_grace: Duration,
}

impl SimulationTuning {
    /// Fixed time quantum of one tick.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

impl Default for SimulationTuning {
    fn default() -> Self {
        Self {
            target_fps: 60,
            corpse_grace: Duration::from_millis(5_000),
        }
    }
}

pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
