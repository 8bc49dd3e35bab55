#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Delve dungeon simulation.
//!
//! This crate defines the tile model produced by the dungeon generator and
//! the message surface that connects adapters, the authoritative world, and
//! systems. Adapters submit [`Command`] values describing desired mutations,
//! the world executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] values for systems to react to deterministically.

pub mod config;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Smallest grid edge, in tiles, that still fits a border and a carved path.
pub const MIN_GRID_EDGE: u32 = 5;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by one fixed tick.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Replaces the movement intent supplied by the input collaborator.
    SetPlayerIntent {
        /// Desired direction; each component is expected in `-1.0..=1.0`.
        intent: Vec2,
    },
    /// Requests that the player swing at every enemy within reach.
    PlayerAttack,
    /// Requests that a new enemy join the live set.
    SpawnEnemy {
        /// Archetype that determines the enemy's stats and size.
        archetype: Archetype,
        /// Behaviour strategy that will drive the enemy.
        ai: AiKind,
        /// Top-left corner of the enemy's bounding box in pixels.
        position: Vec2,
    },
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy was created.
    EnemySpawned {
        /// Identifier assigned to the new enemy.
        agent: AgentId,
        /// Archetype of the new enemy.
        archetype: Archetype,
        /// Strategy requested for the new enemy.
        ai: AiKind,
        /// Top-left corner of the enemy's bounding box in pixels.
        position: Vec2,
    },
    /// Reports that an attack landed.
    AgentDamaged {
        /// Agent that performed the attack.
        attacker: AgentId,
        /// Agent that received the damage.
        target: AgentId,
        /// Health removed after defense was applied.
        amount: u32,
        /// Health remaining on the target.
        remaining: u32,
    },
    /// Reports that an agent's health reached zero.
    AgentDied {
        /// Agent that died.
        agent: AgentId,
        /// Experience granted to whoever collects the reward.
        experience_reward: u32,
    },
    /// Reports that a dead agent left the live set after its grace period.
    AgentRemoved {
        /// Agent that was removed.
        agent: AgentId,
    },
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
///
/// Coordinates are signed so that out-of-bounds queries left of or above the
/// grid can be expressed and answered as walls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the coordinate shifted by the provided deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(self.column + columns, self.row + rows)
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Cardinal neighbours in north, east, south, west order.
    #[must_use]
    pub const fn cardinal_neighbors(self) -> [CellCoord; 4] {
        [
            self.offset(0, -1),
            self.offset(1, 0),
            self.offset(0, 1),
            self.offset(-1, 0),
        ]
    }
}

/// Tile taxonomy produced by the dungeon generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    /// Solid rock.
    Wall,
    /// Corridor carved by the maze or by room connections.
    Path,
    /// Entry cell where the player appears.
    Start,
    /// Exit cell of the dungeon.
    End,
    /// Open floor inside a room.
    Room,
    /// Solid perimeter surrounding a room.
    RoomWall,
}

impl CellType {
    /// Reports whether agents may stand on tiles of this type.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Path | Self::Room | Self::Start | Self::End)
    }

    /// Reports whether tiles of this type block movement.
    #[must_use]
    pub const fn is_wall(self) -> bool {
        !self.is_walkable()
    }
}

/// Immutable value describing a single tile of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    coord: CellCoord,
    cell_type: CellType,
    visited: bool,
    floor_variant: Option<u8>,
}

impl Cell {
    /// Creates a cell without a decorative floor variant.
    #[must_use]
    pub const fn new(coord: CellCoord, cell_type: CellType, visited: bool) -> Self {
        Self {
            coord,
            cell_type,
            visited,
            floor_variant: None,
        }
    }

    /// Returns a copy of the cell carrying the provided floor variant.
    #[must_use]
    pub const fn with_floor_variant(self, variant: u8) -> Self {
        Self {
            floor_variant: Some(variant),
            ..self
        }
    }

    /// Location of the cell within the grid.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Type tag of the cell.
    #[must_use]
    pub const fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Whether maze carving reached this cell. Only meaningful during generation.
    #[must_use]
    pub const fn visited(&self) -> bool {
        self.visited
    }

    /// Decorative floor tag consumed by renderers.
    #[must_use]
    pub const fn floor_variant(&self) -> Option<u8> {
        self.floor_variant
    }
}

/// Rectangular array of cells stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid where every cell carries the provided type and is unvisited.
    #[must_use]
    pub fn filled(width: u32, height: u32, cell_type: CellType) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for column in 0..width {
                let coord = CellCoord::new(column as i32, row as i32);
                cells.push(Cell::new(coord, cell_type, false));
            }
        }

        Self {
            width,
            height,
            cells,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub fn contains(&self, coord: CellCoord) -> bool {
        self.index(coord).is_some()
    }

    /// Returns the cell stored at the coordinate, if it lies inside the grid.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.index(coord).and_then(|index| self.cells.get(index))
    }

    /// Returns the type of the cell stored at the coordinate, if any.
    #[must_use]
    pub fn cell_type(&self, coord: CellCoord) -> Option<CellType> {
        self.cell(coord).map(Cell::cell_type)
    }

    /// Replaces the cell located at the replacement's own coordinate.
    ///
    /// Replacements outside the grid are ignored.
    pub fn replace(&mut self, cell: Cell) {
        if let Some(index) = self.index(cell.coord()) {
            self.cells[index] = cell;
        }
    }

    /// Sets the type of a cell and marks it visited.
    pub fn carve(&mut self, coord: CellCoord, cell_type: CellType) {
        self.replace(Cell::new(coord, cell_type, true));
    }

    /// Iterator over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Coordinate of the first cell of the provided type in row-major order.
    #[must_use]
    pub fn find_first(&self, cell_type: CellType) -> Option<CellCoord> {
        self.cells
            .iter()
            .find(|cell| cell.cell_type() == cell_type)
            .map(Cell::coord)
    }

    /// Number of cells of the provided type.
    #[must_use]
    pub fn count(&self, cell_type: CellType) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.cell_type() == cell_type)
            .count()
    }

    fn index(&self, coord: CellCoord) -> Option<usize> {
        let column = u32::try_from(coord.column()).ok()?;
        let row = u32::try_from(coord.row()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Axis-aligned room footprint used while generating a dungeon.
///
/// The footprint includes the perimeter; interior cells exclude it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    origin: CellCoord,
    width: i32,
    height: i32,
}

impl Room {
    /// Creates a room anchored at the provided upper-left cell.
    #[must_use]
    pub const fn new(origin: CellCoord, width: i32, height: i32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Upper-left perimeter cell of the room.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Footprint width in cells, perimeter included.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Footprint height in cells, perimeter included.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Returns the footprint grown by `buffer` cells on every side.
    #[must_use]
    pub const fn expanded(&self, buffer: i32) -> Self {
        Self {
            origin: self.origin.offset(-buffer, -buffer),
            width: self.width + 2 * buffer,
            height: self.height + 2 * buffer,
        }
    }

    /// Reports whether two footprints share at least one cell.
    #[must_use]
    pub const fn overlaps(&self, other: &Room) -> bool {
        self.origin.column() < other.origin.column() + other.width
            && other.origin.column() < self.origin.column() + self.width
            && self.origin.row() < other.origin.row() + other.height
            && other.origin.row() < self.origin.row() + self.height
    }

    /// Reports whether the coordinate lies within the footprint.
    #[must_use]
    pub const fn contains(&self, coord: CellCoord) -> bool {
        coord.column() >= self.origin.column()
            && coord.column() < self.origin.column() + self.width
            && coord.row() >= self.origin.row()
            && coord.row() < self.origin.row() + self.height
    }

    /// Reports whether the coordinate lies on the footprint's outer ring.
    #[must_use]
    pub const fn is_perimeter(&self, coord: CellCoord) -> bool {
        self.contains(coord)
            && (coord.column() == self.origin.column()
                || coord.column() == self.origin.column() + self.width - 1
                || coord.row() == self.origin.row()
                || coord.row() == self.origin.row() + self.height - 1)
    }

    /// Every cell of the footprint in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.height).flat_map(move |row| {
            (0..self.width).map(move |column| self.origin.offset(column, row))
        })
    }
}

/// Width and height of an axis-aligned bounding box in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent in pixels.
    pub width: f32,
    /// Vertical extent in pixels.
    pub height: f32,
}

impl Size {
    /// Creates a new size descriptor.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Creates a square size descriptor.
    #[must_use]
    pub const fn square(edge: f32) -> Self {
        Self::new(edge, edge)
    }

    /// Size expressed as a vector.
    #[must_use]
    pub const fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Combat and movement statistics carried by an agent. All values are non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Maximum health.
    pub health: u32,
    /// Distance travelled per movement step, in pixels.
    pub speed: f32,
    /// Raw damage dealt by a successful attack.
    pub damage: u32,
    /// Damage subtracted from every hit received.
    #[serde(default)]
    pub defense: u32,
    /// Distance within which the agent notices a target.
    pub detection_radius: f32,
    /// Distance within which the agent may attack.
    pub attack_range: f32,
    /// Minimum simulated time between two attacks.
    #[serde(rename = "attack_cooldown_ms", with = "crate::config::millis")]
    pub attack_cooldown: Duration,
    /// Experience granted when the agent dies.
    #[serde(default)]
    pub experience_reward: u32,
}

/// Enemy archetypes with distinct stat profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Quick, fragile melee enemy.
    Goblin,
    /// Sturdier mid-tier melee enemy.
    Skeleton,
    /// Fast, fragile enemy with a short reach.
    Spider,
    /// Slow, heavy-hitting brute.
    Troll,
}

impl Archetype {
    /// Every archetype in declaration order.
    pub const ALL: [Archetype; 4] = [Self::Goblin, Self::Skeleton, Self::Spider, Self::Troll];

    /// Lower-case name of the archetype.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Goblin => "goblin",
            Self::Skeleton => "skeleton",
            Self::Spider => "spider",
            Self::Troll => "troll",
        }
    }
}

/// Behaviour strategies that can drive an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiKind {
    /// Wanders in random directions.
    Random,
    /// Cycles through waypoints around a centre.
    Patrol,
    /// Holds an anchor and only engages targets close to it.
    Guard,
    /// Pursues relentlessly and searches after losing sight.
    Aggressive,
}

impl AiKind {
    /// Reports whether the strategy suits enemies placed inside rooms.
    #[must_use]
    pub const fn is_room_appropriate(self) -> bool {
        matches!(self, Self::Guard | Self::Patrol)
    }

    /// Reports whether the strategy suits enemies placed along corridors.
    #[must_use]
    pub const fn is_path_appropriate(self) -> bool {
        matches!(self, Self::Random | Self::Aggressive)
    }
}

/// Observable state of a behaviour strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    /// Standing still.
    #[default]
    Idle,
    /// Moving without a target in sight.
    Patrolling,
    /// Moving toward a target or its last known position.
    Chasing,
    /// Swinging at a target in reach.
    Attacking,
    /// The owning agent has no health left.
    Dead,
}

/// Distinguishes the player from enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentKind {
    /// The player-controlled agent.
    Player,
    /// An autonomous enemy of the given archetype.
    Enemy(Archetype),
}
