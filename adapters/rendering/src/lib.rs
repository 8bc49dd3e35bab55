#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Delve adapters.
//!
//! The simulation never draws. Adapters copy world snapshots into a
//! [`Scene`] and hand it to a [`RenderingBackend`]. The crate ships a
//! terminal backend, [`AsciiBackend`], used by the headless binary.

use std::{fmt::Write as _, io, time::Duration};

use anyhow::{Context, Result as AnyResult};
use delve_core::{AgentId, AgentKind, AiState, Archetype, CellCoord, CellType, Grid, Size};
use glam::Vec2;
use thiserror::Error;

/// Describes the square tile grid the scene is laid out on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in pixels.
    pub tile_length: f32,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when `tile_length` is not a positive finite number.
    pub fn new(columns: u32, rows: u32, tile_length: f32) -> Result<Self, RenderingError> {
        if !tile_length.is_finite() || tile_length <= 0.0 {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
        })
    }

    /// Calculates the total width of the grid in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Tile containing the pixel-space point, if it lies on the grid.
    #[must_use]
    pub fn tile_at(&self, point: Vec2) -> Option<CellCoord> {
        if !(point.x.is_finite() && point.y.is_finite()) || point.x < 0.0 || point.y < 0.0 {
            return None;
        }

        let column = (point.x / self.tile_length).floor() as u32;
        let row = (point.y / self.tile_length).floor() as u32;
        if column >= self.columns || row >= self.rows {
            return None;
        }

        Some(CellCoord::new(column as i32, row as i32))
    }
}

/// Immutable snapshot describing one agent within the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentPresentation {
    /// Identifier allocated to the agent by the world.
    pub id: AgentId,
    /// Player or enemy archetype.
    pub kind: AgentKind,
    /// Upper-left corner of the bounding box in pixels.
    pub position: Vec2,
    /// Bounding box extents in pixels.
    pub size: Size,
    /// Current health.
    pub health: u32,
    /// Health the agent spawned with.
    pub max_health: u32,
    /// Behaviour state, absent for the player.
    pub state: Option<AiState>,
}

impl AgentPresentation {
    /// Centre of the bounding box in pixels.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.size.as_vec2() / 2.0
    }

    /// Whether the agent still has health.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Remaining health as a fraction of the maximum, for health bars.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        (self.health as f32 / self.max_health as f32).clamp(0.0, 1.0)
    }
}

/// Scene description combining the static level with its inhabitants.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid that composes the level.
    pub tile_grid: TileGridPresentation,
    /// Cell types in row-major order.
    pub cells: Vec<CellType>,
    /// Agents currently in the world, corpses included.
    pub agents: Vec<AgentPresentation>,
    /// Simulation time the snapshot was taken at.
    pub clock: Duration,
}

impl Scene {
    /// Creates an empty scene over `grid`.
    pub fn new(grid: &Grid, tile_length: f32) -> Result<Self, RenderingError> {
        let tile_grid = TileGridPresentation::new(grid.width(), grid.height(), tile_length)?;
        Ok(Self {
            tile_grid,
            cells: grid.cells().map(|cell| cell.cell_type()).collect(),
            agents: Vec::new(),
            clock: Duration::ZERO,
        })
    }

    /// Cell type at `coord`, treating positions off the grid as walls.
    #[must_use]
    pub fn cell_type(&self, coord: CellCoord) -> CellType {
        let (Ok(column), Ok(row)) = (u32::try_from(coord.column()), u32::try_from(coord.row())) else {
            return CellType::Wall;
        };
        if column >= self.tile_grid.columns || row >= self.tile_grid.rows {
            return CellType::Wall;
        }

        let index = row as usize * self.tile_grid.columns as usize + column as usize;
        self.cells.get(index).copied().unwrap_or(CellType::Wall)
    }

    /// The player's snapshot, if the scene carries one.
    #[must_use]
    pub fn player(&self) -> Option<&AgentPresentation> {
        self.agents
            .iter()
            .find(|agent| agent.kind == AgentKind::Player)
    }
}

/// Rectangular range of tiles selected for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    /// Upper-left tile of the window.
    pub origin: CellCoord,
    /// Number of columns shown.
    pub columns: u32,
    /// Number of rows shown.
    pub rows: u32,
}

impl Window {
    /// Window covering the whole grid.
    #[must_use]
    pub fn full(grid: &TileGridPresentation) -> Self {
        Self {
            origin: CellCoord::new(0, 0),
            columns: grid.columns,
            rows: grid.rows,
        }
    }

    /// Window of at most `columns`×`rows` tiles centred on `focus`, shifted to stay on the grid.
    #[must_use]
    pub fn centered(grid: &TileGridPresentation, focus: CellCoord, columns: u32, rows: u32) -> Self {
        let columns = columns.min(grid.columns);
        let rows = rows.min(grid.rows);
        let axis = |center: i32, span: u32, limit: u32| {
            let start = center - (span / 2) as i32;
            start.clamp(0, (limit - span) as i32)
        };

        Self {
            origin: CellCoord::new(
                axis(focus.column(), columns, grid.columns),
                axis(focus.row(), rows, grid.rows),
            ),
            columns,
            rows,
        }
    }

    fn contains(&self, coord: CellCoord) -> bool {
        let column = coord.column() - self.origin.column();
        let row = coord.row() - self.origin.row();
        column >= 0 && row >= 0 && (column as u32) < self.columns && (row as u32) < self.rows
    }
}

/// Rendering backend capable of presenting Delve scenes.
pub trait RenderingBackend {
    /// Presents one frame of the scene.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;
}

/// Terminal backend that prints each frame as text.
///
/// Tiles use one character each; an agent is drawn on the tile holding the
/// centre of its bounding box. Enemies in pursuit are drawn in upper case.
#[derive(Debug)]
pub struct AsciiBackend<W> {
    writer: W,
    viewport: Option<(u32, u32)>,
}

impl<W: io::Write> AsciiBackend<W> {
    /// Creates a backend writing whole-grid frames to `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            viewport: None,
        }
    }

    /// Limits frames to a `columns`×`rows` window that follows the player.
    #[must_use]
    pub const fn with_viewport(mut self, columns: u32, rows: u32) -> Self {
        self.viewport = Some((columns, rows));
        self
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn window(&self, scene: &Scene) -> Window {
        let Some((columns, rows)) = self.viewport else {
            return Window::full(&scene.tile_grid);
        };

        let focus = scene
            .player()
            .and_then(|player| scene.tile_grid.tile_at(player.center()))
            .unwrap_or_else(|| CellCoord::new(0, 0));
        Window::centered(&scene.tile_grid, focus, columns, rows)
    }
}

impl<W: io::Write> RenderingBackend for AsciiBackend<W> {
    fn present(&mut self, scene: &Scene) -> AnyResult<()> {
        let frame = render_frame(scene, self.window(scene));
        self.writer
            .write_all(frame.as_bytes())
            .context("failed to write frame")?;
        self.writer.flush().context("failed to flush frame")
    }
}

/// Renders the window of the scene as newline-terminated rows of glyphs.
#[must_use]
pub fn render_frame(scene: &Scene, window: Window) -> String {
    let mut canvas: Vec<Vec<char>> = (0..window.rows)
        .map(|row| {
            (0..window.columns)
                .map(|column| {
                    let coord = window.origin.offset(column as i32, row as i32);
                    tile_glyph(scene.cell_type(coord))
                })
                .collect()
        })
        .collect();

    // Corpses first so the living are drawn over them, the player last.
    let mut agents: Vec<&AgentPresentation> = scene.agents.iter().collect();
    agents.sort_by_key(|agent| (agent.kind == AgentKind::Player, agent.is_alive()));
    for agent in agents {
        let Some(tile) = scene.tile_grid.tile_at(agent.center()) else {
            continue;
        };
        if !window.contains(tile) {
            continue;
        }

        let column = (tile.column() - window.origin.column()) as usize;
        let row = (tile.row() - window.origin.row()) as usize;
        canvas[row][column] = agent_glyph(agent);
    }

    let mut frame = String::with_capacity(canvas.len() * (window.columns as usize + 1));
    for row in canvas {
        frame.extend(row);
        frame.push('\n');
    }
    frame
}

/// One-line census printed beneath a frame.
#[must_use]
pub fn status_line(scene: &Scene) -> String {
    let mut line = format!("t={:.1}s", scene.clock.as_secs_f32());
    if let Some(player) = scene.player() {
        let _ = write!(line, " hp={}/{}", player.health, player.max_health);
    }

    let enemies = scene
        .agents
        .iter()
        .filter(|agent| matches!(agent.kind, AgentKind::Enemy(_)));
    let (alive, dead) = enemies.fold((0usize, 0usize), |(alive, dead), agent| {
        if agent.is_alive() {
            (alive + 1, dead)
        } else {
            (alive, dead + 1)
        }
    });
    let _ = write!(line, " enemies={alive} corpses={dead}");
    line
}

/// Glyph used for a tile.
#[must_use]
pub const fn tile_glyph(cell: CellType) -> char {
    match cell {
        CellType::Wall => '#',
        CellType::RoomWall => '%',
        CellType::Path => '.',
        CellType::Room => ',',
        CellType::Start => 'S',
        CellType::End => 'E',
    }
}

/// Glyph used for an agent.
#[must_use]
pub fn agent_glyph(agent: &AgentPresentation) -> char {
    let archetype = match agent.kind {
        AgentKind::Player => return if agent.is_alive() { '@' } else { '&' },
        AgentKind::Enemy(archetype) => archetype,
    };
    if !agent.is_alive() {
        return '_';
    }

    let glyph = match archetype {
        Archetype::Goblin => 'g',
        Archetype::Skeleton => 's',
        Archetype::Spider => 'x',
        Archetype::Troll => 't',
    };
    match agent.state {
        Some(AiState::Chasing | AiState::Attacking) => glyph.to_ascii_uppercase(),
        _ => glyph,
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, Error, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive finite side length.
    #[error("tile length must be positive (received {tile_length})")]
    InvalidTileLength {
        /// Provided length that failed validation.
        tile_length: f32,
    },
}
