#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural dungeon generator combining a backtracking maze with rooms.
//!
//! Generation runs in fixed phases over a grid that starts as solid wall:
//! maze carving on the odd sub-grid, room placement, room-to-maze
//! connection, start and end marking, and finally decorative floor tags.
//! Every random choice is drawn from the caller's RNG so the same seed
//! always yields the same grid.

use delve_core::{config::RoomTuning, Cell, CellCoord, CellType, Grid, Room, MIN_GRID_EDGE};
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

const MAZE_STEPS: [(i32, i32); 4] = [(-2, 0), (2, 0), (0, -2), (0, 2)];
const CARDINALS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const FLOOR_VARIANTS: u8 = 4;

/// Failures raised before any carving starts.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The grid cannot fit a border around a carved corridor.
    #[error("grid of {width}x{height} tiles is smaller than the 5x5 minimum")]
    DimensionsTooSmall {
        /// Requested column count.
        width: u32,
        /// Requested row count.
        height: u32,
    },
    /// The grid cannot be addressed with signed tile coordinates.
    #[error("grid of {width}x{height} tiles exceeds the addressable range")]
    DimensionsTooLarge {
        /// Requested column count.
        width: u32,
        /// Requested row count.
        height: u32,
    },
}

/// Finished dungeon: the grid plus the rooms accepted while building it.
#[derive(Clone, Debug)]
pub struct Dungeon {
    grid: Grid,
    rooms: Vec<Room>,
}

impl Dungeon {
    /// Generated grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Room footprints accepted by the placement pass.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Consumes the dungeon, yielding the grid.
    #[must_use]
    pub fn into_grid(self) -> Grid {
        self.grid
    }
}

/// Stateless generator parameterised by room tuning.
#[derive(Clone, Debug, Default)]
pub struct DungeonGenerator {
    rooms: RoomTuning,
}

impl DungeonGenerator {
    /// Creates a generator using the provided room parameters.
    #[must_use]
    pub const fn new(rooms: RoomTuning) -> Self {
        Self { rooms }
    }

    /// Builds a `width × height` dungeon drawing every random choice from `rng`.
    pub fn generate<R>(&self, width: u32, height: u32, rng: &mut R) -> Result<Dungeon, GenerationError>
    where
        R: Rng + ?Sized,
    {
        if width < MIN_GRID_EDGE || height < MIN_GRID_EDGE {
            return Err(GenerationError::DimensionsTooSmall { width, height });
        }
        let (Ok(columns), Ok(rows)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(GenerationError::DimensionsTooLarge { width, height });
        };
        if usize::try_from(width)
            .ok()
            .and_then(|w| w.checked_mul(usize::try_from(height).ok()?))
            .is_none()
        {
            return Err(GenerationError::DimensionsTooLarge { width, height });
        }

        let mut grid = Grid::filled(width, height, CellType::Wall);
        carve_maze(&mut grid, columns, rows, rng);
        let rooms = self.place_rooms(&mut grid, columns, rows, rng);
        self.connect_rooms(&mut grid, &rooms, rng);

        let start = CellCoord::new(1, 1);
        let end = CellCoord::new(columns - 2, rows - 2);
        grid.carve(start, CellType::Start);
        grid.carve(end, CellType::End);
        link_end(&mut grid, end);
        scatter_floor_variants(&mut grid, rng);

        tracing::debug!(width, height, rooms = rooms.len(), "dungeon generated");
        Ok(Dungeon { grid, rooms })
    }

    fn place_rooms<R>(&self, grid: &mut Grid, columns: i32, rows: i32, rng: &mut R) -> Vec<Room>
    where
        R: Rng + ?Sized,
    {
        let tuning = &self.rooms;
        let sizes: Vec<i32> = (tuning.min_size..=tuning.max_size)
            .filter_map(|size| i32::try_from(size).ok())
            .filter(|size| size % 2 == 1 && *size >= 3)
            .collect();
        if sizes.is_empty() || tuning.min_count > tuning.max_count {
            tracing::debug!("room tuning admits no room shape");
            return Vec::new();
        }

        let target = rng.gen_range(tuning.min_count..=tuning.max_count) as usize;
        let attempts = target.saturating_mul(tuning.attempts_per_room as usize);
        let mut rooms: Vec<Room> = Vec::with_capacity(target);

        for _ in 0..attempts {
            if rooms.len() >= target {
                break;
            }

            let Some(&room_width) = sizes.choose(rng) else {
                break;
            };
            let Some(&room_height) = sizes.choose(rng) else {
                break;
            };
            let Some(column) = odd_origin(tuning.margin, columns - tuning.margin - room_width, rng) else {
                continue;
            };
            let Some(row) = odd_origin(tuning.margin, rows - tuning.margin - room_height, rng) else {
                continue;
            };

            let candidate = Room::new(CellCoord::new(column, row), room_width, room_height);
            let padded = candidate.expanded(tuning.buffer);
            if rooms
                .iter()
                .any(|room| room.expanded(tuning.buffer).overlaps(&padded))
            {
                continue;
            }

            stamp_room(grid, &candidate);
            rooms.push(candidate);
        }

        tracing::debug!(target, placed = rooms.len(), "room placement finished");
        rooms
    }

    fn connect_rooms<R>(&self, grid: &mut Grid, rooms: &[Room], rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let tuning = &self.rooms;
        let (fewest, most) = (
            tuning.min_openings.min(tuning.max_openings),
            tuning.min_openings.max(tuning.max_openings),
        );

        for room in rooms {
            let mut candidates: Vec<CellCoord> = room
                .cells()
                .filter(|cell| room.is_perimeter(*cell) && !is_corner(room, *cell))
                .filter(|cell| grid.cell_type(*cell) == Some(CellType::RoomWall))
                .collect();
            candidates.shuffle(rng);

            let openings = rng.gen_range(fewest..=most) as usize;
            let mut linked = touches_corridor(grid, room);
            for opening in candidates.into_iter().take(openings) {
                grid.carve(opening, CellType::Path);
                linked |= link_to_corridor(grid, room, opening, tuning.connection_search);
            }

            if !linked {
                tracing::debug!(
                    column = room.origin().column(),
                    row = room.origin().row(),
                    "room left disconnected"
                );
            }
        }
    }
}

/// Recursive backtracker over the odd sub-grid starting at `(1, 1)`.
fn carve_maze<R>(grid: &mut Grid, columns: i32, rows: i32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let origin = CellCoord::new(1, 1);
    grid.carve(origin, CellType::Path);
    let mut stack = vec![origin];

    while let Some(&current) = stack.last() {
        let neighbors: Vec<CellCoord> = MAZE_STEPS
            .iter()
            .map(|&(dx, dy)| current.offset(dx, dy))
            .filter(|next| {
                next.column() > 0
                    && next.row() > 0
                    && next.column() < columns - 1
                    && next.row() < rows - 1
                    && grid.cell(*next).is_some_and(|cell| !cell.visited())
            })
            .collect();

        let Some(&next) = neighbors.choose(rng) else {
            let _ = stack.pop();
            continue;
        };

        let between = CellCoord::new(
            (current.column() + next.column()) / 2,
            (current.row() + next.row()) / 2,
        );
        grid.carve(between, CellType::Path);
        grid.carve(next, CellType::Path);
        stack.push(next);
    }
}

/// Draws an odd value in `[low, high]`, if one exists.
fn odd_origin<R>(low: i32, high: i32, rng: &mut R) -> Option<i32>
where
    R: Rng + ?Sized,
{
    let first = if low % 2 == 0 { low + 1 } else { low };
    let last = if high % 2 == 0 { high - 1 } else { high };
    if first > last {
        return None;
    }

    let steps = (last - first) / 2;
    Some(first + 2 * rng.gen_range(0..=steps))
}

/// Converts a footprint into Room floor ringed by RoomWall.
///
/// Perimeter walls only replace solid Wall so carved corridors stay open.
fn stamp_room(grid: &mut Grid, room: &Room) {
    for coord in room.cells() {
        let Some(cell) = grid.cell(coord).copied() else {
            continue;
        };

        if room.is_perimeter(coord) {
            if cell.cell_type() == CellType::Wall {
                grid.replace(Cell::new(coord, CellType::RoomWall, cell.visited()));
            }
        } else {
            grid.replace(Cell::new(coord, CellType::Room, cell.visited()));
        }
    }
}

fn is_corner(room: &Room, cell: CellCoord) -> bool {
    let origin = room.origin();
    let far_column = origin.column() + room.width() - 1;
    let far_row = origin.row() + room.height() - 1;
    (cell.column() == origin.column() || cell.column() == far_column)
        && (cell.row() == origin.row() || cell.row() == far_row)
}

/// Walks outward from an opening and carves a straight corridor to the first maze cell found.
fn link_to_corridor(grid: &mut Grid, room: &Room, opening: CellCoord, reach: i32) -> bool {
    for (dx, dy) in CARDINALS {
        let mut route = Vec::new();
        for step in 1..=reach {
            let cell = opening.offset(dx * step, dy * step);
            if room.contains(cell) {
                break;
            }

            match grid.cell(cell).map(|cell| (cell.cell_type(), cell.visited())) {
                Some((CellType::Path, true)) => {
                    for coord in route {
                        grid.carve(coord, CellType::Path);
                    }
                    return true;
                }
                Some((CellType::Wall, _)) => route.push(cell),
                _ => break,
            }
        }
    }

    false
}

fn touches_corridor(grid: &Grid, room: &Room) -> bool {
    room.cells()
        .filter(|cell| room.is_perimeter(*cell) && !is_corner(room, *cell))
        .any(|cell| grid.cell_type(cell) == Some(CellType::Path))
}

/// Joins the end cell to the nearest maze node when even dimensions push it off the odd sub-grid.
fn link_end(grid: &mut Grid, end: CellCoord) {
    let snap = |value: i32| if value % 2 == 1 { value } else { value - 1 };
    let node = CellCoord::new(snap(end.column()), snap(end.row()));
    if node == end {
        return;
    }

    let elbow = CellCoord::new(node.column(), end.row());
    for coord in [elbow, node] {
        if grid.cell_type(coord).is_some_and(CellType::is_wall) {
            grid.carve(coord, CellType::Path);
        }
    }
}

fn scatter_floor_variants<R>(grid: &mut Grid, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let walkable: Vec<Cell> = grid
        .cells()
        .filter(|cell| cell.cell_type().is_walkable())
        .copied()
        .collect();

    for cell in walkable {
        grid.replace(cell.with_floor_variant(rng.gen_range(0..FLOOR_VARIANTS)));
    }
}
