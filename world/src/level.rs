//! Pixel-space and tile-space queries over a generated grid.

use delve_core::{CellCoord, CellType, Grid};
use glam::Vec2;
use thiserror::Error;

/// Failures raised when a grid breaks the generator's guarantees.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    /// The row-major scan found no start cell.
    #[error("level grid contains no start cell")]
    StartNotFound,
}

/// Read-only query surface wrapping a generated grid.
///
/// Pixel coordinates map to tiles through floor division by the tile size.
/// Every query that falls outside the grid answers as if it hit a wall.
#[derive(Clone, Debug)]
pub struct Level {
    grid: Grid,
    tile_size: f32,
}

impl Level {
    /// Wraps the provided grid using tiles of `tile_size` pixels.
    #[must_use]
    pub fn new(grid: Grid, tile_size: f32) -> Self {
        Self { grid, tile_size }
    }

    /// Underlying tile grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Edge length of a tile in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Tile that contains the pixel, or `None` for non-finite input.
    #[must_use]
    pub fn tile_at(&self, point: Vec2) -> Option<CellCoord> {
        if self.tile_size.is_nan() || self.tile_size <= 0.0 {
            return None;
        }

        let column = (point.x / self.tile_size).floor();
        let row = (point.y / self.tile_size).floor();
        if !column.is_finite() || !row.is_finite() {
            return None;
        }

        Some(CellCoord::new(column as i32, row as i32))
    }

    /// Pixel position of the tile's upper-left corner.
    #[must_use]
    pub fn tile_origin(&self, coord: CellCoord) -> Vec2 {
        Vec2::new(coord.column() as f32, coord.row() as f32) * self.tile_size
    }

    /// Pixel position of the tile's centre.
    #[must_use]
    pub fn tile_center(&self, coord: CellCoord) -> Vec2 {
        self.tile_origin(coord) + Vec2::splat(self.tile_size / 2.0)
    }

    /// Reports whether the pixel lies on a wall or outside the grid.
    #[must_use]
    pub fn is_wall(&self, point: Vec2) -> bool {
        self.tile_at(point)
            .map_or(true, |coord| self.cell_type(coord).is_wall())
    }

    /// Strict complement of [`Level::is_wall`].
    #[must_use]
    pub fn is_walkable(&self, point: Vec2) -> bool {
        !self.is_wall(point)
    }

    /// Type of the tile, with every out-of-bounds tile reported as [`CellType::Wall`].
    #[must_use]
    pub fn cell_type(&self, coord: CellCoord) -> CellType {
        self.grid.cell_type(coord).unwrap_or(CellType::Wall)
    }

    /// Reports whether agents may stand on the tile.
    #[must_use]
    pub fn is_tile_walkable(&self, coord: CellCoord) -> bool {
        self.cell_type(coord).is_walkable()
    }

    /// Pixel position of the upper-left corner of the first start cell in row-major order.
    pub fn start_position(&self) -> Result<Vec2, LevelError> {
        self.grid
            .find_first(CellType::Start)
            .map(|coord| self.tile_origin(coord))
            .ok_or(LevelError::StartNotFound)
    }

    /// Pixel position of the upper-left corner of the first end cell, if any.
    #[must_use]
    pub fn end_position(&self) -> Option<Vec2> {
        self.grid
            .find_first(CellType::End)
            .map(|coord| self.tile_origin(coord))
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, LevelError};
    use delve_core::{CellCoord, CellType, Grid};
    use glam::Vec2;
    use proptest::prelude::*;

    fn corridor() -> Level {
        let mut grid = Grid::filled(5, 3, CellType::Wall);
        grid.carve(CellCoord::new(1, 1), CellType::Start);
        grid.carve(CellCoord::new(2, 1), CellType::Path);
        grid.carve(CellCoord::new(3, 1), CellType::End);
        Level::new(grid, 10.0)
    }

    #[test]
    fn start_position_is_tile_origin() {
        let level = corridor();
        assert_eq!(level.start_position(), Ok(Vec2::new(10.0, 10.0)));
        assert_eq!(level.end_position(), Some(Vec2::new(30.0, 10.0)));
    }

    #[test]
    fn missing_start_is_reported() {
        let level = Level::new(Grid::filled(5, 5, CellType::Wall), 10.0);
        assert_eq!(level.start_position(), Err(LevelError::StartNotFound));
    }

    #[test]
    fn pixel_queries_floor_into_tiles() {
        let level = corridor();
        assert!(level.is_walkable(Vec2::new(10.0, 10.0)));
        assert!(level.is_walkable(Vec2::new(29.9, 19.9)));
        assert!(level.is_wall(Vec2::new(9.9, 10.0)));
        assert!(level.is_wall(Vec2::new(20.0, 20.0)));
    }

    #[test]
    fn out_of_bounds_queries_are_walls() {
        let level = corridor();
        assert!(level.is_wall(Vec2::new(-0.5, 15.0)));
        assert!(level.is_wall(Vec2::new(15.0, 1_000.0)));
        assert!(level.is_wall(Vec2::new(f32::NAN, 15.0)));
        assert_eq!(level.cell_type(CellCoord::new(-1, 0)), CellType::Wall);
        assert_eq!(level.cell_type(CellCoord::new(5, 1)), CellType::Wall);
        assert!(!level.is_tile_walkable(CellCoord::new(9, 9)));
    }

    #[test]
    fn room_walls_are_not_walkable() {
        let mut grid = Grid::filled(3, 3, CellType::Wall);
        grid.carve(CellCoord::new(1, 1), CellType::RoomWall);
        grid.carve(CellCoord::new(2, 1), CellType::Room);
        let level = Level::new(grid, 1.0);
        assert!(!level.is_tile_walkable(CellCoord::new(1, 1)));
        assert!(level.is_tile_walkable(CellCoord::new(2, 1)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn wall_and_walkable_are_complements(x in -100.0f32..200.0, y in -100.0f32..200.0) {
            let level = corridor();
            prop_assert_ne!(level.is_wall(Vec2::new(x, y)), level.is_walkable(Vec2::new(x, y)));
            if x < 0.0 || y < 0.0 || x >= 50.0 || y >= 30.0 {
                prop_assert!(level.is_wall(Vec2::new(x, y)));
            }
        }
    }
}
