//! Breadth-first reachability field over walkable tiles.

use std::collections::VecDeque;

use delve_core::{CellCoord, CellType};

use crate::level::Level;

/// Dense tile-step distance grid seeded from one or more source tiles.
///
/// Distances default to `u16::MAX` for unreachable cells so callers can
/// distinguish walls and sealed pockets from traversable tiles.
#[derive(Clone, Debug, Default)]
pub struct NavigationField {
    width: u32,
    height: u32,
    distances: Vec<u16>,
}

impl NavigationField {
    /// Builds the field over the level's walkable tiles starting from `sources`.
    #[must_use]
    pub fn from_level(level: &Level, sources: &[CellCoord]) -> Self {
        let grid = level.grid();
        let mut field = Self::default();
        field.rebuild_with(grid.width(), grid.height(), sources, |cell| {
            !level.is_tile_walkable(cell)
        });
        field
    }

    /// Builds the field from the level's start cell, if it has one.
    #[must_use]
    pub fn from_start(level: &Level) -> Option<Self> {
        let start = level.grid().find_first(CellType::Start)?;
        Some(Self::from_level(level, &[start]))
    }

    /// Rebuilds the distances using a breadth-first search.
    pub fn rebuild_with<F>(&mut self, width: u32, height: u32, sources: &[CellCoord], mut is_blocked: F)
    where
        F: FnMut(CellCoord) -> bool,
    {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        self.width = width;
        self.height = height;
        if cell_count == 0 {
            self.distances.clear();
            return;
        }

        if self.distances.len() != cell_count {
            self.distances = vec![u16::MAX; cell_count];
        } else {
            self.distances.fill(u16::MAX);
        }

        let mut queue = VecDeque::new();

        for &source in sources {
            if is_blocked(source) {
                continue;
            }

            let Some(index) = self.index(source) else {
                continue;
            };

            if self.distances[index] == 0 {
                continue;
            }

            self.distances[index] = 0;
            queue.push_back(source);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = self.index(cell) else {
                continue;
            };
            let current_distance = self.distances[current_index];

            if current_distance >= u16::MAX.saturating_sub(1) {
                continue;
            }

            let next_distance = current_distance + 1;

            for neighbor in cell.cardinal_neighbors() {
                let Some(neighbor_index) = self.index(neighbor) else {
                    continue;
                };

                if is_blocked(neighbor) || self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Width of the field in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Steps from the nearest source, or `None` when unreachable or outside the field.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u16> {
        self.index(cell)
            .and_then(|index| self.distances.get(index).copied())
            .filter(|distance| *distance != u16::MAX)
    }

    /// Reports whether a source reaches the cell.
    #[must_use]
    pub fn is_reachable(&self, cell: CellCoord) -> bool {
        self.distance(cell).is_some()
    }

    /// Number of reachable cells, sources included.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.distances
            .iter()
            .filter(|distance| **distance != u16::MAX)
            .count()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        usize::try_from(row)
            .ok()?
            .checked_mul(width)?
            .checked_add(usize::try_from(column).ok()?)
    }
}
