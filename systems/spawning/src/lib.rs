#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Population planner that decides which enemies a freshly generated level
//! starts with.
//!
//! Planning is a pure function of the level, the tuning tables and a random
//! source. The planner never mutates the world; callers turn every
//! [`SpawnPlan`] into a [`Command::SpawnEnemy`].

use delve_core::{
    config::{SpawnTuning, SpawnWeight, Tuning},
    AiKind, Archetype, CellCoord, CellType, Command,
};
use delve_world::{
    collision,
    level::{Level, LevelError},
};
use glam::Vec2;
use rand::{seq::SliceRandom, Rng};

/// One enemy the planner wants placed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPlan {
    /// Archetype to instantiate.
    pub archetype: Archetype,
    /// Strategy the enemy is driven by.
    pub ai: AiKind,
    /// Upper-left corner of the enemy's bounding box in pixels.
    pub position: Vec2,
}

impl SpawnPlan {
    /// Converts the plan into the world command that realises it.
    #[must_use]
    pub const fn into_command(self) -> Command {
        Command::SpawnEnemy {
            archetype: self.archetype,
            ai: self.ai,
            position: self.position,
        }
    }
}

/// Spawn-relevant landmarks found by a single scan of the grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Survey {
    room_centers: Vec<CellCoord>,
    path_cells: Vec<CellCoord>,
    intersections: Vec<CellCoord>,
}

impl Survey {
    /// Room cells fully surrounded by room floor, thinned out so no two
    /// lie within the separation window of each other.
    #[must_use]
    pub fn room_centers(&self) -> &[CellCoord] {
        &self.room_centers
    }

    /// Every corridor cell in row-major order.
    #[must_use]
    pub fn path_cells(&self) -> &[CellCoord] {
        &self.path_cells
    }

    /// Corridor cells with at least three walkable cardinal neighbours.
    #[must_use]
    pub fn intersections(&self) -> &[CellCoord] {
        &self.intersections
    }
}

/// Scans the level once for room centres, corridor cells and junctions.
///
/// `separation` is the tile distance, on both axes, under which a later
/// room centre is folded into an earlier one.
#[must_use]
pub fn survey(level: &Level, separation: i32) -> Survey {
    let grid = level.grid();
    let mut survey = Survey::default();

    for cell in grid.cells() {
        let coord = cell.coord();
        match cell.cell_type() {
            CellType::Room if is_room_center(level, coord) => {
                let crowded = survey.room_centers.iter().any(|center| {
                    (center.column() - coord.column()).abs() < separation
                        && (center.row() - coord.row()).abs() < separation
                });
                if !crowded {
                    survey.room_centers.push(coord);
                }
            }
            CellType::Path => {
                survey.path_cells.push(coord);
                let exits = coord
                    .cardinal_neighbors()
                    .into_iter()
                    .filter(|neighbor| level.is_tile_walkable(*neighbor))
                    .count();
                if exits >= 3 {
                    survey.intersections.push(coord);
                }
            }
            _ => {}
        }
    }

    survey
}

fn is_room_center(level: &Level, coord: CellCoord) -> bool {
    (-1..=1).all(|row| {
        (-1..=1).all(|column| level.cell_type(coord.offset(column, row)) == CellType::Room)
    })
}

/// Plans the starting population of `level`.
///
/// Room centres receive up to `max_per_room` room-appropriate enemies each,
/// scattered around the centre; a sampled fraction of corridor cells each
/// receive at most one path-appropriate enemy. No enemy's centre lies closer
/// to the start than the configured minimum distance, and no bounding box
/// overlaps a wall.
pub fn plan<R>(level: &Level, tuning: &Tuning, rng: &mut R) -> Result<Vec<SpawnPlan>, LevelError>
where
    R: Rng + ?Sized,
{
    let start = level.start_position()?;
    let spawn = &tuning.spawn;
    let landmarks = survey(level, spawn.room_center_separation);
    let tile = level.tile_size();

    let far_enough = |focus: Vec2| focus.distance(start) >= spawn.min_distance_from_start;
    let fits = |plan: &SpawnPlan| {
        let size = tuning.archetypes.get(plan.archetype).bounding_box();
        collision::attempt_move(plan.position, size, level)
    };

    let mut plans = Vec::new();
    let room_table = eligible(&spawn.table, AiKind::is_room_appropriate);
    for center in landmarks.room_centers() {
        if !roll(rng, spawn.room_chance) {
            continue;
        }

        let count = rng.gen_range(1..=spawn.max_per_room.max(1));
        for _ in 0..count {
            let scatter = Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5)
                * tile
                * spawn.room_scatter_tiles
                * 2.0;
            let focus = level.tile_center(*center) + scatter;
            if !far_enough(focus) {
                continue;
            }
            let Some(plan) = draw(&room_table, rng, |archetype| centered(tuning, archetype, focus)) else {
                continue;
            };
            if fits(&plan) {
                plans.push(plan);
            }
        }
    }
    let room_spawns = plans.len();

    let path_table = eligible(&spawn.table, AiKind::is_path_appropriate);
    for cell in sample_paths(landmarks.path_cells(), spawn, rng) {
        let focus = level.tile_center(cell);
        if !far_enough(focus) {
            continue;
        }
        if !roll(rng, spawn.path_chance) {
            continue;
        }

        let Some(plan) = draw(&path_table, rng, |archetype| centered(tuning, archetype, focus)) else {
            continue;
        };
        if fits(&plan) {
            plans.push(plan);
        }
    }

    tracing::info!(
        room_centers = landmarks.room_centers().len(),
        intersections = landmarks.intersections().len(),
        room_spawns,
        path_spawns = plans.len() - room_spawns,
        "population planned"
    );
    Ok(plans)
}

/// Draws an entry with probability proportional to its weight.
///
/// Falls back to the first entry when rounding leaves the draw unresolved
/// or when no entry carries a positive weight.
pub fn choose_weighted<'a, R>(entries: &[&'a SpawnWeight], rng: &mut R) -> Option<&'a SpawnWeight>
where
    R: Rng + ?Sized,
{
    let first = entries.first().copied()?;
    let total: f32 = entries.iter().map(|entry| entry.weight.max(0.0)).sum();
    if total <= 0.0 {
        return Some(first);
    }

    let mut remaining = rng.gen::<f32>() * total;
    for entry in entries {
        remaining -= entry.weight.max(0.0);
        if remaining <= 0.0 {
            return Some(*entry);
        }
    }
    Some(first)
}

fn eligible(table: &[SpawnWeight], allowed: fn(AiKind) -> bool) -> Vec<&SpawnWeight> {
    table.iter().filter(|entry| allowed(entry.ai)).collect()
}

fn draw<R, F>(table: &[&SpawnWeight], rng: &mut R, position: F) -> Option<SpawnPlan>
where
    R: Rng + ?Sized,
    F: FnOnce(Archetype) -> Vec2,
{
    let entry = choose_weighted(table, rng)?;
    Some(SpawnPlan {
        archetype: entry.archetype,
        ai: entry.ai,
        position: position(entry.archetype),
    })
}

/// Upper-left corner that centres the archetype's box on `focus`.
fn centered(tuning: &Tuning, archetype: Archetype, focus: Vec2) -> Vec2 {
    focus - tuning.archetypes.get(archetype).bounding_box().as_vec2() / 2.0
}

fn sample_paths<R>(cells: &[CellCoord], spawn: &SpawnTuning, rng: &mut R) -> Vec<CellCoord>
where
    R: Rng + ?Sized,
{
    let fraction = spawn.path_sample_fraction.clamp(0.0, 1.0);
    let keep = (cells.len() as f32 * fraction).floor() as usize;
    let mut sampled = cells.to_vec();
    sampled.shuffle(rng);
    sampled.truncate(keep);
    sampled
}

fn roll<R>(rng: &mut R, chance: f64) -> bool
where
    R: Rng + ?Sized,
{
    rng.gen::<f64>() < chance
}

#[cfg(test)]
mod tests {
    use super::{choose_weighted, survey};
    use delve_core::{config::SpawnWeight, AiKind, Archetype, CellCoord, CellType, Grid};
    use delve_world::level::Level;
    use rand::rngs::mock::StepRng;

    fn room_level() -> Level {
        let mut grid = Grid::filled(13, 9, CellType::Wall);
        for row in 1..8 {
            for column in 1..12 {
                grid.carve(CellCoord::new(column, row), CellType::Room);
            }
        }
        Level::new(grid, 10.0)
    }

    #[test]
    fn room_centres_are_thinned_by_separation() {
        let level = room_level();
        let landmarks = survey(&level, 3);

        assert_eq!(landmarks.room_centers().first(), Some(&CellCoord::new(2, 2)));
        for (index, center) in landmarks.room_centers().iter().enumerate() {
            for other in &landmarks.room_centers()[index + 1..] {
                let close = (center.column() - other.column()).abs() < 3
                    && (center.row() - other.row()).abs() < 3;
                assert!(!close, "{center:?} and {other:?} overlap");
            }
        }
        assert!(landmarks.path_cells().is_empty());
    }

    #[test]
    fn junctions_need_three_exits() {
        let mut grid = Grid::filled(5, 5, CellType::Wall);
        for column in 1..4 {
            grid.carve(CellCoord::new(column, 2), CellType::Path);
        }
        grid.carve(CellCoord::new(2, 1), CellType::Path);
        let level = Level::new(grid, 10.0);

        let landmarks = survey(&level, 3);

        assert_eq!(landmarks.path_cells().len(), 4);
        assert_eq!(landmarks.intersections(), &[CellCoord::new(2, 2)]);
    }

    #[test]
    fn weighted_choice_walks_the_cumulative_weights() {
        let first = SpawnWeight::new(Archetype::Goblin, AiKind::Random, 1.0);
        let second = SpawnWeight::new(Archetype::Spider, AiKind::Random, 3.0);
        let entries = [&first, &second];

        // StepRng yields the raw value, so a zero draw lands on the first entry
        // and the largest draw on the last.
        let mut low = StepRng::new(0, 0);
        let mut high = StepRng::new(u64::MAX, 0);

        assert_eq!(choose_weighted(&entries, &mut low), Some(&first));
        assert_eq!(choose_weighted(&entries, &mut high), Some(&second));
        assert_eq!(choose_weighted(&[], &mut low), None);
    }

    #[test]
    fn weightless_tables_fall_back_to_the_first_entry() {
        let first = SpawnWeight::new(Archetype::Troll, AiKind::Guard, 0.0);
        let second = SpawnWeight::new(Archetype::Skeleton, AiKind::Guard, 0.0);
        let mut rng = StepRng::new(u64::MAX, 0);

        assert_eq!(choose_weighted(&[&first, &second], &mut rng), Some(&first));
    }
}
