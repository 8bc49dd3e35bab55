use delve_core::{
    config::{GridTuning, RoomTuning},
    CellCoord, CellType, Grid,
};
use delve_system_generation::{DungeonGenerator, GenerationError};
use delve_world::{level::Level, navigation::NavigationField};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn generate(width: u32, height: u32, seed: u64) -> delve_system_generation::Dungeon {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    DungeonGenerator::default()
        .generate(width, height, &mut rng)
        .expect("valid dimensions")
}

fn border_is_solid(grid: &Grid) -> bool {
    let (width, height) = (grid.width() as i32, grid.height() as i32);
    grid.cells().all(|cell| {
        let coord = cell.coord();
        let on_border = coord.column() == 0
            || coord.row() == 0
            || coord.column() == width - 1
            || coord.row() == height - 1;
        !on_border || cell.cell_type() == CellType::Wall
    })
}

fn room_free() -> RoomTuning {
    RoomTuning {
        min_count: 0,
        max_count: 0,
        ..RoomTuning::default()
    }
}

#[test]
fn identical_seeds_produce_identical_mazes() {
    let generator = DungeonGenerator::new(room_free());
    let first = generator
        .generate(21, 21, &mut ChaCha8Rng::seed_from_u64(0x5eed))
        .expect("valid dimensions");
    let second = generator
        .generate(21, 21, &mut ChaCha8Rng::seed_from_u64(0x5eed))
        .expect("valid dimensions");

    assert!(first.rooms().is_empty());
    assert_eq!(first.grid(), second.grid());
}

#[test]
fn identical_seeds_produce_identical_layouts() {
    // Default room bounds still fit two or three rooms into a 21x21 grid.
    let first = generate(21, 21, 0x5eed);
    let second = generate(21, 21, 0x5eed);

    assert_eq!(first.grid(), second.grid());
    assert_eq!(first.rooms(), second.rooms());
}

#[test]
fn different_seeds_diverge() {
    let first = generate(41, 41, 1);
    let second = generate(41, 41, 2);

    assert_ne!(first.grid(), second.grid());
}

#[test]
fn undersized_grids_are_rejected() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let generator = DungeonGenerator::default();

    assert_eq!(
        generator.generate(4, 9, &mut rng).map(|_| ()),
        Err(GenerationError::DimensionsTooSmall { width: 4, height: 9 })
    );
    assert!(generator.generate(5, 5, &mut rng).is_ok());
}

#[test]
fn smallest_grid_has_no_rooms_and_a_direct_route() {
    let dungeon = generate(5, 5, 9);
    let grid = dungeon.grid();

    assert!(dungeon.rooms().is_empty());
    assert_eq!(grid.cell_type(CellCoord::new(1, 1)), Some(CellType::Start));
    assert_eq!(grid.cell_type(CellCoord::new(3, 3)), Some(CellType::End));
    assert_eq!(grid.count(CellType::Room), 0);
}

#[test]
fn room_free_tuning_yields_a_perfect_maze() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let dungeon = DungeonGenerator::new(room_free())
        .generate(21, 21, &mut rng)
        .expect("valid dimensions");
    let grid = dungeon.grid();

    assert!(dungeon.rooms().is_empty());
    // 100 maze nodes joined by 99 corridor links, two of them relabelled Start and End.
    let walkable = grid.cells().filter(|cell| cell.cell_type().is_walkable()).count();
    assert_eq!(walkable, 199);
    assert_eq!(grid.count(CellType::RoomWall), 0);
}

#[test]
fn default_viewport_dungeon_places_rooms() {
    let (width, height) = GridTuning::default().dimensions();
    let dungeon = generate(width, height, 0xde1f);
    let grid = dungeon.grid();

    assert!(!dungeon.rooms().is_empty());
    assert!(dungeon.rooms().len() <= 40);
    assert!(grid.count(CellType::Room) > 0);
    assert!(border_is_solid(grid));

    let level = Level::new(dungeon.into_grid(), 36.0);
    let field = NavigationField::from_start(&level).expect("start cell");
    let end = level.grid().find_first(CellType::End).expect("end cell");
    assert!(field.is_reachable(end));
}

#[test]
fn walkable_cells_carry_floor_variants() {
    let dungeon = generate(31, 25, 4);

    for cell in dungeon.grid().cells() {
        if cell.cell_type().is_walkable() {
            assert!(cell.floor_variant().is_some_and(|variant| variant < 4));
        } else {
            assert_eq!(cell.floor_variant(), None);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn start_reaches_end(width in 5u32..64, height in 5u32..64, seed in any::<u64>()) {
        let dungeon = generate(width, height, seed);
        let grid = dungeon.grid();

        prop_assert_eq!(grid.count(CellType::Start), 1);
        prop_assert_eq!(grid.count(CellType::End), 1);
        prop_assert!(border_is_solid(grid));

        let level = Level::new(grid.clone(), 36.0);
        let field = NavigationField::from_start(&level).expect("start cell");
        let end = CellCoord::new(width as i32 - 2, height as i32 - 2);
        prop_assert_eq!(grid.cell_type(end), Some(CellType::End));
        prop_assert!(field.is_reachable(end));
    }

    #[test]
    fn padded_rooms_never_overlap(width in 15u32..90, height in 15u32..90, seed in any::<u64>()) {
        let dungeon = generate(width, height, seed);
        let rooms = dungeon.rooms();

        for (index, room) in rooms.iter().enumerate() {
            prop_assert!(room.origin().column() % 2 == 1 && room.origin().row() % 2 == 1);
            prop_assert!(room.width() % 2 == 1 && room.height() % 2 == 1);
            prop_assert!(room.origin().column() >= 2 && room.origin().row() >= 2);
            prop_assert!(room.origin().column() + room.width() <= width as i32 - 2);
            prop_assert!(room.origin().row() + room.height() <= height as i32 - 2);

            for other in &rooms[index + 1..] {
                prop_assert!(!room.expanded(2).overlaps(&other.expanded(2)));
            }
        }
    }
}
