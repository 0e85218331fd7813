use bastion_core::{CellCoord, CellRect, CellRectSize};
use bastion_world::{find_path, Grid, Walkability};
use proptest::prelude::*;

const SIZE: u32 = 40;

proptest! {
    #[test]
    fn empty_grid_paths_have_manhattan_length(
        start_column in 0..SIZE,
        start_row in 0..SIZE,
        end_column in 0..SIZE,
        end_row in 0..SIZE,
    ) {
        let grid = Grid::new(SIZE, SIZE);
        let start = CellCoord::new(start_column, start_row);
        let end = CellCoord::new(end_column, end_row);

        let path = find_path(&grid, start, end);

        prop_assert_eq!(path.len() as u32, start.manhattan_distance(end) + 1);
        prop_assert_eq!(path.first().copied(), Some(start));
        prop_assert_eq!(path.last().copied(), Some(end));
    }

    #[test]
    fn paths_only_cross_walkable_neighbours(
        walls in prop::collection::vec((0..SIZE, 0..SIZE), 0..200),
        start_column in 0..SIZE,
        end_column in 0..SIZE,
    ) {
        let mut grid = Grid::new(SIZE, SIZE);
        for (column, row) in walls {
            grid.set_blocked(CellRect::from_origin_and_size(
                CellCoord::new(column, row),
                CellRectSize::new(1, 1),
            ));
        }
        let start = CellCoord::new(start_column, 0);
        let end = CellCoord::new(end_column, SIZE - 1);

        let path = find_path(&grid, start, end);

        for pair in path.windows(2) {
            prop_assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
        for cell in &path {
            prop_assert!(grid.is_walkable(*cell));
        }
    }
}

#[test]
fn detour_is_shortest_around_a_wall() {
    let mut grid = Grid::new(7, 7);
    grid.set_blocked(CellRect::from_origin_and_size(
        CellCoord::new(3, 0),
        CellRectSize::new(1, 6),
    ));

    let path = find_path(&grid, CellCoord::new(0, 0), CellCoord::new(6, 0));

    // Down to row 6, across, and back up: 6 + 6 + 6 steps.
    assert_eq!(path.len(), 19);
}

#[test]
fn castle_paths_end_on_the_east_or_south_side() {
    let mut grid = Grid::new(SIZE, SIZE);
    grid.place_castle(CellRect::from_origin_and_size(
        CellCoord::new(18, 18),
        CellRectSize::new(4, 4),
    ));
    let centre = CellCoord::new(20, 20);

    let path = find_path(&grid, CellCoord::new(0, 20), centre);
    assert_eq!(path.last().copied(), Some(CellCoord::new(22, 20)));

    grid.set_blocked(CellRect::from_origin_and_size(
        CellCoord::new(22, 18),
        CellRectSize::new(1, 5),
    ));
    let path = find_path(&grid, CellCoord::new(0, 20), centre);
    assert_eq!(path.last().copied(), Some(CellCoord::new(20, 22)));

    grid.set_blocked(CellRect::from_origin_and_size(
        CellCoord::new(18, 22),
        CellRectSize::new(4, 1),
    ));
    assert!(grid.is_walkable(CellCoord::new(17, 20)));
    assert!(find_path(&grid, CellCoord::new(0, 20), centre).is_empty());
}
