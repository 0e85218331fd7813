#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative occupancy grid and pathfinding for Bastion.
//!
//! The [`Grid`] stores which cells are walkable, which belong to castle
//! footprints, and how tall any wall standing on a cell is. Pathfinding and
//! reachability checks are written against the [`Walkability`] trait so they
//! run unchanged over the live grid, a [`GridPatch`] describing a hypothetical
//! edit, or the [`ClimbableView`] used by late-wave enemies.

mod pathfinding;
mod route;

pub use pathfinding::{all_edges_reach, find_path, nearest_walkable, walkable_on_edge};
pub use route::Route;

use bastion_core::{CellCoord, CellRect};

/// Read access to per-cell walkability.
pub trait Walkability {
    /// Grid dimensions as `(columns, rows)`.
    fn dimensions(&self) -> (u32, u32);

    /// Reports whether an entity may stand on the cell. Out-of-bounds cells
    /// are never walkable.
    fn is_walkable(&self, cell: CellCoord) -> bool;

    /// Reports whether the cell lies inside the grid.
    fn in_bounds(&self, cell: CellCoord) -> bool {
        let (columns, rows) = self.dimensions();
        cell.column() < columns && cell.row() < rows
    }
}

/// Dense walkability, castle and wall-height layers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    blocked: Vec<bool>,
    castle: Vec<bool>,
    wall_height: Vec<u8>,
}

impl Grid {
    /// Creates a fully walkable grid.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            blocked: vec![false; capacity],
            castle: vec![false; capacity],
            wall_height: vec![0; capacity],
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the whole rectangle lies inside the grid.
    #[must_use]
    pub fn rect_in_bounds(&self, rect: CellRect) -> bool {
        let origin = rect.origin();
        let size = rect.size();
        size.width() > 0
            && size.height() > 0
            && u64::from(origin.column()) + u64::from(size.width()) <= u64::from(self.columns)
            && u64::from(origin.row()) + u64::from(size.height()) <= u64::from(self.rows)
    }

    /// Reports whether every cell of the rectangle is walkable.
    #[must_use]
    pub fn rect_walkable(&self, rect: CellRect) -> bool {
        self.rect_in_bounds(rect) && rect.cells().all(|cell| self.is_walkable(cell))
    }

    /// Marks every in-bounds cell of the rectangle as blocked.
    pub fn set_blocked(&mut self, rect: CellRect) {
        for cell in rect.cells() {
            if let Some(index) = self.index(cell) {
                self.blocked[index] = true;
            }
        }
    }

    /// Marks every in-bounds cell of the rectangle as walkable again.
    ///
    /// Castle cells stay blocked; only buildings ever free cells.
    pub fn set_walkable(&mut self, rect: CellRect) {
        for cell in rect.cells() {
            if let Some(index) = self.index(cell) {
                if !self.castle[index] {
                    self.blocked[index] = false;
                }
            }
        }
    }

    /// Reserves a castle footprint: blocked, and remembered as castle.
    pub fn place_castle(&mut self, rect: CellRect) {
        for cell in rect.cells() {
            if let Some(index) = self.index(cell) {
                self.blocked[index] = true;
                self.castle[index] = true;
            }
        }
    }

    /// Reports whether the cell belongs to a castle footprint.
    #[must_use]
    pub fn is_castle(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some_and(|index| self.castle[index])
    }

    /// Sets the wall-height layer for every cell of the rectangle.
    pub fn set_wall_height(&mut self, rect: CellRect, height: u8) {
        for cell in rect.cells() {
            if let Some(index) = self.index(cell) {
                self.wall_height[index] = height;
            }
        }
    }

    /// Height of the wall standing on the cell, zero when there is none.
    #[must_use]
    pub fn wall_height(&self, cell: CellCoord) -> u8 {
        self.index(cell)
            .map_or(0, |index| self.wall_height[index])
    }

    /// Starts a copy-on-write patch for testing hypothetical edits.
    #[must_use]
    pub fn patch(&self) -> GridPatch<'_> {
        GridPatch {
            base: self,
            blocked: Vec::new(),
            freed: Vec::new(),
        }
    }

    /// View in which only castle footprints block movement.
    #[must_use]
    pub fn climbable(&self) -> ClimbableView<'_> {
        ClimbableView { base: self }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

impl Walkability for Grid {
    fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some_and(|index| !self.blocked[index])
    }
}

/// Hypothetical edit layered over a borrowed grid.
///
/// Patches record the handful of cells a placement or move would touch
/// instead of copying the full grid; freed cells are applied first, then
/// blocked cells, and castle cells can never be freed.
#[derive(Clone, Debug)]
pub struct GridPatch<'a> {
    base: &'a Grid,
    blocked: Vec<CellCoord>,
    freed: Vec<CellCoord>,
}

impl GridPatch<'_> {
    /// Blocks every cell of the rectangle within the patch.
    #[must_use]
    pub fn block(mut self, rect: CellRect) -> Self {
        self.blocked.extend(rect.cells());
        self
    }

    /// Frees every cell of the rectangle within the patch.
    #[must_use]
    pub fn free(mut self, rect: CellRect) -> Self {
        self.freed.extend(rect.cells());
        self
    }
}

impl Walkability for GridPatch<'_> {
    fn dimensions(&self) -> (u32, u32) {
        self.base.dimensions()
    }

    fn is_walkable(&self, cell: CellCoord) -> bool {
        if !self.in_bounds(cell) || self.blocked.contains(&cell) {
            return false;
        }
        if self.freed.contains(&cell) {
            return !self.base.is_castle(cell);
        }
        self.base.is_walkable(cell)
    }
}

/// Walkability view where walls can be climbed and only castles block.
#[derive(Clone, Copy, Debug)]
pub struct ClimbableView<'a> {
    base: &'a Grid,
}

impl Walkability for ClimbableView<'_> {
    fn dimensions(&self) -> (u32, u32) {
        self.base.dimensions()
    }

    fn is_walkable(&self, cell: CellCoord) -> bool {
        self.in_bounds(cell) && !self.base.is_castle(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::CellRectSize;

    fn rect(column: u32, row: u32, width: u32, height: u32) -> CellRect {
        CellRect::from_origin_and_size(CellCoord::new(column, row), CellRectSize::new(width, height))
    }

    #[test]
    fn blocking_and_freeing_round_trip() {
        let mut grid = Grid::new(8, 8);
        grid.set_blocked(rect(2, 2, 2, 1));
        assert!(!grid.is_walkable(CellCoord::new(3, 2)));
        grid.set_walkable(rect(2, 2, 2, 1));
        assert!(grid.is_walkable(CellCoord::new(3, 2)));
    }

    #[test]
    fn castle_cells_never_become_walkable() {
        let mut grid = Grid::new(8, 8);
        grid.place_castle(rect(2, 2, 4, 4));
        grid.set_walkable(rect(0, 0, 8, 8));
        assert!(!grid.is_walkable(CellCoord::new(3, 3)));
        assert!(grid.is_castle(CellCoord::new(5, 5)));
        assert!(!grid.patch().free(rect(2, 2, 1, 1)).is_walkable(CellCoord::new(2, 2)));
    }

    #[test]
    fn patch_leaves_live_grid_untouched() {
        let mut grid = Grid::new(6, 6);
        grid.set_blocked(rect(0, 0, 1, 1));
        let patch = grid.patch().free(rect(0, 0, 1, 1)).block(rect(4, 4, 1, 1));
        assert!(patch.is_walkable(CellCoord::new(0, 0)));
        assert!(!patch.is_walkable(CellCoord::new(4, 4)));
        assert!(!grid.is_walkable(CellCoord::new(0, 0)));
        assert!(grid.is_walkable(CellCoord::new(4, 4)));
    }

    #[test]
    fn climbable_view_only_respects_castles() {
        let mut grid = Grid::new(6, 6);
        grid.place_castle(rect(0, 0, 2, 2));
        grid.set_blocked(rect(4, 4, 1, 1));
        grid.set_wall_height(rect(4, 4, 1, 1), 2);
        let view = grid.climbable();
        assert!(view.is_walkable(CellCoord::new(4, 4)));
        assert!(!view.is_walkable(CellCoord::new(1, 1)));
        assert!(!view.is_walkable(CellCoord::new(6, 0)));
        assert_eq!(grid.wall_height(CellCoord::new(4, 4)), 2);
    }

    #[test]
    fn clone_is_independent() {
        let grid = Grid::new(4, 4);
        let mut copy = grid.clone();
        copy.set_blocked(rect(1, 1, 1, 1));
        assert!(grid.is_walkable(CellCoord::new(1, 1)));
        assert!(!copy.is_walkable(CellCoord::new(1, 1)));
    }

    #[test]
    fn rect_bounds_are_checked() {
        let grid = Grid::new(10, 10);
        assert!(grid.rect_in_bounds(rect(8, 8, 2, 2)));
        assert!(!grid.rect_in_bounds(rect(9, 8, 2, 2)));
        assert!(!grid.rect_walkable(rect(9, 9, 2, 2)));
    }
}
