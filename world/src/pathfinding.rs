//! A* path search and ring searches over any [`Walkability`] source.

use std::{cmp::Ordering, collections::BinaryHeap};

use bastion_core::{CellCoord, Edge};

use crate::Walkability;

/// Radius of the ring search used when a path destination is blocked.
///
/// A castle's centre cell is the top-left of its central 2x2, so its 4x4
/// footprint spans `c - 2 ..= c + 1`. A radius-2 ring around the centre
/// therefore only leaves the footprint on the east column and south row:
/// paths into a castle always end there, and a pocket sealing those nine
/// cells counts as cutting the castle off even when north and west are open.
const DESTINATION_SEARCH_RADIUS: u32 = 2;

/// Finds a shortest 4-connected path from `start` to `end`.
///
/// When `end` is blocked (a castle centre, for instance) the search targets
/// the nearest walkable cell in the 8-neighbourhood of `end`, then in its 5x5
/// ring. Returns an empty path when `start` is not walkable or when no route
/// exists, and `[start]` when start and resolved destination coincide.
#[must_use]
pub fn find_path<W>(grid: &W, start: CellCoord, end: CellCoord) -> Vec<CellCoord>
where
    W: Walkability + ?Sized,
{
    if !grid.is_walkable(start) {
        return Vec::new();
    }

    let goal = if grid.is_walkable(end) {
        end
    } else {
        match ring_search(grid, end, 1, DESTINATION_SEARCH_RADIUS) {
            Some(cell) => cell,
            None => return Vec::new(),
        }
    };

    if start == goal {
        return vec![start];
    }

    let (columns, rows) = grid.dimensions();
    let width = columns as usize;
    let node_count = width * rows as usize;
    let mut g_scores = vec![u32::MAX; node_count];
    let mut came_from = vec![usize::MAX; node_count];
    let mut closed = vec![false; node_count];
    let mut open = BinaryHeap::new();

    let start_index = index(width, start);
    let goal_index = index(width, goal);
    g_scores[start_index] = 0;
    open.push(OpenNode {
        f: start.manhattan_distance(goal),
        h: start.manhattan_distance(goal),
        index: start_index,
    });

    while let Some(node) = open.pop() {
        if node.index == goal_index {
            return reconstruct(&came_from, width, goal_index);
        }
        if closed[node.index] {
            continue;
        }
        closed[node.index] = true;

        let cell = coord(width, node.index);
        let next_g = g_scores[node.index].saturating_add(1);
        for neighbor in neighbors(cell, columns, rows) {
            if !grid.is_walkable(neighbor) {
                continue;
            }
            let neighbor_index = index(width, neighbor);
            if closed[neighbor_index] || g_scores[neighbor_index] <= next_g {
                continue;
            }
            g_scores[neighbor_index] = next_g;
            came_from[neighbor_index] = node.index;
            let h = neighbor.manhattan_distance(goal);
            open.push(OpenNode {
                f: next_g + h,
                h,
                index: neighbor_index,
            });
        }
    }

    Vec::new()
}

/// Finds the walkable cell closest to `origin` within `max_radius` rings.
///
/// Ring zero is the origin itself; ring `r` holds the cells at Chebyshev
/// distance `r`. Within a ring the Euclidean-closest cell wins, ties broken
/// by row then column so the result is deterministic.
#[must_use]
pub fn nearest_walkable<W>(grid: &W, origin: CellCoord, max_radius: u32) -> Option<CellCoord>
where
    W: Walkability + ?Sized,
{
    ring_search(grid, origin, 0, max_radius)
}

/// Finds a walkable cell on `edge`, sliding outward from `offset`.
///
/// Candidates alternate forward and backward along the edge (`offset`,
/// `offset + 1`, `offset - 1`, ...) until every cell was tried.
#[must_use]
pub fn walkable_on_edge<W>(grid: &W, edge: Edge, offset: u32) -> Option<CellCoord>
where
    W: Walkability + ?Sized,
{
    let (columns, rows) = grid.dimensions();
    let length = edge.length(columns, rows);
    if length == 0 {
        return None;
    }
    let start = offset.min(length - 1);
    for step in 0..length {
        let forward = start.checked_add(step).filter(|value| *value < length);
        let backward = start.checked_sub(step);
        for candidate in [forward, backward].into_iter().flatten() {
            let cell = edge.cell_at(candidate, columns, rows);
            if grid.is_walkable(cell) {
                return Some(cell);
            }
        }
    }
    None
}

/// Reports whether every map edge still reaches every target.
///
/// Each edge is anchored at its midpoint, slid to the nearest walkable edge
/// cell; an edge with no walkable cell at all counts as cut off.
#[must_use]
pub fn all_edges_reach<W>(grid: &W, targets: &[CellCoord]) -> bool
where
    W: Walkability + ?Sized,
{
    let (columns, rows) = grid.dimensions();
    Edge::ALL.iter().all(|edge| {
        let midpoint = edge.midpoint(columns, rows);
        let offset = match edge {
            Edge::North | Edge::South => midpoint.column(),
            Edge::East | Edge::West => midpoint.row(),
        };
        let Some(anchor) = walkable_on_edge(grid, *edge, offset) else {
            return false;
        };
        targets
            .iter()
            .all(|target| !find_path(grid, anchor, *target).is_empty())
    })
}

fn ring_search<W>(grid: &W, origin: CellCoord, min_radius: u32, max_radius: u32) -> Option<CellCoord>
where
    W: Walkability + ?Sized,
{
    let (columns, rows) = grid.dimensions();
    let origin_column = i64::from(origin.column());
    let origin_row = i64::from(origin.row());

    for radius in min_radius..=max_radius {
        let r = i64::from(radius);
        let mut best: Option<(i64, CellCoord)> = None;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs().max(dy.abs()) != r {
                    continue;
                }
                let column = origin_column + dx;
                let row = origin_row + dy;
                if column < 0 || row < 0 || column >= i64::from(columns) || row >= i64::from(rows) {
                    continue;
                }
                let cell = CellCoord::new(column as u32, row as u32);
                if !grid.is_walkable(cell) {
                    continue;
                }
                let distance = dx * dx + dy * dy;
                let better = match best {
                    None => true,
                    Some((best_distance, best_cell)) => {
                        distance < best_distance
                            || (distance == best_distance
                                && (cell.row(), cell.column()) < (best_cell.row(), best_cell.column()))
                    }
                };
                if better {
                    best = Some((distance, cell));
                }
            }
        }
        if let Some((_, cell)) = best {
            return Some(cell);
        }
    }
    None
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    f: u32,
    h: u32,
    index: usize,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: invert so the lowest f, then lowest h, pops first.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn reconstruct(came_from: &[usize], width: usize, goal_index: usize) -> Vec<CellCoord> {
    let mut path = vec![coord(width, goal_index)];
    let mut current = goal_index;
    while came_from[current] != usize::MAX {
        current = came_from[current];
        path.push(coord(width, current));
    }
    path.reverse();
    path
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: CellCoord) -> usize {
    cell.row() as usize * width + cell.column() as usize
}

fn coord(width: usize, index: usize) -> CellCoord {
    CellCoord::new((index % width) as u32, (index / width) as u32)
}
