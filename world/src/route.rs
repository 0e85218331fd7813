//! Waypoint following shared by every moving entity.

use bastion_core::{geometry, CellCoord, Vec2};

/// Ordered waypoints an entity walks through, one cell centre at a time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    waypoints: Vec<CellCoord>,
    next: usize,
}

impl Route {
    /// Wraps a path returned by [`crate::find_path`].
    ///
    /// The first waypoint is the cell the walker already stands on, so it is
    /// skipped.
    #[must_use]
    pub fn new(path: Vec<CellCoord>) -> Self {
        let next = usize::from(!path.is_empty());
        Self {
            waypoints: path,
            next,
        }
    }

    /// Reports whether every waypoint has been consumed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next >= self.waypoints.len()
    }

    /// Waypoints not reached yet.
    #[must_use]
    pub fn remaining(&self) -> &[CellCoord] {
        self.waypoints.get(self.next..).unwrap_or(&[])
    }

    /// Reports whether any remaining waypoint is among `cells`.
    #[must_use]
    pub fn crosses(&self, cells: &[CellCoord]) -> bool {
        self.remaining().iter().any(|cell| cells.contains(cell))
    }

    /// Moves `position` along the route by `distance` cells.
    ///
    /// `speed_factor` scales progress toward each waypoint and must stay
    /// positive; climbers use it to slow down on wall cells. Consumed
    /// waypoints are dropped.
    pub fn advance<F>(&mut self, position: &mut Vec2, distance: f32, speed_factor: F)
    where
        F: Fn(CellCoord) -> f32,
    {
        let mut budget = distance;
        while budget > 0.0 {
            let Some(cell) = self.waypoints.get(self.next).copied() else {
                break;
            };
            let factor = speed_factor(cell).max(f32::EPSILON);
            let target = geometry::cell_center(cell);
            let (moved, travelled) = geometry::step_towards(*position, target, budget * factor);
            *position = moved;
            budget -= travelled / factor;
            if moved == target {
                self.next += 1;
            } else {
                break;
            }
        }
    }
}
