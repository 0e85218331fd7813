//! Continuous 2D helpers layered over [`glam::Vec2`].
//!
//! Positions live in cell space: cell `(x, y)` covers `[x, x + 1)` on both
//! axes, so its centre sits at `(x + 0.5, y + 0.5)`.

use crate::CellCoord;

pub use glam::Vec2;

/// Centre point of the provided cell.
#[must_use]
pub fn cell_center(cell: CellCoord) -> Vec2 {
    Vec2::new(cell.column() as f32 + 0.5, cell.row() as f32 + 0.5)
}

/// Cell containing the provided point, clamped to non-negative indices.
#[must_use]
pub fn cell_of(point: Vec2) -> CellCoord {
    CellCoord::new(point.x.max(0.0) as u32, point.y.max(0.0) as u32)
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Linear interpolation between `a` and `b` with `t` clamped to `[0, 1]`.
#[must_use]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a.lerp(b, t.clamp(0.0, 1.0))
}

/// Clamps a point into the axis-aligned box spanned by `min` and `max`.
#[must_use]
pub fn clamp(point: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    point.clamp(min, max)
}

/// Moves `from` toward `to` by at most `max_step`.
///
/// Returns the new position and the distance actually travelled, which is
/// smaller than `max_step` only when the destination was reached.
#[must_use]
pub fn step_towards(from: Vec2, to: Vec2, max_step: f32) -> (Vec2, f32) {
    let gap = from.distance(to);
    if gap <= max_step || gap <= f32::EPSILON {
        return (to, gap);
    }
    let t = max_step / gap;
    (lerp(from, to, t), max_step)
}

/// Projects `point` onto the ray starting at `origin` heading along `direction`.
///
/// Returns `(along, across)`: the signed distance along the ray and the
/// perpendicular distance from it. A zero-length direction yields the plain
/// distance as `across`.
#[must_use]
pub fn project_onto_ray(origin: Vec2, direction: Vec2, point: Vec2) -> (f32, f32) {
    let offset = point - origin;
    let Some(unit) = direction.try_normalize() else {
        return (0.0, offset.length());
    };
    let along = offset.dot(unit);
    let across = (offset - unit * along).length();
    (along, across)
}
