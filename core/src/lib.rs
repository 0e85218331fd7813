#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bastion siege simulation.
//!
//! This crate defines the vocabulary that connects the authoritative grid,
//! the per-concern managers, the orchestrating engine and the transport
//! adapters. Managers exchange identifiers and snapshots defined here, the
//! engine publishes [`GameEvent`] values to its subscribers, and every
//! rejected command is described by one of the typed errors in [`error`].

mod config;
pub mod error;
mod events;
pub mod geometry;
mod kinds;
mod snapshot;

pub use config::GameConfig;
pub use error::{
    ArmyError, CommandError, EconomyError, MoveError, ParseKindError, PlacementError, SellError,
    UpgradeError,
};
pub use events::{
    DamageDealt, DamageSource, DamageTarget, DestroyCause, FinalStats, GameEvent, GameOutcome,
};
pub use geometry::Vec2;
pub use kinds::{
    ArmyKind, ArmyStats, BuildingKind, BuildingStats, CastleStats, EnemyKind, EnemySpecial,
    EnemyStats, Phase, UpgradeKind, UpgradeStats, WaveKind, CASTLE_STATS, MAX_WALL_STACK,
};
pub use snapshot::{
    ArmyUnitSnapshot, BuildingSnapshot, CastleSnapshot, EnemySnapshot, FullState, PlayerSummary,
};

use serde::{Deserialize, Serialize};

/// Side length, in cells, of the square footprint every castle occupies.
pub const CASTLE_FOOTPRINT: u32 = 4;

/// Maximum number of players a single session accepts.
pub const MAX_PLAYERS: usize = 4;

/// Unique identifier assigned to a player participating in a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new building identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the building identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a player-purchased army unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArmyUnitId(u32);

impl ArmyUnitId {
    /// Creates a new army unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the army unit identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Castle a moving entity can path toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastleTarget {
    /// Player owning the castle.
    pub player: PlayerId,
    /// Centre cell of the castle footprint; always blocked.
    pub cell: CellCoord,
}

impl CastleTarget {
    /// Continuous centre of the castle.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.cell.column() as f32, self.cell.row() as f32)
    }

    /// Distance from `point` to the nearest edge of the castle footprint,
    /// zero inside it.
    #[must_use]
    pub fn distance_to_walls(&self, point: Vec2) -> f32 {
        let half = CASTLE_FOOTPRINT as f32 / 2.0;
        let offset = (point - self.position()).abs() - Vec2::splat(half);
        offset.max(Vec2::ZERO).length()
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the rectangle contains the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= self.origin.column()
            && cell.row() >= self.origin.row()
            && cell.column() - self.origin.column() < self.size.width()
            && cell.row() - self.origin.row() < self.size.height()
    }

    /// Iterates every cell covered by the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width()).map(move |dx| CellCoord::new(origin.column() + dx, origin.row() + dy))
        })
    }

    /// Continuous centre point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.origin.column() as f32 + self.size.width() as f32 / 2.0,
            self.origin.row() as f32 + self.size.height() as f32 / 2.0,
        )
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// One of the four map edges enemies enter from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Row zero.
    North,
    /// Last column.
    East,
    /// Last row.
    South,
    /// Column zero.
    West,
}

impl Edge {
    /// Every edge in clockwise order starting from the north.
    pub const ALL: [Edge; 4] = [Edge::North, Edge::East, Edge::South, Edge::West];

    /// Returns the cell at `offset` along the edge of a `columns` x `rows` grid.
    ///
    /// Offsets run left to right along horizontal edges and top to bottom
    /// along vertical ones; callers are expected to clamp them to the edge
    /// length.
    #[must_use]
    pub fn cell_at(self, offset: u32, columns: u32, rows: u32) -> CellCoord {
        match self {
            Self::North => CellCoord::new(offset, 0),
            Self::South => CellCoord::new(offset, rows.saturating_sub(1)),
            Self::West => CellCoord::new(0, offset),
            Self::East => CellCoord::new(columns.saturating_sub(1), offset),
        }
    }

    /// Number of cells along the edge.
    #[must_use]
    pub const fn length(self, columns: u32, rows: u32) -> u32 {
        match self {
            Self::North | Self::South => columns,
            Self::East | Self::West => rows,
        }
    }

    /// Midpoint cell of the edge.
    #[must_use]
    pub fn midpoint(self, columns: u32, rows: u32) -> CellCoord {
        self.cell_at(self.length(columns, rows) / 2, columns, rows)
    }
}
