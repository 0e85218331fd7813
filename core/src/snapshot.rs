use serde::{Deserialize, Serialize};

use crate::{
    ArmyKind, ArmyUnitId, BuildingId, BuildingKind, EnemyId, EnemyKind, Phase, PlayerId,
    UpgradeKind,
};

/// Immutable representation of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of enemy.
    pub kind: EnemyKind,
    /// Horizontal position in cell space.
    pub x: f32,
    /// Vertical position in cell space.
    pub y: f32,
    /// Current hit points.
    pub hp: f32,
    /// Wave-scaled maximum hit points.
    pub max_hp: f32,
    /// Wave-scaled speed in cells per second.
    pub speed: f32,
}

/// Immutable representation of a single building.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingSnapshot {
    /// Identifier allocated to the building.
    pub id: BuildingId,
    /// Kind of building.
    pub kind: BuildingKind,
    /// Column of the footprint origin.
    pub grid_x: u32,
    /// Row of the footprint origin.
    pub grid_y: u32,
    /// Current hit points.
    pub hp: f32,
    /// Maximum hit points, including stacks.
    pub max_hp: f32,
    /// Player who placed the building.
    pub owner: PlayerId,
    /// Number of stacked walls, 1 for every other building.
    pub stack_count: u32,
}

/// Immutable representation of a single castle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastleSnapshot {
    /// Player owning the castle.
    pub player: PlayerId,
    /// Current hit points.
    pub hp: f32,
    /// Maximum hit points.
    pub max_hp: f32,
    /// Horizontal coordinate of the castle centre.
    pub center_x: f32,
    /// Vertical coordinate of the castle centre.
    pub center_y: f32,
    /// Upgrades purchased so far, in purchase order.
    pub upgrades: Vec<UpgradeKind>,
}

/// Immutable representation of a single army unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmyUnitSnapshot {
    /// Identifier assigned to the unit.
    pub id: ArmyUnitId,
    /// Kind of unit.
    pub kind: ArmyKind,
    /// Player who bought the unit.
    pub owner: PlayerId,
    /// Player whose castle the unit attacks.
    pub target: PlayerId,
    /// Horizontal position in cell space.
    pub x: f32,
    /// Vertical position in cell space.
    pub y: f32,
    /// Current hit points.
    pub hp: f32,
    /// Maximum hit points.
    pub max_hp: f32,
}

/// Per-player summary included in the full state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Player identifier.
    pub id: PlayerId,
    /// Current gold balance.
    pub gold: u32,
}

/// Complete read-only view of a session for broadcast and reconnection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FullState {
    /// Live enemies ordered by identifier.
    pub enemies: Vec<EnemySnapshot>,
    /// Buildings ordered by identifier.
    pub buildings: Vec<BuildingSnapshot>,
    /// Castles ordered by player.
    pub castles: Vec<CastleSnapshot>,
    /// Army units ordered by identifier.
    pub army_units: Vec<ArmyUnitSnapshot>,
    /// Active wave scheduler phase.
    pub phase: Phase,
    /// Zombie wave counter, zero before the first wave.
    pub current_zombie_wave: u32,
    /// Invader wave counter, zero before the first invader wave.
    pub current_invader_wave: u32,
    /// Seconds left in a timed phase, zero otherwise.
    pub time_remaining: f32,
    /// Players in the session with their balances.
    pub players: Vec<PlayerSummary>,
}
