use serde::{Deserialize, Serialize};

use crate::{
    ArmyKind, ArmyUnitId, BuildingId, BuildingKind, CastleSnapshot, EnemyId, EnemyKind, Phase,
    PlayerId, Vec2, WaveKind,
};

/// Domain events published by the engine after every state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A single hit landed on any entity.
    DamageDealt(DamageDealt),
    /// An enemy entered the map.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of enemy spawned.
        kind: EnemyKind,
        /// Spawn position.
        position: Vec2,
        /// Wave-scaled hit points.
        hp: f32,
        /// Zombie wave the enemy belongs to.
        wave: u32,
    },
    /// An enemy was killed by a building or castle.
    EnemyDied {
        /// Identifier of the dead enemy.
        enemy: EnemyId,
        /// Kind of the dead enemy.
        kind: EnemyKind,
        /// Position where the enemy died.
        position: Vec2,
        /// Gold reward released by the kill.
        reward: u32,
        /// Player credited with the kill, if any single player is.
        killer: Option<PlayerId>,
    },
    /// A building was removed by combat.
    BuildingDestroyed {
        /// Identifier of the destroyed building.
        building: BuildingId,
        /// Kind of the destroyed building.
        kind: BuildingKind,
        /// Owner of the destroyed building.
        owner: PlayerId,
        /// Why the building disappeared.
        cause: DestroyCause,
    },
    /// A player's gold balance changed.
    GoldChanged {
        /// Player whose balance changed.
        player: PlayerId,
        /// Balance after the change.
        gold: u32,
        /// Signed change applied to the balance.
        delta: i64,
    },
    /// A castle's hit points or upgrades changed.
    CastleUpdated(CastleSnapshot),
    /// A timed phase is about to end.
    WaveWarning {
        /// Phase that is ending.
        phase: Phase,
        /// Seconds left in the phase.
        seconds_remaining: f32,
        /// Zombie wave that starts when the phase ends.
        next_wave: u32,
    },
    /// A zombie or invader wave began.
    WaveStarted {
        /// Which wave counter advanced.
        kind: WaveKind,
        /// Number of the wave that started.
        number: u32,
    },
    /// The wave scheduler entered a new phase.
    PhaseChanged {
        /// Phase now active.
        phase: Phase,
    },
    /// A player deployed an army unit.
    ArmyUnitSpawned {
        /// Identifier assigned to the unit.
        unit: ArmyUnitId,
        /// Kind of unit deployed.
        kind: ArmyKind,
        /// Player who bought the unit.
        owner: PlayerId,
        /// Player whose castle the unit marches on.
        target: PlayerId,
        /// Deployment position.
        position: Vec2,
    },
    /// An army unit was killed.
    ArmyUnitDied {
        /// Identifier of the dead unit.
        unit: ArmyUnitId,
        /// Kind of the dead unit.
        kind: ArmyKind,
        /// Player who owned the unit.
        owner: PlayerId,
    },
    /// The session reached a terminal state. Emitted exactly once.
    GameOver {
        /// Whether the players won or lost.
        outcome: GameOutcome,
        /// Aggregate statistics for persistence.
        stats: FinalStats,
    },
}

/// A single hit applied to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageDealt {
    /// Entity that received the hit.
    pub target: DamageTarget,
    /// Damage applied.
    pub amount: f32,
    /// Hit points left after the hit, never negative.
    pub remaining_hp: f32,
    /// Entity responsible for the hit, if any.
    pub source: Option<DamageSource>,
}

/// Entity on the receiving end of a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageTarget {
    /// An enemy.
    Enemy(EnemyId),
    /// A building.
    Building(BuildingId),
    /// A player's castle.
    Castle(PlayerId),
    /// An army unit.
    ArmyUnit(ArmyUnitId),
}

/// Entity that dealt a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    /// A building attack.
    Building(BuildingId),
    /// A castle's king attack.
    Castle(PlayerId),
    /// An enemy's arrival, melee or special.
    Enemy(EnemyId),
    /// An army unit's attack.
    ArmyUnit(ArmyUnitId),
}

/// Reason a building left the map outside of a sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyCause {
    /// Hit points dropped to zero.
    Combat,
    /// A one-time building fired its only attack.
    Detonated,
}

/// Terminal result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    /// Every wave was cleared.
    Victory,
    /// Every castle fell.
    Defeat,
}

/// Aggregate session statistics consumed by persistence at game end.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalStats {
    /// Highest zombie wave reached.
    pub wave_reached: u32,
    /// Enemies killed across all players.
    pub total_kills: u32,
    /// Gold earned from kills across all players.
    pub total_gold_earned: u64,
    /// Fresh building placements across all players.
    pub total_buildings_placed: u32,
    /// Simulated session length in seconds.
    pub duration_secs: f64,
}
