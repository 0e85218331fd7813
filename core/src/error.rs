//! Typed failures returned by the command surface.
//!
//! Every variant renders a human-readable reason through [`std::fmt::Display`]
//! so adapters can forward it to players unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BuildingId, PlayerId, UpgradeKind};

/// A kind name arriving from the transport did not match any known variant.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("unknown {category}: {value}")]
pub struct ParseKindError {
    category: String,
    value: String,
}

impl ParseKindError {
    /// Creates an error for the provided category and offending value.
    #[must_use]
    pub fn new(category: &str, value: &str) -> Self {
        Self {
            category: category.to_owned(),
            value: value.to_owned(),
        }
    }

    /// The value that failed to parse.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Reasons a building placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The owner cannot afford the building.
    #[error("not enough gold: need {required}, have {available}")]
    InsufficientGold {
        /// Gold the building costs.
        required: u32,
        /// Gold the owner currently holds.
        available: u32,
    },
    /// The requested footprint extends beyond the grid.
    #[error("placement is out of bounds")]
    OutOfBounds,
    /// The requested footprint overlaps a blocked cell.
    #[error("tile is already occupied")]
    Occupied,
    /// The wall on the tile already reached its maximum height.
    #[error("wall is already stacked to its maximum height of {max}")]
    StackLimit {
        /// Maximum stack height.
        max: u32,
    },
    /// The placement would cut a map edge off from a castle.
    #[error("placement would block every path to a castle")]
    BlocksPath,
}

/// Reasons a building move request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MoveError {
    /// No building with the provided identifier exists.
    #[error("building {0:?} does not exist")]
    UnknownBuilding(BuildingId),
    /// The destination footprint extends beyond the grid.
    #[error("destination is out of bounds")]
    OutOfBounds,
    /// The destination footprint overlaps a blocked cell.
    #[error("destination is already occupied")]
    Occupied,
    /// The move would cut a map edge off from a castle.
    #[error("move would block every path to a castle")]
    BlocksPath,
}

/// Reasons a sell request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SellError {
    /// No building with the provided identifier exists.
    #[error("building {0:?} does not exist")]
    UnknownBuilding(BuildingId),
    /// The seller does not own the building.
    #[error("building {building:?} belongs to another player")]
    NotOwner {
        /// Building the seller attempted to sell.
        building: BuildingId,
    },
}

/// Reasons a castle upgrade may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum UpgradeError {
    /// The player has no castle in this session.
    #[error("player {0:?} has no castle")]
    UnknownPlayer(PlayerId),
    /// A one-time upgrade was already purchased.
    #[error("{0} has already been purchased")]
    AlreadyPurchased(UpgradeKind),
    /// The upgrade requires another upgrade first.
    #[error("{upgrade} requires {requires} first")]
    MissingPrerequisite {
        /// Upgrade that was requested.
        upgrade: UpgradeKind,
        /// Upgrade that must be owned beforehand.
        requires: UpgradeKind,
    },
    /// The castle has been destroyed.
    #[error("castle has been destroyed")]
    CastleDestroyed,
}

/// Reasons a gold ledger operation may fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EconomyError {
    /// The player has no ledger entry.
    #[error("player {0:?} has no gold ledger")]
    UnknownPlayer(PlayerId),
    /// The balance does not cover the requested spend.
    #[error("not enough gold: need {required}, have {available}")]
    InsufficientGold {
        /// Gold requested.
        required: u32,
        /// Gold currently held.
        available: u32,
    },
}

/// Reasons an army unit purchase may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ArmyError {
    /// The requesting player has no castle in this session.
    #[error("player {0:?} has no castle")]
    UnknownOwner(PlayerId),
    /// The target player does not exist in this session.
    #[error("target player {0:?} does not exist")]
    UnknownTarget(PlayerId),
    /// Players cannot attack their own castle.
    #[error("cannot send an army against your own castle")]
    SelfTarget,
    /// The requesting player's castle has fallen.
    #[error("your castle has been destroyed")]
    OwnerDefeated,
    /// The target castle has already fallen.
    #[error("target castle has already been destroyed")]
    TargetDefeated,
    /// No walkable cell exists near the owner's castle.
    #[error("no free cell near your castle to deploy from")]
    NoSpawnPoint,
    /// No path reaches the target castle.
    #[error("no path reaches the target castle")]
    NoPath,
}

/// Umbrella error returned by every engine command.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum CommandError {
    /// A kind name could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseKindError),
    /// Building placement failed.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// Building move failed.
    #[error(transparent)]
    Move(#[from] MoveError),
    /// Building sale failed.
    #[error(transparent)]
    Sell(#[from] SellError),
    /// Castle upgrade failed.
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
    /// A gold transaction failed.
    #[error(transparent)]
    Economy(#[from] EconomyError),
    /// Army unit purchase failed.
    #[error(transparent)]
    Army(#[from] ArmyError),
    /// The player is not part of the session.
    #[error("player {0:?} is not part of this game")]
    UnknownPlayer(PlayerId),
    /// The session has not been initialised yet.
    #[error("game has not started")]
    NotStarted,
    /// The session already ended.
    #[error("game is over")]
    GameOver,
}
