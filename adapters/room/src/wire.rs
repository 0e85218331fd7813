use bastion_core::{BuildingId, CellCoord, ParseKindError, PlayerId};
use bastion_engine::Command;
use serde::{Deserialize, Serialize};

/// Command as sent by a client, with kinds spelled as strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Place or stack a building.
    PlaceBuilding {
        /// Building kind name, e.g. `arrow_tower`.
        building_type: String,
        /// Footprint origin column.
        x: u32,
        /// Footprint origin row.
        y: u32,
        /// Paying player.
        player_id: u32,
    },
    /// Move a building.
    MoveBuilding {
        /// Building to move.
        building_id: u32,
        /// New origin column.
        x: u32,
        /// New origin row.
        y: u32,
    },
    /// Sell a building.
    SellBuilding {
        /// Building to sell.
        building_id: u32,
        /// Selling player.
        player_id: u32,
    },
    /// Buy a castle upgrade.
    UpgradeCastle {
        /// Upgrade name, e.g. `fortify_i`.
        upgrade_type: String,
        /// Buying player.
        player_id: u32,
    },
    /// Buy a castle repair.
    RepairCastle {
        /// Buying player.
        player_id: u32,
    },
    /// Buy an army unit.
    SpawnArmy {
        /// Unit name, e.g. `knight`.
        unit_type: String,
        /// Buying player.
        player_id: u32,
        /// Player whose castle is attacked.
        target_player_id: u32,
    },
}

impl ClientMessage {
    /// Resolves kind names into a typed engine command.
    pub fn into_command(self) -> Result<Command, ParseKindError> {
        Ok(match self {
            Self::PlaceBuilding {
                building_type,
                x,
                y,
                player_id,
            } => Command::PlaceBuilding {
                player: PlayerId::new(player_id),
                kind: building_type.parse()?,
                cell: CellCoord::new(x, y),
            },
            Self::MoveBuilding { building_id, x, y } => Command::MoveBuilding {
                building: BuildingId::new(building_id),
                cell: CellCoord::new(x, y),
            },
            Self::SellBuilding {
                building_id,
                player_id,
            } => Command::SellBuilding {
                building: BuildingId::new(building_id),
                seller: PlayerId::new(player_id),
            },
            Self::UpgradeCastle {
                upgrade_type,
                player_id,
            } => Command::UpgradeCastle {
                player: PlayerId::new(player_id),
                upgrade: upgrade_type.parse()?,
            },
            Self::RepairCastle { player_id } => Command::RepairCastle {
                player: PlayerId::new(player_id),
            },
            Self::SpawnArmy {
                unit_type,
                player_id,
                target_player_id,
            } => Command::SpawnArmy {
                owner: PlayerId::new(player_id),
                kind: unit_type.parse()?,
                target: PlayerId::new(target_player_id),
            },
        })
    }
}
