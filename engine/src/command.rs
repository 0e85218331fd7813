use bastion_core::{
    ArmyKind, ArmyUnitSnapshot, BuildingId, BuildingKind, BuildingSnapshot, CastleSnapshot,
    CellCoord, CommandError, PlayerId, UpgradeKind,
};
use serde::{Deserialize, Serialize};

use crate::GameEngine;

/// Player intent delivered by a transport adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Places a building, or stacks a wall, with its origin at `cell`.
    PlaceBuilding {
        /// Player paying for the building.
        player: PlayerId,
        /// Building to construct.
        kind: BuildingKind,
        /// Top-left cell of the footprint.
        cell: CellCoord,
    },
    /// Moves an existing building so its origin lands on `cell`.
    MoveBuilding {
        /// Building to relocate.
        building: BuildingId,
        /// New top-left cell of the footprint.
        cell: CellCoord,
    },
    /// Sells a building back for half its invested cost.
    SellBuilding {
        /// Building to sell.
        building: BuildingId,
        /// Player requesting the sale; must own the building.
        seller: PlayerId,
    },
    /// Buys a castle upgrade.
    UpgradeCastle {
        /// Player whose castle is upgraded.
        player: PlayerId,
        /// Upgrade to purchase.
        upgrade: UpgradeKind,
    },
    /// Buys a castle repair.
    RepairCastle {
        /// Player whose castle is repaired.
        player: PlayerId,
    },
    /// Buys an army unit and sends it against another castle.
    SpawnArmy {
        /// Player paying for the unit.
        owner: PlayerId,
        /// Unit to deploy.
        kind: ArmyKind,
        /// Player whose castle is attacked.
        target: PlayerId,
    },
}

/// Payload returned by a successful command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CommandReply {
    /// The placed, stacked or moved building.
    Building(BuildingSnapshot),
    /// Gold refunded by a sale.
    Refund {
        /// The sold building as it was before removal.
        building: BuildingSnapshot,
        /// Gold credited to the seller.
        gold: u32,
    },
    /// The castle after an upgrade or repair.
    Castle(CastleSnapshot),
    /// The deployed army unit.
    ArmyUnit(ArmyUnitSnapshot),
}

impl GameEngine {
    /// Dispatches a command to the matching handler.
    pub fn apply(&mut self, command: Command) -> Result<CommandReply, CommandError> {
        match command {
            Command::PlaceBuilding { player, kind, cell } => self
                .handle_place_building(player, kind, cell)
                .map(CommandReply::Building),
            Command::MoveBuilding { building, cell } => self
                .handle_move_building(building, cell)
                .map(CommandReply::Building),
            Command::SellBuilding { building, seller } => self
                .handle_sell_building(building, seller)
                .map(|(building, gold)| CommandReply::Refund { building, gold }),
            Command::UpgradeCastle { player, upgrade } => self
                .handle_upgrade_castle(player, upgrade)
                .map(CommandReply::Castle),
            Command::RepairCastle { player } => self
                .handle_repair_castle(player)
                .map(CommandReply::Castle),
            Command::SpawnArmy {
                owner,
                kind,
                target,
            } => self
                .handle_spawn_army(owner, kind, target)
                .map(CommandReply::ArmyUnit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_survive_the_wire() {
        let command = Command::PlaceBuilding {
            player: PlayerId::new(3),
            kind: BuildingKind::Ballista,
            cell: CellCoord::new(4, 9),
        };
        let bytes = bincode::serialize(&command).expect("encode");
        let decoded: Command = bincode::deserialize(&bytes).expect("decode");
        assert_eq!(decoded, command);
    }
}
