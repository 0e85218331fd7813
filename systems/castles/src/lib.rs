#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-player castles: hit points, upgrades, repair and the king attack clock.
//!
//! Castles are created once at session start and never removed; a castle
//! whose hit points reach zero is merely defeated.

use std::collections::BTreeMap;

use bastion_core::{
    geometry, CastleSnapshot, CastleTarget, CellCoord, CellRect, CellRectSize, PlayerId, UpgradeError,
    UpgradeKind, Vec2, CASTLE_FOOTPRINT, CASTLE_STATS,
};

/// Authoritative state of one player's castle.
#[derive(Clone, Debug, PartialEq)]
pub struct Castle {
    player: PlayerId,
    hp: f32,
    max_hp: f32,
    center_cell: CellCoord,
    upgrades: Vec<UpgradeKind>,
    gold_per_kill_bonus: u32,
    last_king_attack: Option<f64>,
}

impl Castle {
    fn new(player: PlayerId, center_cell: CellCoord) -> Self {
        Self {
            player,
            hp: CASTLE_STATS.max_hp,
            max_hp: CASTLE_STATS.max_hp,
            center_cell,
            upgrades: Vec::new(),
            gold_per_kill_bonus: 0,
            last_king_attack: None,
        }
    }

    /// Player owning the castle.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Current hit points.
    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Reports whether the castle still stands.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Cell whose top-left corner is the castle centre; pathing targets it.
    #[must_use]
    pub const fn center_cell(&self) -> CellCoord {
        self.center_cell
    }

    /// Continuous centre of the footprint.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.target().position()
    }

    /// The castle as a pathing target.
    #[must_use]
    pub const fn target(&self) -> CastleTarget {
        CastleTarget {
            player: self.player,
            cell: self.center_cell,
        }
    }

    /// Cells covered by the castle.
    #[must_use]
    pub fn footprint(&self) -> CellRect {
        footprint_around(self.center_cell)
    }

    /// Extra gold awarded per kill credited to the owner.
    #[must_use]
    pub const fn gold_per_kill_bonus(&self) -> u32 {
        self.gold_per_kill_bonus
    }

    /// One-time upgrades purchased so far.
    #[must_use]
    pub fn upgrades(&self) -> &[UpgradeKind] {
        &self.upgrades
    }

    /// Captures an immutable snapshot of the castle.
    #[must_use]
    pub fn snapshot(&self) -> CastleSnapshot {
        let center = self.center();
        CastleSnapshot {
            player: self.player,
            hp: self.hp,
            max_hp: self.max_hp,
            center_x: center.x,
            center_y: center.y,
            upgrades: self.upgrades.clone(),
        }
    }
}

/// Outcome of a hit applied to a castle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastleHit {
    /// Damage actually removed, never more than the hit points left.
    pub applied: f32,
    /// Hit points left after the hit.
    pub remaining_hp: f32,
    /// This hit brought the castle down.
    pub destroyed: bool,
}

/// Registry of every castle in the session.
#[derive(Clone, Debug, Default)]
pub struct CastleManager {
    castles: BTreeMap<PlayerId, Castle>,
}

impl CastleManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every castle with fresh ones for the provided players.
    ///
    /// Players are assigned the fixed slots returned by [`castle_slots`] in
    /// the order given. Returns the footprints the grid must reserve.
    pub fn init(&mut self, players: &[PlayerId], columns: u32, rows: u32) -> Vec<CellRect> {
        self.castles.clear();
        let slots = castle_slots(players.len(), columns, rows);
        players
            .iter()
            .zip(slots)
            .map(|(player, slot)| {
                let castle = Castle::new(*player, slot);
                let footprint = castle.footprint();
                let _ = self.castles.insert(*player, castle);
                footprint
            })
            .collect()
    }

    /// Castle of the provided player.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> Option<&Castle> {
        self.castles.get(&player)
    }

    /// Every castle, ordered by player.
    pub fn iter(&self) -> impl Iterator<Item = &Castle> {
        self.castles.values()
    }

    /// Castles that still stand, ordered by player.
    pub fn alive(&self) -> impl Iterator<Item = &Castle> {
        self.castles.values().filter(|castle| castle.is_alive())
    }

    /// Every standing castle as a pathing target.
    #[must_use]
    pub fn targets(&self) -> Vec<CastleTarget> {
        self.alive().map(Castle::target).collect()
    }

    /// Snapshots of every castle, ordered by player.
    #[must_use]
    pub fn snapshots(&self) -> Vec<CastleSnapshot> {
        self.castles.values().map(Castle::snapshot).collect()
    }

    /// Applies an upgrade after validating type, ownership and prerequisites.
    ///
    /// The caller is responsible for charging [`UpgradeKind::stats`] cost and
    /// refunding it when this returns an error.
    pub fn upgrade(
        &mut self,
        player: PlayerId,
        upgrade: UpgradeKind,
    ) -> Result<CastleSnapshot, UpgradeError> {
        let castle = self
            .castles
            .get_mut(&player)
            .ok_or(UpgradeError::UnknownPlayer(player))?;
        if !castle.is_alive() {
            return Err(UpgradeError::CastleDestroyed);
        }

        let stats = upgrade.stats();
        if stats.one_time && castle.upgrades.contains(&upgrade) {
            return Err(UpgradeError::AlreadyPurchased(upgrade));
        }
        if let Some(requires) = stats.requires {
            if !castle.upgrades.contains(&requires) {
                return Err(UpgradeError::MissingPrerequisite { upgrade, requires });
            }
        }

        castle.max_hp += stats.max_hp_bonus;
        castle.hp = (castle.hp + stats.max_hp_bonus + stats.heal).min(castle.max_hp);
        castle.gold_per_kill_bonus += stats.gold_per_kill;
        if stats.one_time {
            castle.upgrades.push(upgrade);
        }
        tracing::debug!(player = player.get(), %upgrade, hp = castle.hp, "castle upgraded");
        Ok(castle.snapshot())
    }

    /// Restores the fixed repair amount, clamped at the maximum.
    pub fn repair(&mut self, player: PlayerId) -> Result<CastleSnapshot, UpgradeError> {
        self.upgrade(player, UpgradeKind::Repair)
    }

    /// Applies damage to a castle, clamping hit points at zero.
    ///
    /// Returns `None` when the player has no castle or it already fell.
    pub fn take_damage(&mut self, player: PlayerId, amount: f32) -> Option<CastleHit> {
        let castle = self.castles.get_mut(&player)?;
        if !castle.is_alive() {
            return None;
        }
        let applied = amount.max(0.0).min(castle.hp);
        castle.hp -= applied;
        if castle.hp <= 0.0 {
            castle.hp = 0.0;
        }
        Some(CastleHit {
            applied,
            remaining_hp: castle.hp,
            destroyed: !castle.is_alive(),
        })
    }

    /// Defeat condition: every castle has fallen.
    #[must_use]
    pub fn is_all_destroyed(&self) -> bool {
        self.castles.values().all(|castle| !castle.is_alive())
    }

    /// Standing castle closest to `position`, ties going to the lowest player.
    #[must_use]
    pub fn nearest_castle(&self, position: Vec2) -> Option<PlayerId> {
        self.alive()
            .map(|castle| (geometry::distance(castle.center(), position), castle.player))
            .fold(None, |best: Option<(f32, PlayerId)>, candidate| match best {
                Some(current) if current.0 <= candidate.0 => Some(current),
                _ => Some(candidate),
            })
            .map(|(_, player)| player)
    }

    /// Standing castles whose king attack is off cooldown at `now`.
    #[must_use]
    pub fn ready_kings(&self, now: f64) -> Vec<(PlayerId, Vec2)> {
        let cooldown = f64::from(CASTLE_STATS.king_cooldown);
        self.alive()
            .filter(|castle| {
                castle
                    .last_king_attack
                    .map_or(true, |last| now - last >= cooldown)
            })
            .map(|castle| (castle.player, castle.center()))
            .collect()
    }

    /// Restarts the king attack cooldown of the player's castle.
    pub fn record_king_attack(&mut self, player: PlayerId, now: f64) {
        if let Some(castle) = self.castles.get_mut(&player) {
            castle.last_king_attack = Some(now);
        }
    }
}

/// Fixed castle centre cells for a session with `players` players.
///
/// One player sits in the middle; two split the map horizontally; three and
/// four occupy quadrants.
#[must_use]
pub fn castle_slots(players: usize, columns: u32, rows: u32) -> Vec<CellCoord> {
    let quarter_x = columns / 4;
    let quarter_y = rows / 4;
    let half_x = columns / 2;
    let half_y = rows / 2;
    let three_x = columns - quarter_x;
    let three_y = rows - quarter_y;
    let slots = match players {
        0 => Vec::new(),
        1 => vec![(half_x, half_y)],
        2 => vec![(quarter_x, half_y), (three_x, half_y)],
        3 => vec![(quarter_x, quarter_y), (three_x, quarter_y), (half_x, three_y)],
        _ => vec![
            (quarter_x, quarter_y),
            (three_x, quarter_y),
            (quarter_x, three_y),
            (three_x, three_y),
        ],
    };
    slots
        .into_iter()
        .map(|(column, row)| CellCoord::new(column, row))
        .collect()
}

fn footprint_around(center: CellCoord) -> CellRect {
    let half = CASTLE_FOOTPRINT / 2;
    CellRect::from_origin_and_size(
        CellCoord::new(
            center.column().saturating_sub(half),
            center.row().saturating_sub(half),
        ),
        CellRectSize::new(CASTLE_FOOTPRINT, CASTLE_FOOTPRINT),
    )
}
