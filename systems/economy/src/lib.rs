#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-player gold ledger.
//!
//! Balances are unsigned and only ever move through [`EconomyManager::spend_gold`],
//! [`EconomyManager::refund`] and [`EconomyManager::earn`], so a balance can
//! never go negative: an unaffordable spend is rejected whole.

use std::collections::BTreeMap;

use bastion_core::{EconomyError, PlayerId, PlayerSummary};

/// Gold ledger plus the aggregate totals reported at game end.
#[derive(Clone, Debug, Default)]
pub struct EconomyManager {
    balances: BTreeMap<PlayerId, u32>,
    total_earned: u64,
    total_kills: u32,
    total_buildings_placed: u32,
}

impl EconomyManager {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the ledger and seeds every player with `starting_gold`.
    pub fn init(&mut self, players: &[PlayerId], starting_gold: u32) {
        *self = Self::default();
        for player in players {
            let _ = self.balances.insert(*player, starting_gold);
        }
    }

    /// Current balance of the player.
    #[must_use]
    pub fn gold(&self, player: PlayerId) -> Option<u32> {
        self.balances.get(&player).copied()
    }

    /// Players holding a ledger entry, in ascending order.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.balances.keys().copied()
    }

    /// Balances of every player, in ascending player order.
    #[must_use]
    pub fn summaries(&self) -> Vec<PlayerSummary> {
        self.balances
            .iter()
            .map(|(id, gold)| PlayerSummary {
                id: *id,
                gold: *gold,
            })
            .collect()
    }

    /// Deducts `amount` from the player's balance.
    ///
    /// Fails without touching the balance when the player is unknown or
    /// cannot afford the spend. Returns the new balance.
    pub fn spend_gold(&mut self, player: PlayerId, amount: u32) -> Result<u32, EconomyError> {
        let balance = self
            .balances
            .get_mut(&player)
            .ok_or(EconomyError::UnknownPlayer(player))?;
        if *balance < amount {
            return Err(EconomyError::InsufficientGold {
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        tracing::trace!(player = player.get(), amount, balance = *balance, "gold spent");
        Ok(*balance)
    }

    /// Returns gold from a sale or an aborted purchase. Not counted as earned.
    pub fn refund(&mut self, player: PlayerId, amount: u32) -> Result<u32, EconomyError> {
        self.credit(player, amount)
    }

    /// Credits gold from a kill reward and counts it toward the earned total.
    pub fn earn(&mut self, player: PlayerId, amount: u32) -> Result<u32, EconomyError> {
        let balance = self.credit(player, amount)?;
        self.total_earned = self.total_earned.saturating_add(u64::from(amount));
        Ok(balance)
    }

    /// Counts one enemy kill.
    pub fn record_kill(&mut self) {
        self.total_kills = self.total_kills.saturating_add(1);
    }

    /// Counts one fresh building placement.
    pub fn record_building_placed(&mut self) {
        self.total_buildings_placed = self.total_buildings_placed.saturating_add(1);
    }

    /// Gold earned from kills across all players.
    #[must_use]
    pub fn total_earned(&self) -> u64 {
        self.total_earned
    }

    /// Kills across all players.
    #[must_use]
    pub fn total_kills(&self) -> u32 {
        self.total_kills
    }

    /// Fresh building placements across all players.
    #[must_use]
    pub fn total_buildings_placed(&self) -> u32 {
        self.total_buildings_placed
    }

    fn credit(&mut self, player: PlayerId, amount: u32) -> Result<u32, EconomyError> {
        let balance = self
            .balances
            .get_mut(&player)
            .ok_or(EconomyError::UnknownPlayer(player))?;
        *balance = balance.saturating_add(amount);
        Ok(*balance)
    }
}
