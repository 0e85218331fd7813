#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative Bastion session.
//!
//! [`GameEngine`] owns the grid and every manager. An external driver calls
//! [`GameEngine::init`] once and then [`GameEngine::tick`] on a fixed cadence;
//! player commands are applied between ticks through the `handle_*` methods
//! or [`GameEngine::apply`]. Every state change is published to the
//! subscribed [`EventSink`]s.

mod command;
mod sink;

pub use command::{Command, CommandReply};
pub use sink::{EventLog, EventSink};

use std::{collections::BTreeSet, fmt, time::Duration};

use bastion_core::{
    ArmyError, ArmyKind, ArmyUnitSnapshot, BuildingId, BuildingKind, BuildingSnapshot,
    CastleSnapshot, CellCoord, CellRect, CommandError, EconomyError, FinalStats, FullState,
    GameConfig, GameEvent, GameOutcome, PlayerId, UpgradeKind, Vec2, MAX_PLAYERS,
};
use bastion_system_army::ArmyManager;
use bastion_system_buildings::BuildingManager;
use bastion_system_castles::CastleManager;
use bastion_system_combat::{Battlefield, CombatClock, CombatManager, Kill};
use bastion_system_economy::EconomyManager;
use bastion_system_enemies::EnemyManager;
use bastion_system_waves::{WaveManager, WaveTiming};
use bastion_world::Grid;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// [`GameEngine::init`] has not been called.
    NotStarted,
    /// Ticks advance the simulation and commands are accepted.
    Running,
    /// A terminal outcome was reached; the session is frozen.
    Over(GameOutcome),
}

/// Reasons a session cannot be initialised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InitError {
    /// At least one player is required.
    #[error("a session needs at least one player")]
    NoPlayers,
    /// More players than castle slots.
    #[error("{count} players requested, at most {max} are supported", max = MAX_PLAYERS)]
    TooManyPlayers {
        /// Number of players requested.
        count: usize,
    },
    /// The same player was listed twice.
    #[error("player {0:?} listed more than once")]
    DuplicatePlayer(PlayerId),
}

/// Internal inconsistency detected while stepping the simulation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineFault {
    /// A gold ledger operation failed.
    #[error("ledger fault: {0}")]
    Economy(#[from] EconomyError),
}

impl EngineFault {
    /// Name of the manager that reported the fault, for log filtering.
    #[must_use]
    pub const fn subsystem(&self) -> &'static str {
        match self {
            Self::Economy(_) => "economy",
        }
    }
}

/// Orchestrates every manager of one session.
pub struct GameEngine {
    config: GameConfig,
    grid: Grid,
    economy: EconomyManager,
    castles: CastleManager,
    enemies: EnemyManager,
    buildings: BuildingManager,
    army: ArmyManager,
    waves: WaveManager,
    combat: CombatManager,
    rng: ChaCha8Rng,
    players: Vec<PlayerId>,
    elapsed: f64,
    state: SessionState,
    sinks: Vec<Box<dyn EventSink + Send>>,
}

impl fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEngine")
            .field("players", &self.players)
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("phase", &self.waves.phase())
            .field("enemies", &self.enemies.len())
            .field("buildings", &self.buildings.len())
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Creates an engine that waits for [`GameEngine::init`].
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self {
            grid: Grid::new(config.grid_columns, config.grid_rows),
            economy: EconomyManager::new(),
            castles: CastleManager::new(),
            enemies: EnemyManager::new(),
            buildings: BuildingManager::new(),
            army: ArmyManager::new(),
            waves: WaveManager::new(WaveTiming::from_config(&config)),
            combat: CombatManager::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            players: Vec::new(),
            elapsed: 0.0,
            state: SessionState::NotStarted,
            sinks: Vec::new(),
            config,
        }
    }

    /// Registers a sink that receives every subsequent event.
    pub fn subscribe<S>(&mut self, sink: S)
    where
        S: EventSink + Send + 'static,
    {
        self.sinks.push(Box::new(sink));
    }

    /// Starts a fresh session for `players`.
    ///
    /// Builds the grid with one castle per player, resets every manager and
    /// the random stream, and seeds each ledger with the starting gold.
    pub fn init(&mut self, players: &[PlayerId]) -> Result<(), InitError> {
        if players.is_empty() {
            return Err(InitError::NoPlayers);
        }
        if players.len() > MAX_PLAYERS {
            return Err(InitError::TooManyPlayers {
                count: players.len(),
            });
        }
        let mut seen = BTreeSet::new();
        if let Some(duplicate) = players.iter().find(|player| !seen.insert(**player)) {
            return Err(InitError::DuplicatePlayer(*duplicate));
        }

        let (columns, rows) = (self.config.grid_columns, self.config.grid_rows);
        self.grid = Grid::new(columns, rows);
        for footprint in self.castles.init(players, columns, rows) {
            self.grid.place_castle(footprint);
        }
        self.economy.init(players, self.config.starting_gold);
        self.enemies.clear();
        self.buildings.clear();
        self.army.clear();
        self.waves = WaveManager::new(WaveTiming::from_config(&self.config));
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.players = players.to_vec();
        self.elapsed = 0.0;
        self.state = SessionState::Running;
        tracing::info!(
            players = players.len(),
            columns,
            rows,
            seed = self.config.seed,
            "session initialised"
        );

        let mut events = vec![GameEvent::PhaseChanged {
            phase: self.waves.phase(),
        }];
        events.extend(self.castles.snapshots().into_iter().map(GameEvent::CastleUpdated));
        self.publish(events);
        Ok(())
    }

    /// Advances the simulation by `dt`.
    ///
    /// Does nothing before [`GameEngine::init`] or after the game ended.
    /// Internal faults are logged and the session keeps running.
    pub fn tick(&mut self, dt: Duration) {
        if self.state != SessionState::Running {
            return;
        }
        let mut events = Vec::new();
        if let Err(fault) = self.step(dt.as_secs_f32(), &mut events) {
            tracing::error!(
                subsystem = fault.subsystem(),
                %fault,
                elapsed = self.elapsed,
                "tick aborted"
            );
        }
        self.publish(events);
    }

    fn step(&mut self, dt: f32, events: &mut Vec<GameEvent>) -> Result<(), EngineFault> {
        self.elapsed += f64::from(dt);

        let mut spawns = Vec::new();
        self.waves
            .update(dt, self.enemies.len(), &mut self.rng, events, &mut spawns);
        if !spawns.is_empty() {
            let targets = self.castles.targets();
            for request in spawns {
                let Some(enemy) = self.enemies.spawn_enemy(
                    request.kind,
                    request.edge,
                    request.wave,
                    &self.grid,
                    &targets,
                    &mut self.rng,
                ) else {
                    continue;
                };
                events.push(GameEvent::EnemySpawned {
                    enemy: enemy.id,
                    kind: enemy.kind,
                    position: Vec2::new(enemy.x, enemy.y),
                    hp: enemy.hp,
                    wave: request.wave,
                });
            }
        }

        let reached = self.enemies.update(dt, &self.grid);
        let _ = self.army.update_units(dt);

        let field = Battlefield {
            grid: &mut self.grid,
            enemies: &mut self.enemies,
            buildings: &mut self.buildings,
            castles: &mut self.castles,
            army: &mut self.army,
        };
        let clock = CombatClock {
            dt,
            now: self.elapsed,
            castle_auto_attack: self.config.castle_auto_attack,
        };
        let kills = self.combat.resolve(field, clock, &reached, events);
        for kill in kills {
            self.route_reward(kill, events)?;
        }

        self.check_end(events);
        Ok(())
    }

    fn route_reward(&mut self, kill: Kill, events: &mut Vec<GameEvent>) -> Result<(), EngineFault> {
        self.economy.record_kill();
        match kill.killer {
            Some(player) if self.players.contains(&player) => {
                self.credit_kill(player, kill.reward, events)
            }
            _ => {
                for (player, share) in split_reward(kill.reward, &self.players) {
                    self.credit_kill(player, share, events)?;
                }
                Ok(())
            }
        }
    }

    fn credit_kill(
        &mut self,
        player: PlayerId,
        reward: u32,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), EngineFault> {
        let bonus = self
            .castles
            .get(player)
            .map_or(0, |castle| castle.gold_per_kill_bonus());
        let amount = reward.saturating_add(bonus);
        if amount == 0 {
            return Ok(());
        }
        let gold = self.economy.earn(player, amount)?;
        events.push(GameEvent::GoldChanged {
            player,
            gold,
            delta: i64::from(amount),
        });
        Ok(())
    }

    fn check_end(&mut self, events: &mut Vec<GameEvent>) {
        let outcome = if self.castles.is_all_destroyed() {
            GameOutcome::Defeat
        } else if self.waves.is_complete() && self.enemies.is_empty() {
            GameOutcome::Victory
        } else {
            return;
        };
        self.state = SessionState::Over(outcome);
        let stats = self.final_stats();
        tracing::info!(
            ?outcome,
            wave = stats.wave_reached,
            kills = stats.total_kills,
            duration = stats.duration_secs,
            "game over"
        );
        events.push(GameEvent::GameOver { outcome, stats });
    }

    fn final_stats(&self) -> FinalStats {
        FinalStats {
            wave_reached: self.waves.zombie_wave(),
            total_kills: self.economy.total_kills(),
            total_gold_earned: self.economy.total_earned(),
            total_buildings_placed: self.economy.total_buildings_placed(),
            duration_secs: self.elapsed,
        }
    }

    fn publish(&mut self, events: Vec<GameEvent>) {
        for event in &events {
            for sink in &mut self.sinks {
                sink.publish(event);
            }
        }
    }

    fn ensure_running(&self) -> Result<(), CommandError> {
        match self.state {
            SessionState::NotStarted => Err(CommandError::NotStarted),
            SessionState::Over(_) => Err(CommandError::GameOver),
            SessionState::Running => Ok(()),
        }
    }

    fn gold_of(&self, player: PlayerId) -> Result<u32, CommandError> {
        self.economy
            .gold(player)
            .ok_or(CommandError::UnknownPlayer(player))
    }

    /// Places a building for `player` with its footprint origin at `cell`.
    ///
    /// Placing a wall on an identical wall stacks it. Gold is charged only
    /// after every check passed.
    pub fn handle_place_building(
        &mut self,
        player: PlayerId,
        kind: BuildingKind,
        cell: CellCoord,
    ) -> Result<BuildingSnapshot, CommandError> {
        let result = self.place_building(player, kind, cell);
        rejected("place_building", result)
    }

    fn place_building(
        &mut self,
        player: PlayerId,
        kind: BuildingKind,
        cell: CellCoord,
    ) -> Result<BuildingSnapshot, CommandError> {
        self.ensure_running()?;
        let gold = self.gold_of(player)?;
        let targets = self.castles.targets();
        let outcome =
            self.buildings
                .place_building(kind, cell, player, &mut self.grid, &targets, gold)?;
        let gold = self.economy.spend_gold(player, outcome.cost)?;
        if !outcome.stacked {
            self.economy.record_building_placed();
        }
        if let Some(blocked) = outcome.blocked {
            self.repath(blocked);
        }
        self.publish(vec![GameEvent::GoldChanged {
            player,
            gold,
            delta: -i64::from(outcome.cost),
        }]);
        Ok(outcome.building)
    }

    /// Moves a building so its footprint origin lands on `cell`.
    pub fn handle_move_building(
        &mut self,
        building: BuildingId,
        cell: CellCoord,
    ) -> Result<BuildingSnapshot, CommandError> {
        let result = self.move_building(building, cell);
        rejected("move_building", result)
    }

    fn move_building(
        &mut self,
        building: BuildingId,
        cell: CellCoord,
    ) -> Result<BuildingSnapshot, CommandError> {
        self.ensure_running()?;
        let targets = self.castles.targets();
        let outcome = self
            .buildings
            .move_building(building, cell, &mut self.grid, &targets)?;
        self.repath(outcome.occupied);
        Ok(outcome.building)
    }

    /// Sells a building owned by `seller`.
    ///
    /// Returns the removed building and the gold refunded.
    pub fn handle_sell_building(
        &mut self,
        building: BuildingId,
        seller: PlayerId,
    ) -> Result<(BuildingSnapshot, u32), CommandError> {
        let result = self.sell_building(building, seller);
        rejected("sell_building", result)
    }

    fn sell_building(
        &mut self,
        building: BuildingId,
        seller: PlayerId,
    ) -> Result<(BuildingSnapshot, u32), CommandError> {
        self.ensure_running()?;
        let _ = self.gold_of(seller)?;
        let sale = self
            .buildings
            .sell_building(building, seller, &mut self.grid)?;
        let gold = self.economy.refund(seller, sale.refund)?;
        self.publish(vec![GameEvent::GoldChanged {
            player: seller,
            gold,
            delta: i64::from(sale.refund),
        }]);
        Ok((sale.building, sale.refund))
    }

    /// Buys a castle upgrade for `player`.
    ///
    /// The cost is charged first and refunded in full if the upgrade is
    /// rejected.
    pub fn handle_upgrade_castle(
        &mut self,
        player: PlayerId,
        upgrade: UpgradeKind,
    ) -> Result<CastleSnapshot, CommandError> {
        let result = self.upgrade_castle(player, upgrade);
        rejected("upgrade_castle", result)
    }

    /// Buys a repair for the player's castle.
    pub fn handle_repair_castle(&mut self, player: PlayerId) -> Result<CastleSnapshot, CommandError> {
        let result = self.upgrade_castle(player, UpgradeKind::Repair);
        rejected("repair_castle", result)
    }

    fn upgrade_castle(
        &mut self,
        player: PlayerId,
        upgrade: UpgradeKind,
    ) -> Result<CastleSnapshot, CommandError> {
        self.ensure_running()?;
        let _ = self.gold_of(player)?;
        let cost = upgrade.stats().cost;
        let gold = self.economy.spend_gold(player, cost)?;
        let snapshot = match self.castles.upgrade(player, upgrade) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                let _ = self.economy.refund(player, cost)?;
                return Err(error.into());
            }
        };
        self.publish(vec![
            GameEvent::GoldChanged {
                player,
                gold,
                delta: -i64::from(cost),
            },
            GameEvent::CastleUpdated(snapshot.clone()),
        ]);
        Ok(snapshot)
    }

    /// Buys an army unit for `owner` and sends it against `target`'s castle.
    ///
    /// The cost is charged first and refunded in full when no deployment cell
    /// or route exists.
    pub fn handle_spawn_army(
        &mut self,
        owner: PlayerId,
        kind: ArmyKind,
        target: PlayerId,
    ) -> Result<ArmyUnitSnapshot, CommandError> {
        let result = self.spawn_army(owner, kind, target);
        rejected("spawn_army", result)
    }

    fn spawn_army(
        &mut self,
        owner: PlayerId,
        kind: ArmyKind,
        target: PlayerId,
    ) -> Result<ArmyUnitSnapshot, CommandError> {
        self.ensure_running()?;
        let home = self
            .castles
            .get(owner)
            .ok_or(ArmyError::UnknownOwner(owner))?;
        let enemy_castle = self
            .castles
            .get(target)
            .ok_or(ArmyError::UnknownTarget(target))?;
        if owner == target {
            return Err(ArmyError::SelfTarget.into());
        }
        if !home.is_alive() {
            return Err(ArmyError::OwnerDefeated.into());
        }
        if !enemy_castle.is_alive() {
            return Err(ArmyError::TargetDefeated.into());
        }
        let home_cell = home.center_cell();
        let target_castle = enemy_castle.target();

        let cost = kind.stats().cost;
        let gold = self.economy.spend_gold(owner, cost)?;
        let unit = match self
            .army
            .spawn_unit(kind, owner, home_cell, target_castle, &self.grid)
        {
            Ok(unit) => unit,
            Err(error) => {
                let _ = self.economy.refund(owner, cost)?;
                return Err(error.into());
            }
        };
        self.publish(vec![
            GameEvent::GoldChanged {
                player: owner,
                gold,
                delta: -i64::from(cost),
            },
            GameEvent::ArmyUnitSpawned {
                unit: unit.id,
                kind,
                owner,
                target,
                position: Vec2::new(unit.x, unit.y),
            },
        ]);
        Ok(unit)
    }

    fn repath(&mut self, blocked: CellRect) {
        let cells: Vec<CellCoord> = blocked.cells().collect();
        let enemies = self.enemies.repath(&self.grid, &cells);
        let units = self.army.repath(&self.grid, &cells);
        if enemies + units > 0 {
            tracing::debug!(enemies, units, "routes recomputed after layout change");
        }
    }

    /// Complete read-only view of the session.
    #[must_use]
    pub fn get_full_state(&self) -> FullState {
        FullState {
            enemies: self.enemies.snapshots(),
            buildings: self.buildings.snapshots(),
            castles: self.castles.snapshots(),
            army_units: self.army.snapshots(),
            phase: self.waves.phase(),
            current_zombie_wave: self.waves.zombie_wave(),
            current_invader_wave: self.waves.invader_wave(),
            time_remaining: self.waves.time_remaining(),
            players: self.economy.summaries(),
        }
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Players of the current session in join order.
    #[must_use]
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    /// Simulated seconds since [`GameEngine::init`].
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Gold held by `player`.
    #[must_use]
    pub fn gold(&self, player: PlayerId) -> Option<u32> {
        self.economy.gold(player)
    }

    /// Read access to the occupancy grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Aggregate statistics so far; final once the session is over.
    #[must_use]
    pub fn stats(&self) -> FinalStats {
        self.final_stats()
    }
}

/// Splits an ownerless reward evenly; the remainder goes to the lowest ids.
fn split_reward(reward: u32, players: &[PlayerId]) -> Vec<(PlayerId, u32)> {
    let mut sorted = players.to_vec();
    sorted.sort_unstable();
    let count = u32::try_from(sorted.len()).unwrap_or(u32::MAX).max(1);
    let share = reward / count;
    let mut remainder = reward % count;
    sorted
        .into_iter()
        .map(|player| {
            let extra = u32::from(remainder > 0);
            remainder -= extra;
            (player, share + extra)
        })
        .collect()
}

fn rejected<T>(command: &'static str, result: Result<T, CommandError>) -> Result<T, CommandError> {
    if let Err(error) = &result {
        tracing::debug!(command, %error, "command rejected");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewards_split_with_remainder_to_lowest_ids() {
        let players = [PlayerId::new(3), PlayerId::new(1), PlayerId::new(2)];
        assert_eq!(
            split_reward(5, &players),
            vec![
                (PlayerId::new(1), 2),
                (PlayerId::new(2), 2),
                (PlayerId::new(3), 1),
            ]
        );
        assert_eq!(split_reward(4, &[PlayerId::new(9)]), vec![(PlayerId::new(9), 4)]);
    }

    #[test]
    fn init_rejects_bad_rosters() {
        let mut engine = GameEngine::new(GameConfig::default());
        assert_eq!(engine.init(&[]), Err(InitError::NoPlayers));
        let crowd: Vec<_> = (1..=5).map(PlayerId::new).collect();
        assert_eq!(
            engine.init(&crowd),
            Err(InitError::TooManyPlayers { count: 5 })
        );
        assert_eq!(
            engine.init(&[PlayerId::new(1), PlayerId::new(1)]),
            Err(InitError::DuplicatePlayer(PlayerId::new(1)))
        );
        assert_eq!(engine.state(), SessionState::NotStarted);
    }

    #[test]
    fn commands_before_init_are_rejected() {
        let mut engine = GameEngine::new(GameConfig::default());
        assert_eq!(
            engine.handle_repair_castle(PlayerId::new(1)),
            Err(CommandError::NotStarted)
        );
        engine.tick(Duration::from_millis(50));
        assert_eq!(engine.elapsed(), 0.0);
    }

    #[test]
    fn ledger_faults_name_their_subsystem() {
        let alice = PlayerId::new(1);
        let mut engine = GameEngine::new(GameConfig::default());
        engine.init(&[alice]).expect("session starts");
        engine.economy = EconomyManager::new();

        let mut events = Vec::new();
        let fault = engine.credit_kill(alice, 5, &mut events).unwrap_err();
        assert_eq!(
            fault,
            EngineFault::Economy(EconomyError::UnknownPlayer(alice))
        );
        assert_eq!(fault.subsystem(), "economy");
        assert!(events.is_empty());

        engine.tick(Duration::from_millis(50));
        assert!(engine.elapsed() > 0.0);
        assert_eq!(engine.state(), SessionState::Running);
    }
}
