#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player-purchased units marching on another player's castle.

use std::collections::BTreeMap;

use bastion_core::{
    geometry, ArmyError, ArmyKind, ArmyUnitId, ArmyUnitSnapshot, CastleTarget, CellCoord,
    PlayerId, Vec2,
};
use bastion_world::{find_path, nearest_walkable, Grid, Route};

/// Ring radius searched around the owner's castle for a deployment cell.
pub const SPAWN_SEARCH_RADIUS: u32 = 4;

/// A live army unit.
#[derive(Clone, Debug)]
pub struct ArmyUnit {
    id: ArmyUnitId,
    kind: ArmyKind,
    owner: PlayerId,
    target: CastleTarget,
    position: Vec2,
    hp: f32,
    route: Route,
    arrived: bool,
    cooldown: f32,
}

impl ArmyUnit {
    /// Identifier of the unit.
    #[must_use]
    pub const fn id(&self) -> ArmyUnitId {
        self.id
    }

    /// Kind of the unit.
    #[must_use]
    pub const fn kind(&self) -> ArmyKind {
        self.kind
    }

    /// Player who bought the unit.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Player whose castle the unit attacks.
    #[must_use]
    pub const fn target_player(&self) -> PlayerId {
        self.target.player
    }

    /// Continuous position in cell space.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current hit points.
    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    /// Reports whether the unit stands at its target castle.
    #[must_use]
    pub const fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Captures an immutable snapshot of the unit.
    #[must_use]
    pub fn snapshot(&self) -> ArmyUnitSnapshot {
        ArmyUnitSnapshot {
            id: self.id,
            kind: self.kind,
            owner: self.owner,
            target: self.target.player,
            x: self.position.x,
            y: self.position.y,
            hp: self.hp,
            max_hp: self.kind.stats().hp,
        }
    }
}

/// An attack landed by an arrived unit on its target castle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastleStrike {
    /// Attacking unit.
    pub unit: ArmyUnitId,
    /// Player whose castle is struck.
    pub target: PlayerId,
    /// Damage of the strike.
    pub damage: f32,
}

/// Outcome of a hit applied to an army unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmyHit {
    /// Damage actually removed.
    pub applied: f32,
    /// Hit points left after the hit.
    pub remaining_hp: f32,
    /// Present when the hit killed the unit, which is then removed.
    pub died: Option<(ArmyKind, PlayerId)>,
}

/// Owns every live army unit.
#[derive(Clone, Debug, Default)]
pub struct ArmyManager {
    units: BTreeMap<ArmyUnitId, ArmyUnit>,
    next_id: u32,
}

impl ArmyManager {
    /// Creates an empty army pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every unit and restarts identifier allocation.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Reports whether no unit is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit with the provided identifier.
    #[must_use]
    pub fn get(&self, id: ArmyUnitId) -> Option<&ArmyUnit> {
        self.units.get(&id)
    }

    /// Snapshots of every unit, ordered by identifier.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ArmyUnitSnapshot> {
        self.units.values().map(ArmyUnit::snapshot).collect()
    }

    /// Deploys a unit next to `home` and routes it to `target`.
    ///
    /// Ownership and target validity are checked by the caller; this only
    /// fails when no deployment cell or no route exists.
    pub fn spawn_unit(
        &mut self,
        kind: ArmyKind,
        owner: PlayerId,
        home: CellCoord,
        target: CastleTarget,
        grid: &Grid,
    ) -> Result<ArmyUnitSnapshot, ArmyError> {
        let start =
            nearest_walkable(grid, home, SPAWN_SEARCH_RADIUS).ok_or(ArmyError::NoSpawnPoint)?;
        let path = find_path(grid, start, target.cell);
        if path.is_empty() {
            return Err(ArmyError::NoPath);
        }

        self.next_id += 1;
        let id = ArmyUnitId::new(self.next_id);
        let unit = ArmyUnit {
            id,
            kind,
            owner,
            target,
            position: geometry::cell_center(start),
            hp: kind.stats().hp,
            route: Route::new(path),
            arrived: false,
            cooldown: 0.0,
        };
        let snapshot = unit.snapshot();
        let _ = self.units.insert(id, unit);
        tracing::debug!(unit = id.get(), %kind, owner = owner.get(), target = target.player.get(), "army unit deployed");
        Ok(snapshot)
    }

    /// Advances every marching unit. Returns the units that arrived this call.
    ///
    /// A unit arrives once the target castle's walls are within its attack
    /// range; it then stops and only strikes.
    pub fn update_units(&mut self, dt: f32) -> Vec<ArmyUnitId> {
        let mut arrived = Vec::new();
        for unit in self.units.values_mut().filter(|unit| !unit.arrived) {
            let stats = unit.kind.stats();
            unit.route.advance(&mut unit.position, stats.speed * dt, |_| 1.0);
            if unit.target.distance_to_walls(unit.position) <= stats.range {
                unit.arrived = true;
                arrived.push(unit.id);
            }
        }
        arrived
    }

    /// Runs attack cooldowns of arrived units and returns the strikes due now.
    pub fn castle_strikes(&mut self, dt: f32) -> Vec<CastleStrike> {
        let mut strikes = Vec::new();
        for unit in self.units.values_mut().filter(|unit| unit.arrived) {
            unit.cooldown = (unit.cooldown - dt).max(0.0);
            if unit.cooldown > 0.0 {
                continue;
            }
            let stats = unit.kind.stats();
            unit.cooldown = 1.0 / stats.attack_speed;
            strikes.push(CastleStrike {
                unit: unit.id,
                target: unit.target.player,
                damage: stats.damage,
            });
        }
        strikes
    }

    /// Nearest unit not owned by `friend` within `range` of `point`.
    #[must_use]
    pub fn nearest_hostile(&self, friend: PlayerId, point: Vec2, range: f32) -> Option<ArmyUnitId> {
        let mut best: Option<(f32, ArmyUnitId)> = None;
        for unit in self.units.values().filter(|unit| unit.owner != friend) {
            let distance = geometry::distance(unit.position, point);
            if distance <= range && best.map_or(true, |(current, _)| distance < current) {
                best = Some((distance, unit.id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Applies damage, clamping hit points at zero and removing dead units.
    pub fn take_damage(&mut self, id: ArmyUnitId, amount: f32) -> Option<ArmyHit> {
        let unit = self.units.get_mut(&id)?;
        let applied = amount.max(0.0).min(unit.hp);
        unit.hp -= applied;
        if unit.hp > 0.0 {
            return Some(ArmyHit {
                applied,
                remaining_hp: unit.hp,
                died: None,
            });
        }
        let unit = self.units.remove(&id)?;
        Some(ArmyHit {
            applied,
            remaining_hp: 0.0,
            died: Some((unit.kind, unit.owner)),
        })
    }

    /// Removes every unit sent against `target`, whose castle has fallen.
    ///
    /// Returns the removed units as `(id, kind, owner)`, ordered by id.
    pub fn disband_against(&mut self, target: PlayerId) -> Vec<(ArmyUnitId, ArmyKind, PlayerId)> {
        let doomed: Vec<ArmyUnitId> = self
            .units
            .values()
            .filter(|unit| unit.target.player == target)
            .map(|unit| unit.id)
            .collect();
        doomed
            .into_iter()
            .filter_map(|id| self.units.remove(&id))
            .map(|unit| (unit.id, unit.kind, unit.owner))
            .collect()
    }

    /// Recomputes routes of marching units that would cross one of `blocked`.
    pub fn repath(&mut self, grid: &Grid, blocked: &[CellCoord]) -> usize {
        let mut rerouted = 0;
        for unit in self
            .units
            .values_mut()
            .filter(|unit| !unit.arrived && unit.route.crosses(blocked))
        {
            let Some(start) = nearest_walkable(grid, geometry::cell_of(unit.position), 2) else {
                continue;
            };
            let path = find_path(grid, start, unit.target.cell);
            if !path.is_empty() {
                unit.route = Route::new(path);
                rerouted += 1;
            }
        }
        rerouted
    }
}
