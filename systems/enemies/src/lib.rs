#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy pool: spawning on map edges, path following and hit bookkeeping.
//!
//! Enemies walk from their spawn cell toward the nearest standing castle.
//! From [`CLIMBING_WAVE`] onward they plan over the climbable view of the
//! grid, crossing walls at a speed penalty instead of routing around them.

use std::collections::BTreeMap;

use bastion_core::{
    geometry, CastleTarget, CellCoord, Edge, EnemyId, EnemyKind, EnemySnapshot, EnemySpecial,
    Vec2,
};
use bastion_world::{find_path, nearest_walkable, walkable_on_edge, Grid, Route, Walkability};
use rand::Rng;

/// Distance from a castle centre at which an enemy counts as arrived.
pub const CASTLE_REACH_RADIUS: f32 = 3.0;

/// First zombie wave whose enemies climb over walls.
pub const CLIMBING_WAVE: u32 = 5;

/// How far a repath may look for a free cell when the enemy stands on a blocked one.
const REPATH_SEARCH_RADIUS: u32 = 2;

/// A live enemy.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    wave: u32,
    position: Vec2,
    hp: f32,
    max_hp: f32,
    speed: f32,
    climbs: bool,
    route: Route,
    target: CastleTarget,
    special_cooldown: f32,
}

impl Enemy {
    /// Identifier of the enemy.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Kind of the enemy.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Zombie wave the enemy was spawned in.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
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

    /// Wave-scaled maximum hit points.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Damage dealt to a castle on arrival and per second of wall melee.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.kind.stats().damage
    }

    /// Gold released when the enemy is killed.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.kind.stats().reward
    }

    /// Reports whether the enemy deals double damage to walls.
    #[must_use]
    pub fn is_wall_breaker(&self) -> bool {
        matches!(self.kind.stats().special, Some(EnemySpecial::WallBreaker))
    }

    /// Reports whether the enemy may cross wall cells.
    #[must_use]
    pub const fn climbs(&self) -> bool {
        self.climbs
    }

    /// Castle the enemy is heading for.
    #[must_use]
    pub const fn target(&self) -> CastleTarget {
        self.target
    }

    /// Waypoints left on the enemy's route.
    #[must_use]
    pub fn remaining_path(&self) -> &[CellCoord] {
        self.route.remaining()
    }

    /// Captures an immutable snapshot of the enemy.
    #[must_use]
    pub fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            hp: self.hp,
            max_hp: self.max_hp,
            speed: self.speed,
        }
    }

    fn has_arrived(&self) -> bool {
        self.route.is_finished()
            || geometry::distance(self.position, self.target.position()) <= CASTLE_REACH_RADIUS
    }
}

/// Outcome of a hit applied to an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyHit {
    /// Damage actually removed.
    pub applied: f32,
    /// Hit points left after the hit.
    pub remaining_hp: f32,
    /// Present when this hit killed the enemy.
    pub kill: Option<EnemyKill>,
}

/// Record of a kill, produced exactly once per enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyKill {
    /// Identifier of the dead enemy.
    pub enemy: EnemyId,
    /// Kind of the dead enemy.
    pub kind: EnemyKind,
    /// Position of death.
    pub position: Vec2,
    /// Gold reward released.
    pub reward: u32,
}

/// A periodic special ability that came off cooldown this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpecialTrigger {
    /// Enemy performing the special.
    pub enemy: EnemyId,
    /// Position of the enemy.
    pub position: Vec2,
    /// Ability to resolve.
    pub special: EnemySpecial,
}

/// Owns every live enemy.
#[derive(Clone, Debug, Default)]
pub struct EnemyManager {
    enemies: BTreeMap<EnemyId, Enemy>,
    next_id: u32,
}

impl EnemyManager {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every enemy and restarts identifier allocation.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of live enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    /// Reports whether no enemy is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Enemy with the provided identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Live enemies ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    /// Snapshots of every live enemy, ordered by identifier.
    #[must_use]
    pub fn snapshots(&self) -> Vec<EnemySnapshot> {
        self.enemies.values().map(Enemy::snapshot).collect()
    }

    /// Spawns an enemy at a random point of `edge`.
    ///
    /// A blocked spawn point slides along the edge to the closest free cell.
    /// Returns `None` when the edge is sealed or no castle is standing.
    pub fn spawn_enemy<R>(
        &mut self,
        kind: EnemyKind,
        edge: Edge,
        wave: u32,
        grid: &Grid,
        targets: &[CastleTarget],
        rng: &mut R,
    ) -> Option<EnemySnapshot>
    where
        R: Rng + ?Sized,
    {
        let length = edge.length(grid.columns(), grid.rows());
        if length == 0 {
            return None;
        }
        let offset = rng.gen_range(0..length);
        let cell = if wave >= CLIMBING_WAVE {
            walkable_on_edge(&grid.climbable(), edge, offset)
        } else {
            walkable_on_edge(grid, edge, offset)
        };
        let Some(cell) = cell else {
            tracing::warn!(%kind, ?edge, "no free spawn cell on edge");
            return None;
        };
        self.spawn_at(kind, cell, wave, grid, targets)
    }

    /// Spawns an enemy on a specific cell, heading for the nearest castle.
    pub fn spawn_at(
        &mut self,
        kind: EnemyKind,
        cell: CellCoord,
        wave: u32,
        grid: &Grid,
        targets: &[CastleTarget],
    ) -> Option<EnemySnapshot> {
        let position = geometry::cell_center(cell);
        let target = nearest_target(targets, position)?;
        let climbs = wave >= CLIMBING_WAVE;
        let path = plan(grid, climbs, cell, target.cell);
        if path.is_empty() {
            tracing::warn!(%kind, column = cell.column(), row = cell.row(), "enemy spawned without a path");
        }

        self.next_id += 1;
        let id = EnemyId::new(self.next_id);
        let max_hp = kind.scaled_hp(wave);
        let enemy = Enemy {
            id,
            kind,
            wave,
            position,
            hp: max_hp,
            max_hp,
            speed: kind.scaled_speed(wave),
            climbs,
            route: Route::new(path),
            target,
            special_cooldown: special_cooldown(kind.stats().special),
        };
        let snapshot = enemy.snapshot();
        let _ = self.enemies.insert(id, enemy);
        tracing::debug!(enemy = id.get(), %kind, wave, "enemy spawned");
        Some(snapshot)
    }

    /// Advances every enemy along its route.
    ///
    /// Returns the enemies that are at their castle, either because the route
    /// ran out or because they came within [`CASTLE_REACH_RADIUS`] of it.
    pub fn update(&mut self, dt: f32, grid: &Grid) -> Vec<EnemyId> {
        let mut reached = Vec::new();
        for enemy in self.enemies.values_mut() {
            if !enemy.has_arrived() {
                let climbs = enemy.climbs;
                enemy
                    .route
                    .advance(&mut enemy.position, enemy.speed * dt, |cell| {
                        climb_factor(grid, climbs, cell)
                    });
            }
            if enemy.has_arrived() {
                reached.push(enemy.id);
            }
        }
        reached
    }

    /// Applies damage, clamping hit points at zero.
    ///
    /// A killed enemy is removed and reported through [`EnemyHit::kill`];
    /// further hits on it return `None`, so its reward is paid once.
    pub fn take_damage(&mut self, id: EnemyId, amount: f32) -> Option<EnemyHit> {
        let enemy = self.enemies.get_mut(&id)?;
        let applied = amount.max(0.0).min(enemy.hp);
        enemy.hp -= applied;
        if enemy.hp > 0.0 {
            return Some(EnemyHit {
                applied,
                remaining_hp: enemy.hp,
                kill: None,
            });
        }

        let enemy = self.enemies.remove(&id)?;
        Some(EnemyHit {
            applied,
            remaining_hp: 0.0,
            kill: Some(EnemyKill {
                enemy: id,
                kind: enemy.kind,
                position: enemy.position,
                reward: enemy.reward(),
            }),
        })
    }

    /// Removes an enemy without paying any reward.
    pub fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.enemies.remove(&id)
    }

    /// Heals every enemy within `radius` of `center` by a fraction of its
    /// maximum hit points. Returns the number of enemies healed.
    pub fn heal_around(&mut self, center: Vec2, radius: f32, fraction: f32) -> usize {
        let mut healed = 0;
        for enemy in self.enemies.values_mut() {
            if geometry::distance(enemy.position, center) > radius || enemy.hp >= enemy.max_hp {
                continue;
            }
            enemy.hp = (enemy.hp + enemy.max_hp * fraction).min(enemy.max_hp);
            healed += 1;
        }
        healed
    }

    /// Runs the special-ability clocks and returns the specials that fire now.
    pub fn tick_specials(&mut self, dt: f32) -> Vec<SpecialTrigger> {
        let mut triggers = Vec::new();
        for enemy in self.enemies.values_mut() {
            let Some(special) = enemy.kind.stats().special else {
                continue;
            };
            let cooldown = match special {
                EnemySpecial::Slam { cooldown, .. } | EnemySpecial::WarCry { cooldown, .. } => {
                    cooldown
                }
                EnemySpecial::WallBreaker => continue,
            };
            enemy.special_cooldown -= dt;
            if enemy.special_cooldown <= 0.0 {
                enemy.special_cooldown = cooldown;
                triggers.push(SpecialTrigger {
                    enemy: enemy.id,
                    position: enemy.position,
                    special,
                });
            }
        }
        triggers
    }

    /// Nearest enemy within `range` of `point`, ties going to the lowest id.
    #[must_use]
    pub fn nearest_within(&self, point: Vec2, range: f32) -> Option<(EnemyId, Vec2)> {
        let mut best: Option<(f32, EnemyId, Vec2)> = None;
        for enemy in self.enemies.values() {
            let distance = geometry::distance(enemy.position, point);
            if distance > range {
                continue;
            }
            if best.map_or(true, |(current, _, _)| distance < current) {
                best = Some((distance, enemy.id, enemy.position));
            }
        }
        best.map(|(_, id, position)| (id, position))
    }

    /// Every enemy within `radius` of `point`, ordered by identifier.
    #[must_use]
    pub fn within(&self, point: Vec2, radius: f32) -> Vec<EnemyId> {
        self.enemies
            .values()
            .filter(|enemy| geometry::distance(enemy.position, point) <= radius)
            .map(|enemy| enemy.id)
            .collect()
    }

    /// Recomputes the route of every walking enemy that would cross one of
    /// `blocked`. Enemies for which no new route exists keep their old one.
    ///
    /// Returns the number of enemies that received a new route.
    pub fn repath(&mut self, grid: &Grid, blocked: &[CellCoord]) -> usize {
        let mut rerouted = 0;
        for enemy in self.enemies.values_mut() {
            if enemy.climbs || !enemy.route.crosses(blocked) {
                continue;
            }
            let Some(start) =
                nearest_walkable(grid, geometry::cell_of(enemy.position), REPATH_SEARCH_RADIUS)
            else {
                continue;
            };
            let path = find_path(grid, start, enemy.target.cell);
            if path.is_empty() {
                continue;
            }
            enemy.route = Route::new(path);
            rerouted += 1;
        }
        if rerouted > 0 {
            tracing::debug!(rerouted, "enemies rerouted around new building");
        }
        rerouted
    }
}

fn nearest_target(targets: &[CastleTarget], position: Vec2) -> Option<CastleTarget> {
    let mut best: Option<(f32, CastleTarget)> = None;
    for target in targets {
        let distance = geometry::distance(target.position(), position);
        if best.map_or(true, |(current, _)| distance < current) {
            best = Some((distance, *target));
        }
    }
    best.map(|(_, target)| target)
}

fn plan(grid: &Grid, climbs: bool, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
    if climbs {
        find_path(&grid.climbable(), start, goal)
    } else {
        find_path(grid, start, goal)
    }
}

fn climb_factor(grid: &Grid, climbs: bool, cell: CellCoord) -> f32 {
    if !climbs || grid.is_walkable(cell) {
        return 1.0;
    }
    1.0 / (1.0 + f32::from(grid.wall_height(cell)))
}

fn special_cooldown(special: Option<EnemySpecial>) -> f32 {
    match special {
        Some(EnemySpecial::Slam { cooldown, .. } | EnemySpecial::WarCry { cooldown, .. }) => {
            cooldown
        }
        _ => 0.0,
    }
}
