#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick combat resolution across every entity manager.
//!
//! Resolution runs in a fixed order: tower attacks and trap detonations, the
//! castles' king attack, enemy specials, castle arrivals, wall melee and
//! finally army strikes. Every individual hit is reported as a
//! [`GameEvent::DamageDealt`]; kills are returned so the engine can route
//! their gold.

use bastion_core::{
    geometry, ArmyUnitId, BuildingId, BuildingKind, DamageDealt, DamageSource, DamageTarget,
    DestroyCause, EnemyId, EnemyKind, EnemySpecial, GameEvent, PlayerId, Vec2, CASTLE_STATS,
};
use bastion_system_army::ArmyManager;
use bastion_system_buildings::{Attacker, BuildingManager};
use bastion_system_castles::CastleManager;
use bastion_system_enemies::EnemyManager;
use bastion_world::Grid;

/// Half-width of the corridor a piercing bolt travels through.
pub const PIERCE_HALF_WIDTH: f32 = 0.6;

/// Distance from a wall centre within which enemies melee it.
pub const WALL_MELEE_RANGE: f32 = 1.2;

/// Mutable access to every manager combat touches.
#[derive(Debug)]
pub struct Battlefield<'a> {
    /// Occupancy grid, freed when buildings fall.
    pub grid: &'a mut Grid,
    /// Enemy pool.
    pub enemies: &'a mut EnemyManager,
    /// Building registry.
    pub buildings: &'a mut BuildingManager,
    /// Castle registry.
    pub castles: &'a mut CastleManager,
    /// Army pool.
    pub army: &'a mut ArmyManager,
}

/// Timing inputs of one resolution pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombatClock {
    /// Seconds elapsed since the previous pass.
    pub dt: f32,
    /// Simulated seconds since the session started.
    pub now: f64,
    /// Enables the castles' king attack.
    pub castle_auto_attack: bool,
}

/// An enemy killed during resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kill {
    /// Identifier of the dead enemy.
    pub enemy: EnemyId,
    /// Kind of the dead enemy.
    pub kind: EnemyKind,
    /// Gold reward released.
    pub reward: u32,
    /// Owner of the building that landed the killing blow. `None` when a
    /// castle or nothing attributable did.
    pub killer: Option<PlayerId>,
}

/// Combat resolver with reusable scratch space.
#[derive(Debug, Default)]
pub struct CombatManager {
    pierce_scratch: Vec<(f32, EnemyId)>,
}

impl CombatManager {
    /// Creates a resolver with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves one tick of combat.
    ///
    /// `reached` lists the enemies the movement step reported at a castle.
    /// Events are appended to `events`; the kills of this pass are returned.
    pub fn resolve(
        &mut self,
        field: Battlefield<'_>,
        clock: CombatClock,
        reached: &[EnemyId],
        events: &mut Vec<GameEvent>,
    ) -> Vec<Kill> {
        let mut pass = Pass {
            field,
            events,
            kills: Vec::new(),
        };

        for attacker in pass.field.buildings.ready_attackers(clock.dt) {
            if self.tower_attack(&mut pass, attacker) {
                pass.field.buildings.mark_fired(attacker.building);
            }
        }
        for trap in pass.field.buildings.armed_traps() {
            pass.detonate(trap);
        }

        if clock.castle_auto_attack {
            pass.king_attacks(clock.now);
        }

        pass.enemy_specials(clock.dt);
        pass.castle_arrivals(reached);
        pass.wall_melee(clock.dt);
        pass.army_strikes(clock.dt);

        pass.kills
    }

    fn tower_attack(&mut self, pass: &mut Pass<'_, '_>, attacker: Attacker) -> bool {
        let stats = attacker.kind.stats();
        let Some((target, target_position)) = pass
            .field
            .enemies
            .nearest_within(attacker.center, stats.range)
        else {
            return false;
        };

        let victims = if attacker.kind == BuildingKind::Ballista {
            self.pierce_line(
                &*pass.field.enemies,
                attacker.center,
                target_position,
                stats.range,
                stats.pierce,
            )
        } else if stats.aoe_radius > 0.0 {
            pass.field.enemies.within(target_position, stats.aoe_radius)
        } else {
            vec![target]
        };

        let source = Some(DamageSource::Building(attacker.building));
        for victim in victims {
            pass.hit_enemy(victim, stats.damage, source, Some(attacker.owner));
        }
        true
    }

    fn pierce_line(
        &mut self,
        enemies: &EnemyManager,
        origin: Vec2,
        aim: Vec2,
        range: f32,
        pierce: u32,
    ) -> Vec<EnemyId> {
        self.pierce_scratch.clear();
        let direction = aim - origin;
        for enemy in enemies.iter() {
            let (along, across) = geometry::project_onto_ray(origin, direction, enemy.position());
            if along >= 0.0 && along <= range && across <= PIERCE_HALF_WIDTH {
                self.pierce_scratch.push((along, enemy.id()));
            }
        }
        self.pierce_scratch
            .sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        self.pierce_scratch
            .iter()
            .take(pierce as usize)
            .map(|(_, id)| *id)
            .collect()
    }
}

struct Pass<'f, 'e> {
    field: Battlefield<'f>,
    events: &'e mut Vec<GameEvent>,
    kills: Vec<Kill>,
}

impl Pass<'_, '_> {
    fn detonate(&mut self, trap: Attacker) {
        let stats = trap.kind.stats();
        if self
            .field
            .enemies
            .nearest_within(trap.center, stats.range)
            .is_none()
        {
            return;
        }
        let source = Some(DamageSource::Building(trap.building));
        for victim in self.field.enemies.within(trap.center, stats.aoe_radius) {
            self.hit_enemy(victim, stats.damage, source, Some(trap.owner));
        }
        if let Some(building) = self.field.buildings.remove(trap.building, self.field.grid) {
            tracing::debug!(building = trap.building.get(), "trap detonated");
            self.events.push(GameEvent::BuildingDestroyed {
                building: trap.building,
                kind: building.kind(),
                owner: building.owner(),
                cause: DestroyCause::Detonated,
            });
        }
    }

    fn king_attacks(&mut self, now: f64) {
        for (player, center) in self.field.castles.ready_kings(now) {
            let source = Some(DamageSource::Castle(player));
            if let Some((enemy, _)) = self
                .field
                .enemies
                .nearest_within(center, CASTLE_STATS.king_range)
            {
                self.hit_enemy(enemy, CASTLE_STATS.king_damage, source, None);
            } else if let Some(unit) =
                self.field
                    .army
                    .nearest_hostile(player, center, CASTLE_STATS.king_range)
            {
                self.hit_army_unit(unit, CASTLE_STATS.king_damage, source);
            } else {
                continue;
            }
            self.field.castles.record_king_attack(player, now);
        }
    }

    fn enemy_specials(&mut self, dt: f32) {
        for trigger in self.field.enemies.tick_specials(dt) {
            match trigger.special {
                EnemySpecial::Slam { radius, damage, .. } => {
                    let source = Some(DamageSource::Enemy(trigger.enemy));
                    for building in self.field.buildings.within(trigger.position, radius) {
                        self.hit_building(building, damage, source);
                    }
                    let castles: Vec<PlayerId> = self
                        .field
                        .castles
                        .alive()
                        .filter(|castle| {
                            geometry::distance(castle.center(), trigger.position) <= radius
                        })
                        .map(|castle| castle.player())
                        .collect();
                    for player in castles {
                        self.hit_castle(player, damage, source);
                    }
                }
                EnemySpecial::WarCry {
                    radius,
                    heal_fraction,
                    ..
                } => {
                    let healed =
                        self.field
                            .enemies
                            .heal_around(trigger.position, radius, heal_fraction);
                    tracing::trace!(enemy = trigger.enemy.get(), healed, "war cry");
                }
                EnemySpecial::WallBreaker => {}
            }
        }
    }

    fn castle_arrivals(&mut self, reached: &[EnemyId]) {
        for id in reached {
            let Some(enemy) = self.field.enemies.remove(*id) else {
                continue;
            };
            let Some(player) = self.field.castles.nearest_castle(enemy.position()) else {
                continue;
            };
            self.hit_castle(player, enemy.damage(), Some(DamageSource::Enemy(*id)));
        }
    }

    fn wall_melee(&mut self, dt: f32) {
        let strikes: Vec<(EnemyId, BuildingId, f32)> = self
            .field
            .enemies
            .iter()
            .filter_map(|enemy| {
                let wall = self
                    .field
                    .buildings
                    .nearest_wall_within(enemy.position(), WALL_MELEE_RANGE)?;
                let multiplier = if enemy.is_wall_breaker() { 2.0 } else { 1.0 };
                Some((enemy.id(), wall, enemy.damage() * dt * multiplier))
            })
            .collect();
        for (enemy, wall, damage) in strikes {
            self.hit_building(wall, damage, Some(DamageSource::Enemy(enemy)));
        }
    }

    fn army_strikes(&mut self, dt: f32) {
        for strike in self.field.army.castle_strikes(dt) {
            self.hit_castle(
                strike.target,
                strike.damage,
                Some(DamageSource::ArmyUnit(strike.unit)),
            );
        }
    }

    fn hit_enemy(
        &mut self,
        enemy: EnemyId,
        amount: f32,
        source: Option<DamageSource>,
        killer: Option<PlayerId>,
    ) {
        let Some(hit) = self.field.enemies.take_damage(enemy, amount) else {
            return;
        };
        self.damage(DamageTarget::Enemy(enemy), hit.applied, hit.remaining_hp, source);
        if let Some(kill) = hit.kill {
            self.events.push(GameEvent::EnemyDied {
                enemy,
                kind: kill.kind,
                position: kill.position,
                reward: kill.reward,
                killer,
            });
            self.kills.push(Kill {
                enemy,
                kind: kill.kind,
                reward: kill.reward,
                killer,
            });
        }
    }

    fn hit_building(&mut self, building: BuildingId, amount: f32, source: Option<DamageSource>) {
        let Some(hit) = self
            .field
            .buildings
            .take_damage(building, amount, self.field.grid)
        else {
            return;
        };
        self.damage(
            DamageTarget::Building(building),
            hit.applied,
            hit.remaining_hp,
            source,
        );
        if let Some(destroyed) = hit.destroyed {
            tracing::debug!(building = building.get(), kind = %destroyed.kind, "building destroyed");
            self.events.push(GameEvent::BuildingDestroyed {
                building,
                kind: destroyed.kind,
                owner: destroyed.owner,
                cause: DestroyCause::Combat,
            });
        }
    }

    fn hit_castle(&mut self, player: PlayerId, amount: f32, source: Option<DamageSource>) {
        let Some(hit) = self.field.castles.take_damage(player, amount) else {
            return;
        };
        self.damage(
            DamageTarget::Castle(player),
            hit.applied,
            hit.remaining_hp,
            source,
        );
        if let Some(castle) = self.field.castles.get(player) {
            self.events.push(GameEvent::CastleUpdated(castle.snapshot()));
        }
        if hit.destroyed {
            tracing::info!(player = player.get(), "castle destroyed");
            for (unit, kind, owner) in self.field.army.disband_against(player) {
                self.events
                    .push(GameEvent::ArmyUnitDied { unit, kind, owner });
            }
        }
    }

    fn hit_army_unit(&mut self, unit: ArmyUnitId, amount: f32, source: Option<DamageSource>) {
        let Some(hit) = self.field.army.take_damage(unit, amount) else {
            return;
        };
        self.damage(
            DamageTarget::ArmyUnit(unit),
            hit.applied,
            hit.remaining_hp,
            source,
        );
        if let Some((kind, owner)) = hit.died {
            self.events
                .push(GameEvent::ArmyUnitDied { unit, kind, owner });
        }
    }

    fn damage(
        &mut self,
        target: DamageTarget,
        amount: f32,
        remaining_hp: f32,
        source: Option<DamageSource>,
    ) {
        self.events.push(GameEvent::DamageDealt(DamageDealt {
            target,
            amount,
            remaining_hp,
            source,
        }));
    }
}
