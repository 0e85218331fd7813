#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Building registry with placement, stacking, relocation and sale rules.
//!
//! Every layout change is validated against a [`bastion_world::GridPatch`]
//! first: a fresh placement or move is only committed when each map edge can
//! still reach every standing castle.

use std::collections::BTreeMap;

use bastion_core::{
    geometry, BuildingId, BuildingKind, BuildingSnapshot, CastleTarget, CellCoord, CellRect,
    MoveError, PlacementError, PlayerId, SellError, Vec2, MAX_WALL_STACK,
};
use bastion_world::{all_edges_reach, Grid, Walkability};

/// A building standing on the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Building {
    id: BuildingId,
    kind: BuildingKind,
    origin: CellCoord,
    hp: f32,
    max_hp: f32,
    owner: PlayerId,
    stack_count: u32,
    cooldown: f32,
}

impl Building {
    /// Identifier of the building.
    #[must_use]
    pub const fn id(&self) -> BuildingId {
        self.id
    }

    /// Kind of the building.
    #[must_use]
    pub const fn kind(&self) -> BuildingKind {
        self.kind
    }

    /// Player who placed the building.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Upper-left cell of the footprint.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Cells covered by the building.
    #[must_use]
    pub const fn footprint(&self) -> CellRect {
        CellRect::from_origin_and_size(self.origin, self.kind.footprint())
    }

    /// Continuous centre of the footprint.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.footprint().center()
    }

    /// Current hit points.
    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    /// Maximum hit points, including stacks.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Number of stacked walls, 1 for every other building.
    #[must_use]
    pub const fn stack_count(&self) -> u32 {
        self.stack_count
    }

    /// Gold returned when the building is sold: half the kind's cost,
    /// whatever the stack height.
    #[must_use]
    pub const fn refund_value(&self) -> u32 {
        self.kind.stats().cost / 2
    }

    /// Captures an immutable snapshot of the building.
    #[must_use]
    pub fn snapshot(&self) -> BuildingSnapshot {
        BuildingSnapshot {
            id: self.id,
            kind: self.kind,
            grid_x: self.origin.column(),
            grid_y: self.origin.row(),
            hp: self.hp,
            max_hp: self.max_hp,
            owner: self.owner,
            stack_count: self.stack_count,
        }
    }

    fn wall_height(&self) -> u8 {
        if self.kind.is_wall() {
            u8::try_from(self.stack_count).unwrap_or(u8::MAX)
        } else {
            0
        }
    }
}

/// Result of an accepted placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementOutcome {
    /// Building after the placement.
    pub building: BuildingSnapshot,
    /// Gold the owner must be charged.
    pub cost: u32,
    /// The placement raised an existing wall instead of creating a building.
    pub stacked: bool,
    /// Cells newly blocked by the placement, `None` for a stack.
    pub blocked: Option<CellRect>,
}

/// Result of an accepted move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveOutcome {
    /// Building after the move.
    pub building: BuildingSnapshot,
    /// Cells freed by the move.
    pub vacated: CellRect,
    /// Cells blocked by the move.
    pub occupied: CellRect,
}

/// Result of an accepted sale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaleOutcome {
    /// Building as it stood before the sale.
    pub building: BuildingSnapshot,
    /// Gold owed to the seller.
    pub refund: u32,
}

/// Outcome of a hit applied to a building.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingHit {
    /// Damage actually removed.
    pub applied: f32,
    /// Hit points left after the hit.
    pub remaining_hp: f32,
    /// Present when the hit destroyed the building, which is then removed.
    pub destroyed: Option<BuildingSnapshot>,
}

/// An offensive building able to act this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attacker {
    /// Building that may attack.
    pub building: BuildingId,
    /// Kind of the building.
    pub kind: BuildingKind,
    /// Owner credited with the building's kills.
    pub owner: PlayerId,
    /// Centre of the building.
    pub center: Vec2,
}

/// Registry of every building in the session.
#[derive(Clone, Debug, Default)]
pub struct BuildingManager {
    buildings: BTreeMap<BuildingId, Building>,
    next_id: u32,
}

impl BuildingManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every building and restarts identifier allocation.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of buildings on the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    /// Reports whether no building stands on the grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Building with the provided identifier.
    #[must_use]
    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Buildings ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Snapshots of every building, ordered by identifier.
    #[must_use]
    pub fn snapshots(&self) -> Vec<BuildingSnapshot> {
        self.buildings.values().map(Building::snapshot).collect()
    }

    /// Places a building, or stacks a wall onto an identical wall.
    ///
    /// Checks run in order: gold, bounds, then either free tiles plus
    /// reachability or a stackable wall. The grid is only touched once every
    /// check passed; charging the owner is left to the caller.
    pub fn place_building(
        &mut self,
        kind: BuildingKind,
        origin: CellCoord,
        owner: PlayerId,
        grid: &mut Grid,
        castles: &[CastleTarget],
        current_gold: u32,
    ) -> Result<PlacementOutcome, PlacementError> {
        let cost = kind.stats().cost;
        if current_gold < cost {
            return Err(PlacementError::InsufficientGold {
                required: cost,
                available: current_gold,
            });
        }

        let footprint = CellRect::from_origin_and_size(origin, kind.footprint());
        if !grid.rect_in_bounds(footprint) {
            return Err(PlacementError::OutOfBounds);
        }

        if !grid.rect_walkable(footprint) {
            return self.stack_wall(kind, origin, grid, cost);
        }

        let targets = target_cells(castles);
        if !all_edges_reach(&grid.patch().block(footprint), &targets) {
            return Err(PlacementError::BlocksPath);
        }

        self.next_id += 1;
        let id = BuildingId::new(self.next_id);
        let stats = kind.stats();
        let building = Building {
            id,
            kind,
            origin,
            hp: stats.hp,
            max_hp: stats.hp,
            owner,
            stack_count: 1,
            cooldown: 0.0,
        };
        grid.set_blocked(footprint);
        grid.set_wall_height(footprint, building.wall_height());
        let snapshot = building.snapshot();
        let _ = self.buildings.insert(id, building);
        tracing::debug!(building = id.get(), %kind, owner = owner.get(), "building placed");

        Ok(PlacementOutcome {
            building: snapshot,
            cost,
            stacked: false,
            blocked: Some(footprint),
        })
    }

    fn stack_wall(
        &mut self,
        kind: BuildingKind,
        origin: CellCoord,
        grid: &mut Grid,
        cost: u32,
    ) -> Result<PlacementOutcome, PlacementError> {
        if !kind.is_wall() {
            return Err(PlacementError::Occupied);
        }
        let wall = self
            .buildings
            .values_mut()
            .find(|building| building.kind == kind && building.origin == origin)
            .ok_or(PlacementError::Occupied)?;
        if wall.stack_count >= MAX_WALL_STACK {
            return Err(PlacementError::StackLimit {
                max: MAX_WALL_STACK,
            });
        }

        let hp = kind.stats().hp;
        wall.stack_count += 1;
        wall.hp += hp;
        wall.max_hp += hp;
        grid.set_wall_height(wall.footprint(), wall.wall_height());
        tracing::debug!(building = wall.id.get(), stack = wall.stack_count, "wall stacked");

        Ok(PlacementOutcome {
            building: wall.snapshot(),
            cost,
            stacked: true,
            blocked: None,
        })
    }

    /// Relocates a building, keeping its hit points and stacks.
    ///
    /// The destination may overlap the building's own footprint.
    pub fn move_building(
        &mut self,
        id: BuildingId,
        origin: CellCoord,
        grid: &mut Grid,
        castles: &[CastleTarget],
    ) -> Result<MoveOutcome, MoveError> {
        let building = self
            .buildings
            .get_mut(&id)
            .ok_or(MoveError::UnknownBuilding(id))?;
        let vacated = building.footprint();
        let occupied = CellRect::from_origin_and_size(origin, building.kind.footprint());
        if !grid.rect_in_bounds(occupied) {
            return Err(MoveError::OutOfBounds);
        }
        if occupied
            .cells()
            .any(|cell| !vacated.contains(cell) && !grid.is_walkable(cell))
        {
            return Err(MoveError::Occupied);
        }

        let targets = target_cells(castles);
        let patch = grid.patch().free(vacated).block(occupied);
        if !all_edges_reach(&patch, &targets) {
            return Err(MoveError::BlocksPath);
        }

        let height = building.wall_height();
        grid.set_walkable(vacated);
        grid.set_wall_height(vacated, 0);
        grid.set_blocked(occupied);
        grid.set_wall_height(occupied, height);
        building.origin = origin;
        tracing::debug!(building = id.get(), column = origin.column(), row = origin.row(), "building moved");

        Ok(MoveOutcome {
            building: building.snapshot(),
            vacated,
            occupied,
        })
    }

    /// Sells a building owned by `seller`, freeing its footprint.
    pub fn sell_building(
        &mut self,
        id: BuildingId,
        seller: PlayerId,
        grid: &mut Grid,
    ) -> Result<SaleOutcome, SellError> {
        let building = self.buildings.get(&id).ok_or(SellError::UnknownBuilding(id))?;
        if building.owner != seller {
            return Err(SellError::NotOwner { building: id });
        }
        let building = self
            .remove(id, grid)
            .ok_or(SellError::UnknownBuilding(id))?;
        Ok(SaleOutcome {
            refund: building.refund_value(),
            building: building.snapshot(),
        })
    }

    /// Applies damage, clamping hit points at zero.
    ///
    /// A destroyed building is removed and its footprint freed.
    pub fn take_damage(&mut self, id: BuildingId, amount: f32, grid: &mut Grid) -> Option<BuildingHit> {
        let building = self.buildings.get_mut(&id)?;
        let applied = amount.max(0.0).min(building.hp);
        building.hp -= applied;
        if building.hp > 0.0 {
            return Some(BuildingHit {
                applied,
                remaining_hp: building.hp,
                destroyed: None,
            });
        }
        building.hp = 0.0;
        let destroyed = self.remove(id, grid).map(|building| building.snapshot());
        Some(BuildingHit {
            applied,
            remaining_hp: 0.0,
            destroyed,
        })
    }

    /// Removes a building and frees its footprint.
    pub fn remove(&mut self, id: BuildingId, grid: &mut Grid) -> Option<Building> {
        let building = self.buildings.remove(&id)?;
        let footprint = building.footprint();
        grid.set_walkable(footprint);
        grid.set_wall_height(footprint, 0);
        Some(building)
    }

    /// Runs attack cooldowns and returns the towers able to fire.
    ///
    /// A ready tower stays ready until [`BuildingManager::mark_fired`] is
    /// called for it.
    pub fn ready_attackers(&mut self, dt: f32) -> Vec<Attacker> {
        let mut ready = Vec::new();
        for building in self.buildings.values_mut() {
            if building.kind.attack_cooldown().is_none() {
                continue;
            }
            building.cooldown = (building.cooldown - dt).max(0.0);
            if building.cooldown <= 0.0 {
                ready.push(attacker(building));
            }
        }
        ready
    }

    /// Restarts the attack cooldown of a tower that just fired.
    pub fn mark_fired(&mut self, id: BuildingId) {
        if let Some(building) = self.buildings.get_mut(&id) {
            building.cooldown = building.kind.attack_cooldown().unwrap_or(0.0);
        }
    }

    /// One-time buildings still waiting for a trigger.
    #[must_use]
    pub fn armed_traps(&self) -> Vec<Attacker> {
        self.buildings
            .values()
            .filter(|building| building.kind.stats().one_time)
            .map(attacker)
            .collect()
    }

    /// Nearest wall whose centre lies within `range` of `point`.
    #[must_use]
    pub fn nearest_wall_within(&self, point: Vec2, range: f32) -> Option<BuildingId> {
        let mut best: Option<(f32, BuildingId)> = None;
        for building in self.buildings.values().filter(|b| b.kind.is_wall()) {
            let distance = geometry::distance(building.center(), point);
            if distance <= range && best.map_or(true, |(current, _)| distance < current) {
                best = Some((distance, building.id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Every building whose centre lies within `radius` of `point`.
    #[must_use]
    pub fn within(&self, point: Vec2, radius: f32) -> Vec<BuildingId> {
        self.buildings
            .values()
            .filter(|building| geometry::distance(building.center(), point) <= radius)
            .map(|building| building.id)
            .collect()
    }
}

fn attacker(building: &Building) -> Attacker {
    Attacker {
        building: building.id,
        kind: building.kind,
        owner: building.owner,
        center: building.center(),
    }
}

fn target_cells(castles: &[CastleTarget]) -> Vec<CellCoord> {
    castles.iter().map(|castle| castle.cell).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::CellRectSize;

    const ALICE: PlayerId = PlayerId::new(1);
    const BOB: PlayerId = PlayerId::new(2);

    fn session() -> (Grid, Vec<CastleTarget>) {
        let mut grid = Grid::new(40, 40);
        grid.place_castle(CellRect::from_origin_and_size(
            CellCoord::new(18, 18),
            CellRectSize::new(4, 4),
        ));
        let castles = vec![CastleTarget {
            player: ALICE,
            cell: CellCoord::new(20, 20),
        }];
        (grid, castles)
    }

    #[test]
    fn wooden_wall_blocks_and_sells_for_half() {
        let (mut grid, castles) = session();
        let mut buildings = BuildingManager::new();
        let placed = buildings
            .place_building(
                BuildingKind::WoodenWall,
                CellCoord::new(10, 10),
                ALICE,
                &mut grid,
                &castles,
                100,
            )
            .expect("placed");
        assert!(!grid.is_walkable(CellCoord::new(10, 10)));
        assert_eq!(grid.wall_height(CellCoord::new(10, 10)), 1);
        assert_eq!(placed.cost, 5);

        let sale = buildings
            .sell_building(placed.building.id, ALICE, &mut grid)
            .expect("sold");
        assert_eq!(sale.refund, 2);
        assert!(grid.is_walkable(CellCoord::new(10, 10)));
        assert_eq!(grid.wall_height(CellCoord::new(10, 10)), 0);
    }

    #[test]
    fn walls_stack_up_to_three() {
        let (mut grid, castles) = session();
        let mut buildings = BuildingManager::new();
        let cell = CellCoord::new(5, 5);
        for expected in 1..=3 {
            let outcome = buildings
                .place_building(BuildingKind::StoneWall, cell, ALICE, &mut grid, &castles, 100)
                .expect("stack");
            assert_eq!(outcome.building.stack_count, expected);
            assert_eq!(outcome.stacked, expected > 1);
        }
        assert_eq!(
            buildings.place_building(BuildingKind::StoneWall, cell, ALICE, &mut grid, &castles, 100),
            Err(PlacementError::StackLimit { max: 3 })
        );
        let wall = buildings.iter().next().expect("wall");
        assert_eq!(wall.max_hp(), 900.0);
        assert_eq!(grid.wall_height(cell), 3);
        assert_eq!(buildings.len(), 1);

        let id = wall.id();
        let sale = buildings.sell_building(id, ALICE, &mut grid).expect("stack sold");
        assert_eq!(sale.refund, 7);
        assert_eq!(sale.building.stack_count, 3);
        assert!(grid.is_walkable(cell));
        assert_eq!(grid.wall_height(cell), 0);
    }

    #[test]
    fn mismatched_walls_and_towers_do_not_stack() {
        let (mut grid, castles) = session();
        let mut buildings = BuildingManager::new();
        let cell = CellCoord::new(5, 5);
        let _ = buildings
            .place_building(BuildingKind::WoodenWall, cell, ALICE, &mut grid, &castles, 100)
            .expect("wall");
        assert_eq!(
            buildings.place_building(BuildingKind::StoneWall, cell, ALICE, &mut grid, &castles, 100),
            Err(PlacementError::Occupied)
        );
        assert_eq!(
            buildings.place_building(BuildingKind::ArrowTower, cell, ALICE, &mut grid, &castles, 100),
            Err(PlacementError::Occupied)
        );
    }

    #[test]
    fn checks_gold_before_bounds() {
        let (mut grid, castles) = session();
        let mut buildings = BuildingManager::new();
        assert_eq!(
            buildings.place_building(
                BuildingKind::Cannon,
                CellCoord::new(39, 39),
                ALICE,
                &mut grid,
                &castles,
                10
            ),
            Err(PlacementError::InsufficientGold {
                required: 60,
                available: 10
            })
        );
        assert_eq!(
            buildings.place_building(
                BuildingKind::Cannon,
                CellCoord::new(39, 39),
                ALICE,
                &mut grid,
                &castles,
                100
            ),
            Err(PlacementError::OutOfBounds)
        );
        assert!(buildings.is_empty());
    }

    #[test]
    fn only_the_owner_may_sell() {
        let (mut grid, castles) = session();
        let mut buildings = BuildingManager::new();
        let placed = buildings
            .place_building(
                BuildingKind::ArrowTower,
                CellCoord::new(3, 3),
                ALICE,
                &mut grid,
                &castles,
                100,
            )
            .expect("placed");
        let id = placed.building.id;
        assert_eq!(
            buildings.sell_building(id, BOB, &mut grid),
            Err(SellError::NotOwner { building: id })
        );
        assert_eq!(
            buildings.sell_building(BuildingId::new(99), ALICE, &mut grid),
            Err(SellError::UnknownBuilding(BuildingId::new(99)))
        );
        assert_eq!(buildings.sell_building(id, ALICE, &mut grid).map(|s| s.refund), Ok(12));
    }

    #[test]
    fn moves_free_the_old_footprint() {
        let (mut grid, castles) = session();
        let mut buildings = BuildingManager::new();
        let placed = buildings
            .place_building(
                BuildingKind::Cannon,
                CellCoord::new(3, 3),
                ALICE,
                &mut grid,
                &castles,
                100,
            )
            .expect("placed");
        let moved = buildings
            .move_building(placed.building.id, CellCoord::new(4, 3), &mut grid, &castles)
            .expect("overlapping move");
        assert_eq!(moved.building.grid_x, 4);
        assert!(grid.is_walkable(CellCoord::new(3, 3)));
        assert!(!grid.is_walkable(CellCoord::new(5, 4)));

        assert_eq!(
            buildings.move_building(placed.building.id, CellCoord::new(19, 19), &mut grid, &castles),
            Err(MoveError::Occupied)
        );
        assert_eq!(
            buildings.move_building(BuildingId::new(42), CellCoord::new(1, 1), &mut grid, &castles),
            Err(MoveError::UnknownBuilding(BuildingId::new(42)))
        );
    }

    #[test]
    fn destroyed_buildings_leave_the_grid() {
        let (mut grid, castles) = session();
        let mut buildings = BuildingManager::new();
        let placed = buildings
            .place_building(
                BuildingKind::WoodenWall,
                CellCoord::new(7, 7),
                ALICE,
                &mut grid,
                &castles,
                100,
            )
            .expect("placed");
        let hit = buildings
            .take_damage(placed.building.id, 60.0, &mut grid)
            .expect("hit");
        assert_eq!(hit.remaining_hp, 40.0);
        let hit = buildings
            .take_damage(placed.building.id, 60.0, &mut grid)
            .expect("hit");
        assert_eq!(hit.applied, 40.0);
        assert!(hit.destroyed.is_some());
        assert!(grid.is_walkable(CellCoord::new(7, 7)));
        assert!(buildings.take_damage(placed.building.id, 1.0, &mut grid).is_none());
    }

    #[test]
    fn towers_wait_for_their_cooldown() {
        let (mut grid, castles) = session();
        let mut buildings = BuildingManager::new();
        let placed = buildings
            .place_building(
                BuildingKind::Cannon,
                CellCoord::new(3, 3),
                ALICE,
                &mut grid,
                &castles,
                100,
            )
            .expect("placed");
        let _ = buildings
            .place_building(
                BuildingKind::ExplosiveMine,
                CellCoord::new(8, 3),
                ALICE,
                &mut grid,
                &castles,
                100,
            )
            .expect("mine");

        let ready = buildings.ready_attackers(0.05);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].center, Vec2::new(4.0, 4.0));
        buildings.mark_fired(placed.building.id);
        assert!(buildings.ready_attackers(1.0).is_empty());
        assert_eq!(buildings.ready_attackers(1.0).len(), 1);
        assert_eq!(buildings.armed_traps().len(), 1);
    }
}
