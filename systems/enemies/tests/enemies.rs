use bastion_core::{
    geometry, CastleTarget, CellCoord, CellRect, CellRectSize, Edge, EnemyKind, PlayerId,
};
use bastion_system_enemies::{EnemyManager, CASTLE_REACH_RADIUS};
use bastion_world::Grid;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn rect(column: u32, row: u32, width: u32, height: u32) -> CellRect {
    CellRect::from_origin_and_size(CellCoord::new(column, row), CellRectSize::new(width, height))
}

fn grid_with_castle(size: u32) -> (Grid, [CastleTarget; 1]) {
    let mut grid = Grid::new(size, size);
    let center = size / 2;
    grid.place_castle(rect(center - 2, center - 2, 4, 4));
    let target = CastleTarget {
        player: PlayerId::new(1),
        cell: CellCoord::new(center, center),
    };
    (grid, [target])
}

#[test]
fn zombies_walk_until_they_reach_the_castle() {
    let (grid, targets) = grid_with_castle(40);
    let mut enemies = EnemyManager::new();
    let spawned = enemies
        .spawn_at(EnemyKind::NormalZombie, CellCoord::new(20, 0), 1, &grid, &targets)
        .expect("spawned");

    let mut reached = Vec::new();
    for _ in 0..200 {
        reached = enemies.update(0.5, &grid);
        if !reached.is_empty() {
            break;
        }
    }

    assert_eq!(reached, vec![spawned.id]);
    let enemy = enemies.get(spawned.id).expect("still alive until removed");
    let distance = geometry::distance(enemy.position(), targets[0].position());
    assert!(distance <= CASTLE_REACH_RADIUS + 1e-4, "stopped {distance} cells away");
}

#[test]
fn late_waves_climb_over_walls() {
    let (mut grid, targets) = grid_with_castle(20);
    let wall = rect(0, 5, 19, 1);
    grid.set_blocked(wall);
    grid.set_wall_height(wall, 1);

    let mut enemies = EnemyManager::new();
    let walker = enemies
        .spawn_at(EnemyKind::NormalZombie, CellCoord::new(10, 0), 1, &grid, &targets)
        .expect("walker");
    let climber = enemies
        .spawn_at(EnemyKind::NormalZombie, CellCoord::new(10, 0), 5, &grid, &targets)
        .expect("climber");

    let walker_path = enemies.get(walker.id).expect("walker").remaining_path().to_vec();
    assert!(walker_path.contains(&CellCoord::new(19, 5)));

    let climber = enemies.get(climber.id).expect("climber");
    assert!(climber.climbs());
    assert_eq!(climber.remaining_path().len(), 12);
    assert!(climber.remaining_path().iter().any(|cell| cell.row() == 5));
}

#[test]
fn wave_scaling_is_applied_on_spawn() {
    let (grid, targets) = grid_with_castle(40);
    let mut enemies = EnemyManager::new();
    let spawned = enemies
        .spawn_at(EnemyKind::HeavyZombie, CellCoord::new(0, 0), 3, &grid, &targets)
        .expect("spawned");
    assert!((spawned.max_hp - 150.0 * 1.3).abs() < 1e-3);
    assert!((spawned.speed - 0.6 * 1.1).abs() < 1e-5);
    assert_eq!(spawned.hp, spawned.max_hp);
}

#[test]
fn edge_spawns_land_on_the_requested_edge() {
    let (grid, targets) = grid_with_castle(40);
    let mut enemies = EnemyManager::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let north = enemies
        .spawn_enemy(EnemyKind::FastZombie, Edge::North, 1, &grid, &targets, &mut rng)
        .expect("north");
    assert_eq!(north.y, 0.5);

    let east = enemies
        .spawn_enemy(EnemyKind::FastZombie, Edge::East, 1, &grid, &targets, &mut rng)
        .expect("east");
    assert_eq!(east.x, 39.5);
    assert_eq!(enemies.len(), 2);
}

#[test]
fn sealed_edges_refuse_to_spawn() {
    let (mut grid, targets) = grid_with_castle(40);
    grid.set_blocked(rect(0, 0, 40, 1));
    let mut enemies = EnemyManager::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    assert!(enemies
        .spawn_enemy(EnemyKind::NormalZombie, Edge::North, 1, &grid, &targets, &mut rng)
        .is_none());
}

#[test]
fn repath_avoids_newly_blocked_cells() {
    let (mut grid, targets) = grid_with_castle(40);
    let mut enemies = EnemyManager::new();
    let spawned = enemies
        .spawn_at(EnemyKind::NormalZombie, CellCoord::new(20, 0), 1, &grid, &targets)
        .expect("spawned");
    let blocked = enemies.get(spawned.id).expect("enemy").remaining_path()[2];

    grid.set_blocked(rect(blocked.column(), blocked.row(), 1, 1));
    assert_eq!(enemies.repath(&grid, &[blocked]), 1);
    let enemy = enemies.get(spawned.id).expect("enemy");
    assert!(!enemy.remaining_path().contains(&blocked));
    assert_eq!(enemies.repath(&grid, &[blocked]), 0);
}
