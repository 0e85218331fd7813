use std::time::Duration;

use bastion_core::{
    ArmyError, ArmyKind, BuildingKind, CellCoord, CellRect, CellRectSize, CommandError,
    GameConfig, GameEvent, GameOutcome, MoveError, Phase, PlayerId, UpgradeError, UpgradeKind,
};
use bastion_engine::{Command, CommandReply, EventLog, GameEngine, SessionState};
use proptest::prelude::*;

const ALICE: PlayerId = PlayerId::new(1);
const BOB: PlayerId = PlayerId::new(2);
const TICK: Duration = Duration::from_millis(50);

fn quick_config() -> GameConfig {
    GameConfig {
        preparation_secs: 1.0,
        wave_break_secs: 1.0,
        warning_secs: 0.5,
        ..GameConfig::default()
    }
}

fn session(config: GameConfig, players: &[PlayerId]) -> (GameEngine, EventLog) {
    let mut engine = GameEngine::new(config);
    let log = EventLog::new();
    engine.subscribe(log.clone());
    engine.init(players).expect("session starts");
    (engine, log)
}

fn run_until<F>(engine: &mut GameEngine, max_ticks: u32, mut done: F) -> u32
where
    F: FnMut(&GameEngine) -> bool,
{
    for tick in 0..max_ticks {
        if done(engine) {
            return tick;
        }
        engine.tick(TICK);
    }
    max_ticks
}

fn castle_hp(engine: &GameEngine, player: PlayerId) -> f32 {
    engine
        .get_full_state()
        .castles
        .iter()
        .find(|castle| castle.player == player)
        .map_or(0.0, |castle| castle.hp)
}

#[test]
fn selling_a_wooden_wall_refunds_half() {
    let (mut engine, log) = session(GameConfig::default(), &[ALICE]);

    let wall = engine
        .handle_place_building(ALICE, BuildingKind::WoodenWall, CellCoord::new(3, 3))
        .expect("wall placed");
    assert_eq!(engine.gold(ALICE), Some(95));

    let (_, refund) = engine
        .handle_sell_building(wall.id, ALICE)
        .expect("wall sold");
    assert_eq!(refund, 2);
    assert_eq!(engine.gold(ALICE), Some(97));
    assert!(engine.grid().rect_walkable(CellRect::from_origin_and_size(
        CellCoord::new(3, 3),
        CellRectSize::new(1, 1),
    )));

    let deltas: Vec<i64> = log
        .events()
        .iter()
        .filter_map(|event| match event {
            GameEvent::GoldChanged { delta, .. } => Some(*delta),
            _ => None,
        })
        .collect();
    assert_eq!(deltas, vec![-5, 2]);
}

#[test]
fn selling_someone_elses_building_is_rejected() {
    let (mut engine, _) = session(GameConfig::default(), &[ALICE, BOB]);
    let tower = engine
        .handle_place_building(ALICE, BuildingKind::ArrowTower, CellCoord::new(3, 3))
        .expect("tower placed");

    let error = engine.handle_sell_building(tower.id, BOB).unwrap_err();
    assert!(matches!(error, CommandError::Sell(_)));
    assert_eq!(engine.gold(BOB), Some(100));
    assert_eq!(engine.get_full_state().buildings.len(), 1);
}

#[test]
fn rejected_moves_leave_the_session_untouched() {
    let config = GameConfig {
        starting_gold: 1_000,
        ..GameConfig::default()
    };
    let (mut engine, log) = session(config, &[ALICE]);

    let mut ring = Vec::new();
    for column in 16..24 {
        ring.push(CellCoord::new(column, 16));
        ring.push(CellCoord::new(column, 23));
    }
    for row in 17..23 {
        ring.push(CellCoord::new(16, row));
        ring.push(CellCoord::new(23, row));
    }
    let gap = ring.pop().expect("ring");
    for cell in ring {
        let _ = engine
            .handle_place_building(ALICE, BuildingKind::WoodenWall, cell)
            .expect("ring segment");
    }
    let spare = engine
        .handle_place_building(ALICE, BuildingKind::WoodenWall, CellCoord::new(2, 2))
        .expect("spare wall");

    let state = engine.get_full_state();
    let grid = engine.grid().clone();
    let _ = log.drain();

    let error = engine.handle_move_building(spare.id, gap).unwrap_err();
    assert_eq!(error, CommandError::Move(MoveError::BlocksPath));
    assert_eq!(engine.get_full_state(), state);
    assert_eq!(engine.grid(), &grid);
    assert!(log.is_empty());
}

#[test]
fn stacked_walls_count_as_one_placement() {
    let (mut engine, _) = session(GameConfig::default(), &[ALICE]);
    for _ in 0..3 {
        let _ = engine
            .handle_place_building(ALICE, BuildingKind::StoneWall, CellCoord::new(5, 5))
            .expect("wall stacked");
    }
    let buildings = engine.get_full_state().buildings;
    assert_eq!(buildings.len(), 1);
    assert_eq!(buildings[0].stack_count, 3);
    assert_eq!(engine.gold(ALICE), Some(55));
    assert_eq!(engine.stats().total_buildings_placed, 1);

    let (_, refund) = engine
        .handle_sell_building(buildings[0].id, ALICE)
        .expect("stack sold");
    assert_eq!(refund, 7);
    assert_eq!(engine.gold(ALICE), Some(62));
}

#[test]
fn undefended_castle_takes_the_first_wave_in_full() {
    let config = GameConfig {
        castle_auto_attack: false,
        ..quick_config()
    };
    let (mut engine, log) = session(config, &[ALICE]);

    let _ = run_until(&mut engine, 4_000, |engine| {
        engine.get_full_state().phase == Phase::WaveBreak
    });

    let state = engine.get_full_state();
    assert_eq!(state.phase, Phase::WaveBreak);
    assert_eq!(state.current_zombie_wave, 1);
    assert_eq!(castle_hp(&engine, ALICE), 960.0);
    assert_eq!(engine.stats().total_kills, 0);
    let spawned = log
        .events()
        .iter()
        .filter(|event| matches!(event, GameEvent::EnemySpawned { .. }))
        .count();
    assert_eq!(spawned, 8);
}

fn tower_ring(engine: &mut GameEngine) -> u32 {
    let mut placed = 0;
    for offset in [14u32, 17, 20, 23, 26] {
        for cell in [
            CellCoord::new(offset, 14),
            CellCoord::new(offset, 26),
            CellCoord::new(14, offset),
            CellCoord::new(26, offset),
        ] {
            if engine
                .handle_place_building(ALICE, BuildingKind::ArrowTower, cell)
                .is_ok()
            {
                placed += 1;
            }
        }
    }
    placed
}

fn tower_kill_rewards(treasury: bool) -> (Vec<i64>, u32, u32) {
    let config = GameConfig {
        castle_auto_attack: false,
        starting_gold: 1_000,
        ..quick_config()
    };
    let (mut engine, log) = session(config, &[ALICE]);
    if treasury {
        let _ = engine
            .handle_upgrade_castle(ALICE, UpgradeKind::Treasury)
            .expect("treasury bought");
    }
    let placed = tower_ring(&mut engine);
    assert!(placed > 0);
    let _ = log.drain();
    let gold_before = engine.gold(ALICE).unwrap_or(0);

    let _ = run_until(&mut engine, 4_000, |engine| {
        engine.get_full_state().phase == Phase::WaveBreak
    });

    let events = log.events();
    let gains: Vec<i64> = events
        .iter()
        .filter_map(|event| match event {
            GameEvent::GoldChanged { delta, .. } if *delta > 0 => Some(*delta),
            _ => None,
        })
        .collect();
    for event in &events {
        if let GameEvent::EnemyDied { killer, .. } = event {
            assert_eq!(*killer, Some(ALICE));
        }
    }
    let gained = engine.gold(ALICE).unwrap_or(0) - gold_before;
    (gains, engine.stats().total_kills, gained)
}

#[test]
fn tower_kills_pay_the_owner() {
    let (gains, kills, gained) = tower_kill_rewards(false);
    assert!(kills > 0);
    assert!(gains.iter().all(|delta| *delta == 5));
    assert_eq!(gained, kills * 5);
}

#[test]
fn treasury_adds_two_gold_per_kill() {
    let (gains, kills, gained) = tower_kill_rewards(true);
    assert!(kills > 0);
    assert!(gains.iter().all(|delta| *delta == 7));
    assert_eq!(gained, kills * 7);
}

#[test]
fn fortify_two_without_fortify_one_keeps_the_gold() {
    let config = GameConfig {
        starting_gold: 500,
        ..GameConfig::default()
    };
    let (mut engine, log) = session(config, &[ALICE]);
    let _ = log.drain();

    let error = engine
        .handle_upgrade_castle(ALICE, UpgradeKind::FortifyII)
        .unwrap_err();
    assert_eq!(
        error,
        CommandError::Upgrade(UpgradeError::MissingPrerequisite {
            upgrade: UpgradeKind::FortifyII,
            requires: UpgradeKind::FortifyI,
        })
    );
    assert_eq!(engine.gold(ALICE), Some(500));
    assert!(log.is_empty());

    let castle = engine
        .handle_upgrade_castle(ALICE, UpgradeKind::FortifyI)
        .expect("fortify one");
    assert_eq!(castle.max_hp, 1_500.0);
    let castle = engine
        .handle_upgrade_castle(ALICE, UpgradeKind::FortifyII)
        .expect("fortify two");
    assert_eq!(castle.max_hp, 2_500.0);
    assert_eq!(castle.hp, 2_500.0);
    assert_eq!(engine.gold(ALICE), Some(200));
}

#[test]
fn upgrades_need_the_gold_up_front() {
    let (mut engine, _) = session(GameConfig::default(), &[ALICE]);
    let error = engine
        .handle_upgrade_castle(ALICE, UpgradeKind::Treasury)
        .unwrap_err();
    assert!(matches!(error, CommandError::Economy(_)));
    assert_eq!(engine.gold(ALICE), Some(100));
}

#[test]
fn repair_is_repeatable_and_clamped() {
    let (mut engine, _) = session(GameConfig::default(), &[ALICE]);
    let castle = engine.handle_repair_castle(ALICE).expect("repair");
    assert_eq!(castle.hp, 1_000.0);
    assert!(castle.upgrades.is_empty());
    let _ = engine.handle_repair_castle(ALICE).expect("repair again");
    assert_eq!(engine.gold(ALICE), Some(0));
}

#[test]
fn army_needs_an_opponent() {
    let (mut engine, _) = session(GameConfig::default(), &[ALICE]);
    assert_eq!(
        engine.handle_spawn_army(ALICE, ArmyKind::Scout, BOB),
        Err(CommandError::Army(ArmyError::UnknownTarget(BOB)))
    );
    assert_eq!(
        engine.handle_spawn_army(ALICE, ArmyKind::Scout, ALICE),
        Err(CommandError::Army(ArmyError::SelfTarget))
    );
    assert_eq!(engine.gold(ALICE), Some(100));
}

#[test]
fn army_units_march_on_the_opposing_castle() {
    let config = GameConfig {
        castle_auto_attack: false,
        ..GameConfig::default()
    };
    let (mut engine, log) = session(config, &[ALICE, BOB]);

    let reply = engine
        .apply(Command::SpawnArmy {
            owner: ALICE,
            kind: ArmyKind::Knight,
            target: BOB,
        })
        .expect("knight deployed");
    let CommandReply::ArmyUnit(unit) = reply else {
        panic!("expected an army unit");
    };
    assert_eq!(unit.target, BOB);
    assert_eq!(engine.gold(ALICE), Some(40));
    assert!(log
        .events()
        .iter()
        .any(|event| matches!(event, GameEvent::ArmyUnitSpawned { owner: ALICE, .. })));

    let _ = run_until(&mut engine, 600, |engine| castle_hp(engine, BOB) < 1_000.0);
    assert!(castle_hp(&engine, BOB) < 1_000.0);
    assert_eq!(castle_hp(&engine, ALICE), 1_000.0);
}

#[test]
fn session_ends_exactly_once() {
    let (mut engine, log) = session(quick_config(), &[ALICE]);

    let _ = run_until(&mut engine, 60_000, |engine| {
        matches!(engine.state(), SessionState::Over(_))
    });
    let SessionState::Over(outcome) = engine.state() else {
        panic!("session never ended");
    };

    let elapsed = engine.elapsed();
    engine.tick(TICK);
    assert_eq!(engine.elapsed(), elapsed);
    assert_eq!(
        engine.handle_repair_castle(ALICE),
        Err(CommandError::GameOver)
    );

    let endings: Vec<_> = log
        .events()
        .into_iter()
        .filter_map(|event| match event {
            GameEvent::GameOver { outcome, stats } => Some((outcome, stats)),
            _ => None,
        })
        .collect();
    assert_eq!(endings.len(), 1);
    assert_eq!(endings[0].0, outcome);
    assert!(endings[0].1.wave_reached >= 1);
    if outcome == GameOutcome::Defeat {
        assert_eq!(castle_hp(&engine, ALICE), 0.0);
    }
}

#[test]
fn same_seed_same_session() {
    let run = || {
        let (mut engine, _) = session(quick_config(), &[ALICE, BOB]);
        let _ = engine.handle_place_building(ALICE, BuildingKind::Cannon, CellCoord::new(12, 12));
        for _ in 0..1_200 {
            engine.tick(TICK);
        }
        engine.get_full_state()
    };
    assert_eq!(run(), run());
}

fn command_strategy() -> impl Strategy<Value = Command> {
    let kind = prop_oneof![
        Just(BuildingKind::WoodenWall),
        Just(BuildingKind::ArrowTower),
        Just(BuildingKind::ExplosiveMine),
    ];
    prop_oneof![
        (kind, 0u32..40, 0u32..40).prop_map(|(kind, column, row)| Command::PlaceBuilding {
            player: ALICE,
            kind,
            cell: CellCoord::new(column, row),
        }),
        Just(Command::RepairCastle { player: ALICE }),
        Just(Command::UpgradeCastle {
            player: ALICE,
            upgrade: UpgradeKind::FortifyI,
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn hit_points_never_go_negative(
        commands in prop::collection::vec(command_strategy(), 0..12),
        ticks in 100u32..600,
    ) {
        let (mut engine, _) = session(quick_config(), &[ALICE]);
        for command in commands {
            let _ = engine.apply(command);
        }
        for _ in 0..ticks {
            engine.tick(TICK);
            let state = engine.get_full_state();
            prop_assert!(state.enemies.iter().all(|enemy| enemy.hp >= 0.0));
            prop_assert!(state.buildings.iter().all(|building| building.hp >= 0.0));
            prop_assert!(state.castles.iter().all(|castle| castle.hp >= 0.0));
        }
    }
}
