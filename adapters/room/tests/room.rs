use std::time::Duration;

use bastion_core::{
    BuildingKind, CellCoord, CommandError, GameConfig, GameEvent, Phase, PlayerId,
    PlacementError,
};
use bastion_engine::{Command, CommandReply};
use bastion_room::{ClientMessage, RoomError, RoomHandle};

const ALICE: PlayerId = PlayerId::new(1);

fn fast_config() -> GameConfig {
    GameConfig {
        tick_rate_hz: 100,
        ..GameConfig::default()
    }
}

#[tokio::test]
async fn commands_are_answered_and_broadcast() {
    let room = RoomHandle::open("lobby", fast_config(), &[ALICE]).expect("room opens");
    let mut events = room.subscribe();

    let reply = room
        .send(Command::PlaceBuilding {
            player: ALICE,
            kind: BuildingKind::ArrowTower,
            cell: CellCoord::new(4, 4),
        })
        .await
        .expect("tower placed");
    assert!(matches!(reply, CommandReply::Building(building) if building.kind == BuildingKind::ArrowTower));

    let gold = loop {
        match events.recv().await.expect("event stream open") {
            GameEvent::GoldChanged { gold, .. } => break gold,
            _ => continue,
        }
    };
    assert_eq!(gold, 75);

    let _ = room.shutdown().await.expect("clean shutdown");
}

#[tokio::test]
async fn rejected_commands_come_back_as_errors() {
    let room = RoomHandle::open("lobby", fast_config(), &[ALICE]).expect("room opens");

    let error = room
        .send(Command::PlaceBuilding {
            player: ALICE,
            kind: BuildingKind::Cannon,
            cell: CellCoord::new(39, 39),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        RoomError::Command(CommandError::Placement(PlacementError::OutOfBounds))
    ));

    let error = room
        .submit(ClientMessage::PlaceBuilding {
            building_type: "moat".to_owned(),
            x: 3,
            y: 3,
            player_id: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(error, RoomError::Command(CommandError::Parse(_))));

    let _ = room.shutdown().await.expect("clean shutdown");
}

#[tokio::test]
async fn the_timer_drives_the_simulation() {
    let room = RoomHandle::open("timed", fast_config(), &[ALICE]).expect("room opens");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = room.snapshot().await.expect("snapshot");
    assert_eq!(state.phase, Phase::Preparation);
    assert!(state.time_remaining < 30.0);
    assert_eq!(state.castles.len(), 1);

    let stats = room.shutdown().await.expect("clean shutdown");
    assert_eq!(stats.total_kills, 0);
}

#[tokio::test]
async fn bad_rosters_never_start_a_room() {
    let error = RoomHandle::open("empty", fast_config(), &[]).unwrap_err();
    assert!(matches!(error, RoomError::Init(_)));
}
