use std::collections::HashMap;

use anyhow::{Context, Result};
use bastion_core::{
    BuildingKind, CellCoord, FinalStats, GameConfig, GameOutcome, Phase, PlayerId, PlayerSummary,
};
use bastion_engine::{GameEngine, SessionState};
use clap::Args;
use serde::Serialize;

/// Tower slots tried around each castle, relative to its centre cell.
const RING: [(i32, i32); 12] = [
    (-4, -4),
    (3, -4),
    (-4, 3),
    (3, 3),
    (-1, -4),
    (-4, -1),
    (3, -1),
    (-1, 3),
    (-6, 0),
    (5, 0),
    (0, -6),
    (0, 5),
];

#[derive(Debug, Args)]
pub(crate) struct SimulateArgs {
    /// Stops after this many simulated seconds even if the game is undecided.
    #[arg(long, default_value_t = 3_600)]
    pub(crate) max_seconds: u32,
    /// Lets every player ring their castle with arrow towers between waves.
    #[arg(long)]
    pub(crate) auto_build: bool,
}

/// Summary printed once the headless session stops.
#[derive(Debug, Serialize)]
pub(crate) struct SimulationReport {
    seed: u64,
    outcome: Option<GameOutcome>,
    stats: FinalStats,
    players: Vec<PlayerSummary>,
}

/// Fast-forwards a session at its fixed timestep.
pub(crate) fn run(
    config: GameConfig,
    players: &[PlayerId],
    args: &SimulateArgs,
) -> Result<SimulationReport> {
    let seed = config.seed;
    let dt = config.tick_interval();
    let mut engine = GameEngine::new(config);
    engine.init(players).context("starting session")?;

    let mut builder = AutoBuilder::default();
    let limit = f64::from(args.max_seconds);
    while engine.state() == SessionState::Running && engine.elapsed() < limit {
        if args.auto_build {
            builder.build(&mut engine);
        }
        engine.tick(dt);
    }

    let outcome = match engine.state() {
        SessionState::Over(outcome) => Some(outcome),
        _ => None,
    };
    tracing::info!(?outcome, elapsed = engine.elapsed(), "simulation finished");
    Ok(SimulationReport {
        seed,
        outcome,
        stats: engine.stats(),
        players: engine.get_full_state().players,
    })
}

/// Places arrow towers on free ring slots while a player can afford them.
#[derive(Debug, Default)]
struct AutoBuilder {
    next_slot: HashMap<PlayerId, usize>,
}

impl AutoBuilder {
    fn build(&mut self, engine: &mut GameEngine) {
        let state = engine.get_full_state();
        if state.phase == Phase::WaveActive || state.phase == Phase::Ended {
            return;
        }
        let cost = BuildingKind::ArrowTower.stats().cost;
        for castle in &state.castles {
            let slot = self.next_slot.entry(castle.player).or_default();
            while *slot < RING.len() && engine.gold(castle.player).unwrap_or(0) >= cost {
                let (dx, dy) = RING[*slot];
                *slot += 1;
                let Some(cell) = ring_cell(castle.center_x, castle.center_y, dx, dy) else {
                    continue;
                };
                match engine.handle_place_building(castle.player, BuildingKind::ArrowTower, cell) {
                    Ok(building) => {
                        tracing::debug!(
                            player = castle.player.get(),
                            building = building.id.get(),
                            "auto-built tower"
                        );
                    }
                    Err(error) => {
                        tracing::debug!(player = castle.player.get(), %error, "ring slot unusable");
                    }
                }
            }
        }
    }
}

fn ring_cell(center_x: f32, center_y: f32, dx: i32, dy: i32) -> Option<CellCoord> {
    // Castle centres sit on cell corners, so they convert to whole cells.
    let x = u32::try_from(center_x.round() as i64 + i64::from(dx)).ok()?;
    let y = u32::try_from(center_y.round() as i64 + i64::from(dy)).ok()?;
    Some(CellCoord::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> GameConfig {
        GameConfig {
            preparation_secs: 2.0,
            wave_break_secs: 1.0,
            warning_secs: 0.5,
            ..GameConfig::default()
        }
    }

    #[test]
    fn slots_left_of_the_grid_are_skipped() {
        assert_eq!(ring_cell(2.0, 2.0, -4, 0), None);
        assert_eq!(ring_cell(20.0, 20.0, -4, 3), Some(CellCoord::new(16, 23)));
    }

    #[test]
    fn auto_builder_spends_starting_gold_before_the_first_wave() {
        let mut engine = GameEngine::new(quick());
        let alice = PlayerId::new(1);
        engine.init(&[alice]).expect("session starts");

        AutoBuilder::default().build(&mut engine);

        let state = engine.get_full_state();
        assert_eq!(state.buildings.len(), 4);
        assert_eq!(engine.gold(alice), Some(0));
    }

    #[test]
    fn time_limit_stops_an_undecided_session() {
        let args = SimulateArgs {
            max_seconds: 5,
            auto_build: false,
        };
        let report = run(quick(), &[PlayerId::new(1)], &args).expect("simulation runs");
        assert_eq!(report.outcome, None);
        assert!(report.stats.duration_secs >= 5.0);
        assert!(report.stats.duration_secs < 5.2);
        assert_eq!(report.players.len(), 1);
    }
}
