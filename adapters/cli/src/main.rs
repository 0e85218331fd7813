#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for Bastion sessions.

mod settings;
mod simulate;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use bastion_core::{FinalStats, GameConfig, PlayerId};
use bastion_room::RoomHandle;
use clap::{Args, Parser, Subcommand};
use tokio::{runtime::Runtime, sync::broadcast::error::RecvError};
use tracing_subscriber::EnvFilter;

/// Runs Bastion sessions without a network transport.
#[derive(Debug, Parser)]
#[command(name = "bastion", version, about)]
struct Cli {
    /// TOML file with session settings; missing keys keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the configured random seed.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Number of players, one castle each.
    #[arg(long, global = true, default_value_t = 1)]
    players: u32,
    /// Disables the castles' built-in attack.
    #[arg(long, global = true)]
    no_king: bool,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Fast-forwards a headless session and prints its final statistics.
    Simulate(simulate::SimulateArgs),
    /// Runs a real-time room for a while, logging every event.
    Room(RoomArgs),
}

#[derive(Debug, Args)]
struct RoomArgs {
    /// Room name; also salts the random seed.
    #[arg(long, default_value = "lobby")]
    name: String,
    /// Seconds of wall-clock time to keep the room open.
    #[arg(long, default_value_t = 10)]
    seconds: u64,
}

/// Entry point for the Bastion command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = settings::load(cli.config.as_deref(), cli.seed, cli.no_king)?;
    let players: Vec<PlayerId> = (1..=cli.players).map(PlayerId::new).collect();

    match cli.mode {
        Mode::Simulate(args) => {
            let report = simulate::run(config, &players, &args)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("encoding report")?
            );
        }
        Mode::Room(args) => {
            let runtime = Runtime::new().context("starting tokio runtime")?;
            let stats = runtime.block_on(run_room(config, &players, args))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).context("encoding stats")?
            );
        }
    }
    Ok(())
}

async fn run_room(
    config: GameConfig,
    players: &[PlayerId],
    args: RoomArgs,
) -> Result<FinalStats> {
    let room = RoomHandle::open(args.name, config, players).context("opening room")?;
    let mut events = room.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(?event, "room event"),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::time::sleep(Duration::from_secs(args.seconds)).await;
    let state = room.snapshot().await.context("reading room state")?;
    tracing::info!(
        phase = ?state.phase,
        wave = state.current_zombie_wave,
        enemies = state.enemies.len(),
        "closing room"
    );
    let stats = room.shutdown().await.context("closing room")?;
    logger.abort();
    Ok(stats)
}
