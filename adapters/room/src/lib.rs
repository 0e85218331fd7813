#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! One tokio task per game room.
//!
//! The task owns its [`GameEngine`], advances it on a fixed interval and
//! applies queued commands between ticks, so a command never interleaves
//! with a running tick. Events fan out through a broadcast channel.

mod wire;

pub use wire::ClientMessage;

use std::time::Duration;

use bastion_core::{CommandError, FinalStats, FullState, GameConfig, GameEvent, PlayerId};
use bastion_engine::{Command, CommandReply, EventSink, GameEngine, InitError};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

const MAILBOX_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 1_024;

/// Failures surfaced by a [`RoomHandle`].
#[derive(Debug, Error)]
pub enum RoomError {
    /// The session could not be started.
    #[error(transparent)]
    Init(#[from] InitError),
    /// The engine rejected the command.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// The room task is no longer running.
    #[error("room is closed")]
    Closed,
    /// The room task panicked or was cancelled.
    #[error("room task failed: {0}")]
    Crashed(#[from] tokio::task::JoinError),
}

enum Request {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<CommandReply, CommandError>>,
    },
    Snapshot {
        reply: oneshot::Sender<FullState>,
    },
    Shutdown,
}

struct BroadcastSink(broadcast::Sender<GameEvent>);

impl EventSink for BroadcastSink {
    fn publish(&mut self, event: &GameEvent) {
        // No subscribers is not an error for the simulation.
        let _ = self.0.send(event.clone());
    }
}

/// Client side of a running room.
#[derive(Debug)]
pub struct RoomHandle {
    name: String,
    mailbox: mpsc::Sender<Request>,
    events: broadcast::Sender<GameEvent>,
    task: JoinHandle<FinalStats>,
}

impl RoomHandle {
    /// Starts a room task on the current tokio runtime.
    ///
    /// The session seed is derived from `config.seed` and the room name, so
    /// rooms sharing a config still play out differently.
    pub fn open(
        name: impl Into<String>,
        mut config: GameConfig,
        players: &[PlayerId],
    ) -> Result<Self, RoomError> {
        let name = name.into();
        config.seed = derive_room_seed(config.seed, &name);
        let interval = config.tick_interval();

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut engine = GameEngine::new(config);
        engine.subscribe(BroadcastSink(events.clone()));
        engine.init(players)?;

        let (mailbox, inbox) = mpsc::channel(MAILBOX_CAPACITY);
        let task = tokio::spawn(run_room(name.clone(), engine, inbox, interval));
        tracing::info!(room = %name, players = players.len(), "room opened");
        Ok(Self {
            name,
            mailbox,
            events,
            task,
        })
    }

    /// Name the room was opened with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receives every event published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Queues a command and waits for the engine's verdict.
    pub async fn send(&self, command: Command) -> Result<CommandReply, RoomError> {
        let (reply, response) = oneshot::channel();
        self.mailbox
            .send(Request::Command { command, reply })
            .await
            .map_err(|_| RoomError::Closed)?;
        let outcome = response.await.map_err(|_| RoomError::Closed)?;
        Ok(outcome?)
    }

    /// Parses a client message and queues the resulting command.
    pub async fn submit(&self, message: ClientMessage) -> Result<CommandReply, RoomError> {
        let command = message
            .into_command()
            .map_err(|error| RoomError::Command(error.into()))?;
        self.send(command).await
    }

    /// Full state as of the last processed tick or command.
    pub async fn snapshot(&self) -> Result<FullState, RoomError> {
        let (reply, response) = oneshot::channel();
        self.mailbox
            .send(Request::Snapshot { reply })
            .await
            .map_err(|_| RoomError::Closed)?;
        response.await.map_err(|_| RoomError::Closed)
    }

    /// Stops the timer, drops the engine and returns the session statistics.
    pub async fn shutdown(self) -> Result<FinalStats, RoomError> {
        // The task may already be gone; its join result is what matters.
        let _ = self.mailbox.send(Request::Shutdown).await;
        Ok(self.task.await?)
    }
}

async fn run_room(
    name: String,
    mut engine: GameEngine,
    mut inbox: mpsc::Receiver<Request>,
    interval: Duration,
) -> FinalStats {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => engine.tick(interval),
            request = inbox.recv() => match request {
                Some(Request::Command { command, reply }) => {
                    let _ = reply.send(engine.apply(command));
                }
                Some(Request::Snapshot { reply }) => {
                    let _ = reply.send(engine.get_full_state());
                }
                Some(Request::Shutdown) | None => break,
            },
        }
    }

    let stats = engine.stats();
    tracing::info!(room = %name, elapsed = engine.elapsed(), kills = stats.total_kills, "room closed");
    stats
}

/// Mixes the room name into a base seed.
#[must_use]
pub fn derive_room_seed(base: u64, room: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(room.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_seeds_depend_on_name_and_base() {
        let lobby = derive_room_seed(7, "lobby");
        assert_eq!(lobby, derive_room_seed(7, "lobby"));
        assert_ne!(lobby, derive_room_seed(7, "arena"));
        assert_ne!(lobby, derive_room_seed(8, "lobby"));
    }
}
