use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session tuning shared by the engine and its adapters.
///
/// The defaults describe the reference deployment; adapters typically load
/// overrides from TOML, which is why every field falls back individually.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of grid columns.
    pub grid_columns: u32,
    /// Number of grid rows.
    pub grid_rows: u32,
    /// Simulation ticks per second driven by the room timer.
    pub tick_rate_hz: u32,
    /// Gold every player starts with.
    pub starting_gold: u32,
    /// Length of the preparation phase in seconds.
    pub preparation_secs: f32,
    /// Length of the break between waves in seconds.
    pub wave_break_secs: f32,
    /// Lead time of the warning emitted before a timed phase ends.
    pub warning_secs: f32,
    /// Seconds between two queued spawns.
    pub spawn_interval_secs: f32,
    /// Seed for every random decision in the session.
    pub seed: u64,
    /// Enables the castles' built-in king attack.
    pub castle_auto_attack: bool,
}

impl GameConfig {
    /// Fixed timestep between two ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_rate_hz.max(1)))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_columns: 40,
            grid_rows: 40,
            tick_rate_hz: 20,
            starting_gold: 100,
            preparation_secs: 30.0,
            wave_break_secs: 15.0,
            warning_secs: 10.0,
            spawn_interval_secs: 0.5,
            seed: 0x5eed_b457_10a5_u64,
            castle_auto_attack: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_tick_is_fifty_milliseconds() {
        assert_eq!(GameConfig::default().tick_interval(), Duration::from_millis(50));
    }
}
