use std::{fs, path::Path};

use anyhow::{Context, Result};
use bastion_core::GameConfig;

/// Loads the session configuration and applies command-line overrides.
pub(crate) fn load(path: Option<&Path>, seed: Option<u64>, no_king: bool) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            parse(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if no_king {
        config.castle_auto_attack = false;
    }
    Ok(config)
}

fn parse(text: &str) -> Result<GameConfig> {
    let config: GameConfig = toml::from_str(text)?;
    anyhow::ensure!(
        config.grid_columns >= 8 && config.grid_rows >= 8,
        "grid must be at least 8x8, got {}x{}",
        config.grid_columns,
        config.grid_rows
    );
    anyhow::ensure!(config.tick_rate_hz > 0, "tick_rate_hz must be positive");
    Ok(config)
}
