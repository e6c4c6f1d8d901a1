//! Loading the game configuration and applying command-line overrides.

use anyhow::{Context, Result};
use rps_shared::{GameConfig, StrategyKind};
use std::path::Path;

/// Values given on the command line take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub strategy: Option<StrategyKind>,
    pub best_of: Option<u32>,
    pub capture_timeout_ms: Option<u64>,
    pub seed: Option<u64>,
}

/// Reads a JSON config file; missing keys keep their defaults. No path means all defaults.
pub fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

pub fn apply_overrides(mut config: GameConfig, overrides: &Overrides) -> GameConfig {
    if let Some(strategy) = overrides.strategy {
        config.ai_strategy = strategy;
    }
    if let Some(best_of) = overrides.best_of {
        config.best_of = best_of;
    }
    if let Some(timeout) = overrides.capture_timeout_ms {
        config.capture_timeout_ms = timeout;
    }
    if overrides.seed.is_some() {
        config.rng_seed = overrides.seed;
    }
    config
}

/// Loads, overrides and validates. Any failure here is fatal before the tick loop starts.
pub fn resolve_config(path: Option<&Path>, overrides: &Overrides) -> Result<GameConfig> {
    let config = apply_overrides(load_config(path)?, overrides);
    config.validate().context("Invalid game configuration")?;
    Ok(config)
}
