use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::config::{GameConfig, PolicyKind};
use crate::error::PolicyLoadError;
use crate::policy::{self, LinearPolicy, PolicyModel};

pub const DEFAULT_PORT: u16 = 8080;

pub fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_PORT)
}

pub fn parse_seed(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
}

/// Explicit seed, or a fresh random one.
pub fn resolve_seed(seed: Option<u32>) -> u32 {
    seed.unwrap_or_else(rand::random::<u32>)
}

/// Reads a JSON config file; missing fields keep their defaults.
pub fn load_config(path: &Path) -> anyhow::Result<GameConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// A weights file takes precedence over the configured built-in policy.
pub fn load_policy(
    kind: PolicyKind,
    weights: Option<&Path>,
) -> Result<Arc<dyn PolicyModel>, PolicyLoadError> {
    match weights {
        Some(path) => Ok(Arc::new(LinearPolicy::load(path)?)),
        None => Ok(policy::from_kind(kind)),
    }
}
