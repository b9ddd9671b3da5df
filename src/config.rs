use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ADVERSARIAL_DEPTH, DEFAULT_GRID_SIZE, DEFAULT_INITIAL_LIVES,
    DEFAULT_INVINCIBILITY_TICKS, DEFAULT_OBSTACLE_PROBABILITY, DEFAULT_PELLET_PROBABILITY,
    DEFAULT_PURSUER_MOVE_EVERY, DEFAULT_ROTATION_INTERVAL_TICKS, MAX_ADVERSARIAL_DEPTH,
    MAX_GRID_SIZE, MIN_GRID_SIZE,
};
use crate::error::ConfigError;
use crate::types::StrategyKind;

/// Built-in policy models selectable from config. Trained weights are loaded
/// by the host and handed to the engine directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Idle,
    Greedy,
}

impl PolicyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "idle" | "stay" => Some(Self::Idle),
            "greedy" => Some(Self::Greedy),
            _ => None,
        }
    }
}

/// What happens to the destination when the maze rotates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationPolicy {
    /// Keep the raw coordinate.
    Keep,
    /// Follow the destination tile through the rotation.
    #[default]
    Remap,
    /// Pick a fresh open tile.
    Reroll,
}

impl DestinationPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "keep" => Some(Self::Keep),
            "remap" => Some(Self::Remap),
            "reroll" => Some(Self::Reroll),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub grid_size: i32,
    pub pellet_probability: f64,
    pub obstacle_probability: f64,
    /// `0` disables rotation.
    pub rotation_interval_ticks: u32,
    pub pursuer_move_every: u32,
    pub adversarial_depth: u32,
    pub initial_lives: u32,
    pub invincibility_ticks: u32,
    pub pursuers: Vec<StrategyKind>,
    pub policy: PolicyKind,
    pub destination_policy: DestinationPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            pellet_probability: DEFAULT_PELLET_PROBABILITY,
            obstacle_probability: DEFAULT_OBSTACLE_PROBABILITY,
            rotation_interval_ticks: DEFAULT_ROTATION_INTERVAL_TICKS,
            pursuer_move_every: DEFAULT_PURSUER_MOVE_EVERY,
            adversarial_depth: DEFAULT_ADVERSARIAL_DEPTH,
            initial_lives: DEFAULT_INITIAL_LIVES,
            invincibility_ticks: DEFAULT_INVINCIBILITY_TICKS,
            pursuers: vec![
                StrategyKind::ShortestPath,
                StrategyKind::Adversarial,
                StrategyKind::Policy,
            ],
            policy: PolicyKind::default(),
            destination_policy: DestinationPolicy::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(ConfigError::GridSize {
                min: MIN_GRID_SIZE,
                max: MAX_GRID_SIZE,
                actual: self.grid_size,
            });
        }
        for (name, value) in [
            ("pelletProbability", self.pellet_probability),
            ("obstacleProbability", self.obstacle_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if self.pursuer_move_every == 0 {
            return Err(ConfigError::ZeroCadence);
        }
        if self.initial_lives == 0 {
            return Err(ConfigError::ZeroLives);
        }
        if !(1..=MAX_ADVERSARIAL_DEPTH).contains(&self.adversarial_depth) {
            return Err(ConfigError::AdversarialDepth {
                max: MAX_ADVERSARIAL_DEPTH,
                actual: self.adversarial_depth,
            });
        }
        if self.pursuers.is_empty() {
            return Err(ConfigError::NoPursuers);
        }
        Ok(())
    }
}
