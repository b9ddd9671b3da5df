use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("no open tile available on a {size}x{size} grid")]
    FullyObstructed { size: i32 },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid size must be within {min}..={max}, got {actual}")]
    GridSize { min: i32, max: i32, actual: i32 },
    #[error("{name} must be within [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[error("pursuer move cadence must be at least 1 tick")]
    ZeroCadence,
    #[error("initial lives must be at least 1")]
    ZeroLives,
    #[error("adversarial depth must be within 1..={max}, got {actual}")]
    AdversarialDepth { max: u32, actual: u32 },
    #[error("at least one pursuer is required")]
    NoPursuers,
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid game config: {0}")]
    Config(#[from] ConfigError),
    #[error("grid construction failed: {0}")]
    Grid(#[from] GridError),
}

#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("failed to read policy weights {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse policy weights {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported policy weights version {0}")]
    UnsupportedVersion(u8),
    #[error("policy weights contain non-finite values")]
    NonFinite,
}
