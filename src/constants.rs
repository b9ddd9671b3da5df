pub const TICK_RATE: u32 = 8;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const DEFAULT_GRID_SIZE: i32 = 15;
pub const MIN_GRID_SIZE: i32 = 4;
pub const MAX_GRID_SIZE: i32 = 64;
pub const DEFAULT_PELLET_PROBABILITY: f64 = 0.7;
pub const DEFAULT_OBSTACLE_PROBABILITY: f64 = 0.15;
pub const DEFAULT_ROTATION_INTERVAL_TICKS: u32 = 60;
pub const DEFAULT_PURSUER_MOVE_EVERY: u32 = 2;
pub const DEFAULT_ADVERSARIAL_DEPTH: u32 = 1;
pub const MAX_ADVERSARIAL_DEPTH: u32 = 6;
pub const DEFAULT_INITIAL_LIVES: u32 = 5;
pub const DEFAULT_INVINCIBILITY_TICKS: u32 = 10;

pub const PELLET_POINTS: i32 = 10;
pub const PELLET_BONUS_EVERY: u32 = 5;
pub const PELLET_BONUS_POINTS: i32 = 25;
pub const EXTRA_LIFE_EVERY: u32 = 50;
pub const DESTINATION_BONUS: i32 = 500;

/// Observation fields fed to policy models.
pub const OBSERVATION_LEN: usize = 6;
pub const OBSERVATION_TICK_PERIOD: u64 = 10;

/// Uniform draws attempted per tile before `random_open_tile` falls back to a scan.
pub const RANDOM_TILE_ATTEMPTS_PER_TILE: usize = 4;
/// Pursuers other than the first avoid spawning this close to the evader.
pub const PURSUER_SPAWN_MIN_DISTANCE: i32 = 3;

pub fn pursuer_id(index: usize) -> String {
    format!("pursuer_{}", index + 1)
}
