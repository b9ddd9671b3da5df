pub mod adversarial;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod pathfinding;
pub mod policy;
pub mod rng;
pub mod server_protocol;
pub mod server_utils;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod world;
