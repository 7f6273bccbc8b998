//! Configuration for reef level builds.
//!
//! Terrain, cliff profile, placement and being catalogue settings persist to
//! disk as a RON file. Supports CLI overrides via clap, hot-reload detection,
//! and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    ArchetypeConfig, Config, CurveConfig, DebugConfig, OutputConfig, PlacementConfig,
    TerrainConfig, default_config_dir,
};
pub use error::ConfigError;
