//! Reef level builds: terrain generation followed by fixed being placement.
//!
//! [`Environment`] owns the terrain generator, the placer and the host the
//! beings live in. [`BuildWorker`] runs an environment on a background thread
//! and restarts the build whenever a newer request arrives.

mod environment;
mod error;
mod settings;
mod worker;

pub use environment::{BuildReport, BuildSummary, Environment};
pub use error::EnvironmentError;
pub use settings::{
    BuildSettings, archetype_from_config, cliff_curve_from_config, placement_from_config,
    terrain_from_config,
};
pub use worker::{BuildEvent, BuildRequest, BuildWorker};
