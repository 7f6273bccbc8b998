//! Level build error types.

use reef_config::ConfigError;
use reef_placement::PlacementError;
use reef_terrain::TerrainError;

/// Errors that can abort a level build.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error(transparent)]
    Terrain(#[from] TerrainError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failed to read or write a build summary.
    #[error("build output I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize build summary: {0}")]
    Serialize(#[from] ron::Error),

    #[error("failed to parse build summary: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The background worker thread is gone.
    #[error("build worker stopped")]
    WorkerStopped,
}

impl EnvironmentError {
    /// True when the build was cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Terrain(TerrainError::Cancelled) | Self::Placement(PlacementError::Cancelled)
        )
    }
}
