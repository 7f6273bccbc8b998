//! Placement error types.

/// Errors that abort a placement run.
///
/// Individual candidate rejections are not errors; they are counted in
/// [`PlacementStats`](crate::PlacementStats).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    /// The archetype catalogue has no entries.
    #[error("no fixed being archetypes to place")]
    EmptyCatalogue,

    /// The terrain has not been generated, or is dirty.
    #[error("terrain is not ready for placement")]
    TerrainNotReady,

    #[error("invalid placement parameters: {0}")]
    InvalidParameters(String),

    /// The caller cancelled the run. Beings are back to their pre-run state.
    #[error("placement cancelled")]
    Cancelled,
}
