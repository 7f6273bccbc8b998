//! Terrain generation error types.

/// Errors that abort a terrain generation. A failed generation never touches
/// the previously completed field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    /// No render material has been assigned.
    #[error("terrain material is not set")]
    MissingMaterial,

    /// No cliff profile curve has been assigned.
    #[error("cliff curve is not set")]
    MissingCliffCurve,

    /// The parameters cannot produce a grid.
    #[error("invalid terrain parameters: {0}")]
    InvalidParameters(String),

    /// The caller cancelled the generation.
    #[error("terrain generation cancelled")]
    Cancelled,
}
