//! Reef terrain: a cliff-ringed height field driven by layered Perlin noise
//! and an authored cliff profile curve.
//!
//! [`TerrainGenerator`] owns the last completed [`HeightField`] snapshot and
//! rebuilds it only when parameters, material, or curve change.

mod curve;
mod error;
mod field;
mod generator;
mod mesh;
mod params;
mod progress;
mod surface;

pub use curve::{CliffProfileCurve, CurveChannel};
pub use error::TerrainError;
pub use field::{Bounds2, Bounds3, HeightField};
pub use generator::{MaterialHandle, TerrainGenerator};
pub use mesh::compute_normals_and_tangents;
pub use params::TerrainParameters;
pub use progress::{CancellationToken, NullProgress, Progress, ProgressSink, ProgressUpdate};
pub use surface::CliffSurface;
