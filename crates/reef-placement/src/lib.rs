//! Fixed-being placement: scatters coral, fans and other static beings over
//! a generated reef height field.
//!
//! Placement is fully deterministic. Grid walking, archetype selection and
//! every acceptance roll come from a golden-ratio sequence seeded by the run
//! seed, so the same seed, parameters and catalogue always reproduce the same
//! layout.

mod archetype;
mod error;
mod host;
mod params;
mod picker;
mod placed;
mod placer;
mod sequence;

pub use archetype::{ArchetypeId, BeingArchetype};
pub use error::PlacementError;
pub use host::{BeingHost, HeadlessHost, HostInstance, InstanceHandle, ParentHandle};
pub use params::PlacementParameters;
pub use picker::Picker;
pub use placed::{PlacedBeing, PlacementAudit, PlacementStats};
pub use placer::{FixedBeingPlacer, PlacerState};
pub use sequence::{AttemptRolls, DeterministicSequence};
