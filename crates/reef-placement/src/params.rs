//! Placement run parameters.

use crate::PlacementError;

/// Parameters of one redistribution run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementParameters {
    /// Seed for the deterministic sequence and the rotation generator.
    pub seed: u32,
    /// Scales step sizes down: higher precision visits more grid points.
    pub placing_precision: f32,
    /// Number of sweeps. Later passes step more finely.
    pub placing_passes: u32,
    /// Radius in world units within which placed beings influence clustering.
    pub cluster_range: f32,
}

impl Default for PlacementParameters {
    fn default() -> Self {
        Self {
            seed: 0,
            placing_precision: 0.1,
            placing_passes: 100,
            cluster_range: 1000.0,
        }
    }
}

impl PlacementParameters {
    pub fn validate(&self) -> Result<(), PlacementError> {
        if !(self.placing_precision.is_finite() && self.placing_precision > 0.0) {
            return Err(PlacementError::InvalidParameters(format!(
                "placing precision must be positive, got {}",
                self.placing_precision
            )));
        }
        if !(self.cluster_range.is_finite() && self.cluster_range > 0.0) {
            return Err(PlacementError::InvalidParameters(format!(
                "cluster range must be positive, got {}",
                self.cluster_range
            )));
        }
        Ok(())
    }
}
