//! Placed-being records and the per-run statistics.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{ArchetypeId, InstanceHandle};

/// Why a being ended up where it is: the values the acceptance gates saw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementAudit {
    /// `x * y` of the grid point.
    pub item_number: u64,
    /// Depth gate threshold after blending by depth.
    pub skewed_depth_affinity: f32,
    /// Slope gate threshold after blending by flatness.
    pub skewed_flatness_affinity: f32,
    pub self_cluster_positive_score: f32,
    pub self_cluster_negative_score: f32,
    pub others_cluster_positive_score: f32,
    pub others_cluster_negative_score: f32,
    pub placement_pass: u32,
    pub beings_when_placed: usize,
    pub beings_nearby: usize,
    pub same_beings_nearby: usize,
    pub other_beings_nearby: usize,
    pub cluster_radius: f32,
}

/// One being committed by a placement run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedBeing {
    pub handle: InstanceHandle,
    pub archetype: ArchetypeId,
    pub location: Vec3,
    pub rotation: Quat,
    /// Copied from the archetype so spacing checks need no catalogue lookup.
    pub minimum_spacing: f32,
    pub audit: PlacementAudit,
}

/// Aggregate counters for one run. Logged once instead of per attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementStats {
    pub passes: u32,
    pub attempts: u64,
    pub placed: u64,
    pub empty_picker: u64,
    pub rejected_unspawnable: u64,
    pub rejected_frequency: u64,
    pub rejected_upside_down: u64,
    pub rejected_depth: u64,
    pub rejected_slope: u64,
    pub rejected_spacing: u64,
    pub rejected_cluster: u64,
}

impl PlacementStats {
    pub fn rejected(&self) -> u64 {
        self.rejected_unspawnable
            + self.rejected_frequency
            + self.rejected_upside_down
            + self.rejected_depth
            + self.rejected_slope
            + self.rejected_spacing
            + self.rejected_cluster
    }
}
