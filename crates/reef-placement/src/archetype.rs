//! Being archetypes: the templates the placer draws candidates from.

use serde::{Deserialize, Serialize};

/// Identifies an archetype. Two placed beings are "the same kind" for
/// clustering when their ids are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchetypeId(pub String);

impl ArchetypeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Placement preferences of one kind of fixed being.
///
/// Every weight is in `[0, 1]`. Affinities pairs are blended by the terrain
/// property they name: `shallow_affinity` applies at depth 0 and
/// `deep_affinity` at depth 1, `vertical_affinity` on walls and
/// `flat_affinity` on level ground.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeingArchetype {
    pub id: ArchetypeId,
    /// Archetypes that are not spawnable are drawn but never placed.
    pub spawnable: bool,
    /// Chance that a drawn candidate is considered at all.
    pub frequency: f32,
    pub flat_affinity: f32,
    pub vertical_affinity: f32,
    pub deep_affinity: f32,
    pub shallow_affinity: f32,
    /// How strongly nearby beings of other archetypes discourage placement.
    pub others_cluster_aversion: f32,
    /// How strongly nearby beings of other archetypes encourage placement.
    pub others_cluster_affinity: f32,
    pub self_cluster_aversion: f32,
    pub self_cluster_affinity: f32,
    /// Hard minimum distance to any other placed being, in world units.
    pub minimum_spacing: f32,
    /// Whether the being may sit on overhangs where the surface faces down.
    pub can_be_upside_down: bool,
    /// Ignore the surface normal and only spin about world up.
    pub always_point_up: bool,
}

impl BeingArchetype {
    /// Default preferences under the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: ArchetypeId::new(name),
            ..Self::default()
        }
    }

    /// Chance to pass the depth gate at `depth` in `[0, 1]`.
    pub fn depth_affinity(&self, depth: f32) -> f32 {
        self.shallow_affinity + (self.deep_affinity - self.shallow_affinity) * depth
    }

    /// Chance to pass the slope gate at `flatness` (|normal.z|) in `[0, 1]`.
    pub fn flatness_affinity(&self, flatness: f32) -> f32 {
        self.vertical_affinity + (self.flat_affinity - self.vertical_affinity) * flatness
    }
}

impl Default for BeingArchetype {
    fn default() -> Self {
        Self {
            id: ArchetypeId::new("fixed_being"),
            spawnable: true,
            frequency: 0.5,
            flat_affinity: 0.5,
            vertical_affinity: 0.5,
            deep_affinity: 0.5,
            shallow_affinity: 0.5,
            others_cluster_aversion: 0.5,
            others_cluster_affinity: 0.5,
            self_cluster_aversion: 0.5,
            self_cluster_affinity: 0.5,
            minimum_spacing: 0.5,
            can_be_upside_down: true,
            always_point_up: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let a = BeingArchetype::named("brain_coral");
        assert_eq!(a.id.as_str(), "brain_coral");
        assert!(a.spawnable);
        assert!(a.can_be_upside_down);
        assert!(!a.always_point_up);
        assert_eq!(a.frequency, 0.5);
        assert_eq!(a.minimum_spacing, 0.5);
    }

    #[test]
    fn test_affinity_blends() {
        let a = BeingArchetype {
            shallow_affinity: 0.2,
            deep_affinity: 1.0,
            vertical_affinity: 0.0,
            flat_affinity: 0.8,
            ..BeingArchetype::named("fan")
        };
        assert_eq!(a.depth_affinity(0.0), 0.2);
        assert_eq!(a.depth_affinity(1.0), 1.0);
        assert!((a.depth_affinity(0.5) - 0.6).abs() < 1e-6);
        assert_eq!(a.flatness_affinity(0.0), 0.0);
        assert!((a.flatness_affinity(1.0) - 0.8).abs() < 1e-6);
    }
}
