//! Everything one level build needs, converted from the on-disk config.

use reef_config::{ArchetypeConfig, Config, CurveConfig, PlacementConfig, TerrainConfig};
use reef_placement::{ArchetypeId, BeingArchetype, PlacementParameters};
use reef_terrain::{CliffProfileCurve, MaterialHandle, TerrainParameters};

/// Inputs of a level build. Cheap to clone and send to the build worker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildSettings {
    pub terrain: TerrainParameters,
    pub curve: CliffProfileCurve,
    /// `None` leaves the terrain without a material, which fails generation.
    pub material: Option<MaterialHandle>,
    pub placement: PlacementParameters,
    /// Placement catalogue, in picker order.
    pub archetypes: Vec<BeingArchetype>,
}

impl BuildSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            terrain: terrain_from_config(&config.terrain),
            curve: cliff_curve_from_config(&config.cliff_curve),
            material: config.terrain.material.as_deref().map(MaterialHandle::new),
            placement: placement_from_config(&config.placement),
            archetypes: config.archetypes.iter().map(archetype_from_config).collect(),
        }
    }
}

pub fn terrain_from_config(config: &TerrainConfig) -> TerrainParameters {
    TerrainParameters {
        width: config.width,
        height: config.height,
        density: config.density,
        sand_bank_height: config.sand_bank_height,
        sand_roughness: config.sand_roughness,
        perlin_offset: config.perlin_offset,
        cliff_scale: config.cliff_scale,
        cliff_intensity: config.cliff_intensity,
        cliff_roughness: config.cliff_roughness,
        cliff_roughness_intensity: config.cliff_roughness_intensity,
        cliff_modifier_seed: config.cliff_modifier_seed,
        cliff_modifier_density: config.cliff_modifier_density,
        cliff_modifier_intensity: config.cliff_modifier_intensity,
    }
}

pub fn cliff_curve_from_config(config: &CurveConfig) -> CliffProfileCurve {
    CliffProfileCurve::from_keys(config.x.clone(), config.y.clone(), config.z.clone())
}

pub fn placement_from_config(config: &PlacementConfig) -> PlacementParameters {
    PlacementParameters {
        seed: config.seed,
        placing_precision: config.placing_precision,
        placing_passes: config.placing_passes,
        cluster_range: config.cluster_range,
    }
}

/// An unnamed entry keeps the default archetype id.
pub fn archetype_from_config(config: &ArchetypeConfig) -> BeingArchetype {
    let id = if config.name.trim().is_empty() {
        BeingArchetype::default().id
    } else {
        ArchetypeId::new(config.name.trim())
    };
    BeingArchetype {
        id,
        spawnable: config.spawnable,
        frequency: config.frequency,
        flat_affinity: config.flat_affinity,
        vertical_affinity: config.vertical_affinity,
        deep_affinity: config.deep_affinity,
        shallow_affinity: config.shallow_affinity,
        others_cluster_aversion: config.others_cluster_aversion,
        others_cluster_affinity: config.others_cluster_affinity,
        self_cluster_aversion: config.self_cluster_aversion,
        self_cluster_affinity: config.self_cluster_affinity,
        minimum_spacing: config.minimum_spacing,
        can_be_upside_down: config.can_be_upside_down,
        always_point_up: config.always_point_up,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_default_parameters() {
        let settings = BuildSettings::from_config(&Config::default());
        assert_eq!(settings.terrain, TerrainParameters::default());
        assert_eq!(settings.placement, PlacementParameters::default());
        assert_eq!(settings.material, Some(MaterialHandle::new("M_ReefSand")));
        assert!(settings.archetypes.is_empty());
    }

    #[test]
    fn test_archetype_fields_carry_over() {
        let config = ArchetypeConfig {
            name: " sea_fan ".to_string(),
            frequency: 0.3,
            vertical_affinity: 0.9,
            minimum_spacing: 80.0,
            can_be_upside_down: false,
            ..Default::default()
        };
        let archetype = archetype_from_config(&config);
        assert_eq!(archetype.id, ArchetypeId::new("sea_fan"));
        assert_eq!(archetype.frequency, 0.3);
        assert_eq!(archetype.vertical_affinity, 0.9);
        assert_eq!(archetype.minimum_spacing, 80.0);
        assert!(!archetype.can_be_upside_down);
        assert!(archetype.spawnable);
    }

    #[test]
    fn test_unnamed_archetype_gets_default_id() {
        let archetype = archetype_from_config(&ArchetypeConfig::default());
        assert_eq!(archetype.id, BeingArchetype::default().id);
    }

    #[test]
    fn test_curve_keys_carry_over() {
        let config = CurveConfig::default();
        let curve = cliff_curve_from_config(&config);
        assert_eq!(curve.z.keys(), config.z.as_slice());
        assert_eq!(curve.sample(1.0).z, 1.0);
    }

    #[test]
    fn test_missing_material_stays_missing() {
        let mut config = Config::default();
        config.terrain.material = None;
        assert_eq!(BuildSettings::from_config(&config).material, None);
    }
}
