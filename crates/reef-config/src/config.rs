//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level level-build configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Height-field generation settings.
    pub terrain: TerrainConfig,
    /// Cliff profile curve keys.
    pub cliff_curve: CurveConfig,
    /// Fixed being scatter settings.
    pub placement: PlacementConfig,
    /// Catalogue of placeable being archetypes, in picker order.
    pub archetypes: Vec<ArchetypeConfig>,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Build output settings.
    pub output: OutputConfig,
}

/// Terrain generation configuration.
///
/// Extents are in world units; `density` is vertices per world unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: i32,
    pub height: i32,
    pub density: f32,
    pub sand_bank_height: f32,
    pub sand_roughness: f32,
    pub perlin_offset: f32,
    pub cliff_scale: f32,
    pub cliff_intensity: f32,
    pub cliff_roughness: f32,
    pub cliff_roughness_intensity: f32,
    pub cliff_modifier_seed: f32,
    pub cliff_modifier_density: f32,
    pub cliff_modifier_intensity: f32,
    /// Name of the render material handed to the host. Generation refuses to
    /// run without one.
    pub material: Option<String>,
}

/// Keys of the three cliff profile channels, as `(t, value)` pairs with `t`
/// in `[0, 1]`.
///
/// X skews the radial distance by angle around the centre, Y drives the
/// horizontal encroachment toward the centre and Z the cliff height.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CurveConfig {
    pub x: Vec<(f32, f32)>,
    pub y: Vec<(f32, f32)>,
    pub z: Vec<(f32, f32)>,
}

/// Fixed being placement configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacementConfig {
    /// Seed for the deterministic placement sequence.
    pub seed: u32,
    /// Higher precision means smaller steps between visited grid points.
    pub placing_precision: f32,
    /// Number of sweeps over the grid.
    pub placing_passes: u32,
    /// Radius within which already placed beings affect clustering.
    pub cluster_range: f32,
}

/// One placeable being archetype.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchetypeConfig {
    pub name: String,
    pub spawnable: bool,
    pub frequency: f32,
    pub flat_affinity: f32,
    pub vertical_affinity: f32,
    pub deep_affinity: f32,
    pub shallow_affinity: f32,
    pub others_cluster_aversion: f32,
    pub others_cluster_affinity: f32,
    pub self_cluster_aversion: f32,
    pub self_cluster_affinity: f32,
    pub minimum_spacing: f32,
    pub can_be_upside_down: bool,
    pub always_point_up: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write a JSON log file next to the config.
    pub file_logging: bool,
}

/// Build output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Where to write the RON build summary. Nothing is written when unset.
    pub summary_path: Option<PathBuf>,
}

// --- Default implementations ---

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 20_000,
            height: 20_000,
            density: 0.002,
            sand_bank_height: 300.0,
            sand_roughness: 0.0003,
            perlin_offset: 0.0,
            cliff_scale: 3000.0,
            cliff_intensity: 5000.0,
            cliff_roughness: 0.0006,
            cliff_roughness_intensity: 100.0,
            cliff_modifier_seed: 0.0,
            cliff_modifier_density: 4.0,
            cliff_modifier_intensity: 100.0,
            material: Some("M_ReefSand".to_string()),
        }
    }
}

impl Default for CurveConfig {
    /// A reef basin: flat sand in the middle, a cliff wall rising toward the
    /// rim with a slight overhang.
    fn default() -> Self {
        Self {
            x: vec![(0.0, 1.0), (0.25, 1.1), (0.5, 0.95), (0.75, 1.05), (1.0, 1.0)],
            y: vec![(0.0, 0.0), (0.55, 0.0), (0.7, 0.08), (0.85, 0.02), (1.0, 0.0)],
            z: vec![(0.0, 0.0), (0.5, 0.0), (0.7, 0.6), (0.85, 1.0), (1.0, 1.0)],
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            placing_precision: 0.1,
            placing_passes: 100,
            cluster_range: 1000.0,
        }
    }
}

impl Default for ArchetypeConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
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

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            file_logging: false,
        }
    }
}

impl Config {
    /// The catalogue written into a freshly created config file.
    pub fn starter_archetypes() -> Vec<ArchetypeConfig> {
        vec![
            ArchetypeConfig {
                name: "brain_coral".to_string(),
                frequency: 0.4,
                flat_affinity: 0.9,
                vertical_affinity: 0.1,
                shallow_affinity: 0.8,
                deep_affinity: 0.3,
                minimum_spacing: 150.0,
                can_be_upside_down: false,
                always_point_up: true,
                ..Default::default()
            },
            ArchetypeConfig {
                name: "sea_fan".to_string(),
                frequency: 0.3,
                flat_affinity: 0.2,
                vertical_affinity: 0.9,
                self_cluster_affinity: 0.7,
                minimum_spacing: 80.0,
                ..Default::default()
            },
            ArchetypeConfig {
                name: "anemone".to_string(),
                frequency: 0.6,
                others_cluster_aversion: 0.8,
                minimum_spacing: 40.0,
                ..Default::default()
            },
        ]
    }
}

/// Default directory holding `config.ron`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reef")
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config {
                archetypes: Self::starter_archetypes(),
                ..Default::default()
            };
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(false)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
