//! The level-build orchestrator.

use std::path::Path;

use glam::Vec3;
use reef_placement::{
    BeingHost, FixedBeingPlacer, ParentHandle, PlacedBeing, PlacementError, PlacementStats,
};
use reef_terrain::{CancellationToken, Progress, ProgressSink, TerrainGenerator};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{BuildSettings, EnvironmentError};

/// Outcome of a build, small enough to hand back across threads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Vertex counts along X and Y.
    pub grid: (usize, usize),
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    /// Completed terrain rebuilds since the environment was created.
    pub terrain_generations: u64,
    pub placed: usize,
    pub stats: PlacementStats,
}

/// What `reef-build` writes to disk: the report plus every placed being.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub report: BuildReport,
    pub beings: Vec<PlacedBeing>,
}

impl BuildSummary {
    pub fn load(path: &Path) -> Result<Self, EnvironmentError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }
}

/// Owns one level: its terrain, the placer scattering beings over it, the
/// host those beings live in, and the parent they are attached to.
///
/// Every collaborator is handed in at construction. Nothing is looked up
/// globally.
#[derive(Debug)]
pub struct Environment<H: BeingHost> {
    settings: BuildSettings,
    terrain: TerrainGenerator,
    placer: FixedBeingPlacer,
    host: H,
    parent: ParentHandle,
}

impl<H: BeingHost> Environment<H> {
    pub fn new(settings: BuildSettings, host: H, parent: ParentHandle) -> Self {
        let mut environment = Self {
            settings: BuildSettings::default(),
            terrain: TerrainGenerator::new(),
            placer: FixedBeingPlacer::new(),
            host,
            parent,
        };
        environment.apply_settings(settings);
        environment
    }

    /// Take new settings. The terrain is only dirtied by a material or curve
    /// that actually changed, and parameter changes are picked up by the
    /// cache comparison on the next build. A `None` material keeps the
    /// current one.
    pub fn apply_settings(&mut self, settings: BuildSettings) {
        if let Some(material) = &settings.material {
            self.terrain.set_material(material.clone());
        }
        if self.terrain.cliff_curve() != Some(&settings.curve) {
            self.terrain.set_cliff_curve(settings.curve.clone());
        }
        self.settings = settings;
    }

    /// Rebuild the terrain if anything changed, then redistribute the fixed
    /// beings over it.
    pub fn regenerate_terrain(
        &mut self,
        cancel: CancellationToken,
        sink: &mut dyn ProgressSink,
    ) -> Result<BuildReport, EnvironmentError> {
        let params = self.settings.terrain;
        let total = TerrainGenerator::work_total(&params)
            + FixedBeingPlacer::work_total(&self.settings.placement, params.grid_size());
        let mut progress = Progress::new(total, cancel, sink);

        self.terrain.generate(&params, &mut progress)?;
        self.place(&mut progress)?;
        Ok(self.report())
    }

    /// Redistribute the fixed beings. A terrain that is not ready is
    /// generated first.
    pub fn regenerate_fixed_beings(
        &mut self,
        cancel: CancellationToken,
        sink: &mut dyn ProgressSink,
    ) -> Result<BuildReport, EnvironmentError> {
        if !self.terrain.is_ready() {
            info!("Terrain not ready, generating it before placing fixed beings");
            return self.regenerate_terrain(cancel, sink);
        }
        let total =
            FixedBeingPlacer::work_total(&self.settings.placement, self.terrain.grid_size());
        let mut progress = Progress::new(total, cancel, sink);
        self.place(&mut progress)?;
        Ok(self.report())
    }

    fn place(&mut self, progress: &mut Progress<'_>) -> Result<(), EnvironmentError> {
        let result = self.placer.redistribute(
            &self.settings.placement,
            &self.settings.archetypes,
            &self.terrain,
            self.parent,
            &mut self.host,
            progress,
        );
        match result {
            Ok(_) => {}
            Err(PlacementError::EmptyCatalogue) => {
                warn!("No fixed being archetypes configured, level has terrain only");
                self.placer.clear_all(&mut self.host);
            }
            Err(e) => return Err(e.into()),
        }
        let remaining = progress.total() - progress.completed();
        progress.enter_frame(remaining, "Build complete");
        Ok(())
    }

    /// Destroy every fixed being of this level.
    pub fn clear_fixed_beings(&mut self) -> BuildReport {
        let count = self.placer.placed().len();
        self.placer.clear_all(&mut self.host);
        info!("Cleared {count} fixed beings");
        self.report()
    }

    /// Re-adopt beings the host already has attached to the parent, for
    /// example after loading a saved level.
    pub fn reload_children(&mut self) -> usize {
        self.placer.reconcile_children(self.parent, &mut self.host)
    }

    pub fn report(&self) -> BuildReport {
        let bounds = self.terrain.bounding_box_3d();
        BuildReport {
            grid: self.terrain.grid_size(),
            bounds_min: bounds.min,
            bounds_max: bounds.max,
            terrain_generations: self.terrain.generation_count(),
            placed: self.placer.placed().len(),
            stats: self.placer.last_stats(),
        }
    }

    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            report: self.report(),
            beings: self.placer.placed().to_vec(),
        }
    }

    /// Write [`summary`](Self::summary) to `path` as RON.
    pub fn write_summary(&self, path: &Path) -> Result<(), EnvironmentError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(false)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(&self.summary(), pretty)?;
        std::fs::write(path, serialized)?;
        info!("Wrote build summary to {}", path.display());
        Ok(())
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    pub fn placer(&self) -> &FixedBeingPlacer {
        &self.placer
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn parent(&self) -> ParentHandle {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_placement::{BeingArchetype, HeadlessHost, PlacementParameters};
    use reef_terrain::{
        CliffProfileCurve, MaterialHandle, NullProgress, ProgressUpdate, TerrainError,
        TerrainParameters,
    };

    const PARENT: ParentHandle = ParentHandle(7);

    fn settings() -> BuildSettings {
        let open = |name: &str, spacing: f32| BeingArchetype {
            frequency: 1.0,
            flat_affinity: 1.0,
            vertical_affinity: 1.0,
            deep_affinity: 1.0,
            shallow_affinity: 1.0,
            self_cluster_affinity: 0.0,
            self_cluster_aversion: 0.0,
            others_cluster_affinity: 0.0,
            others_cluster_aversion: 0.0,
            minimum_spacing: spacing,
            ..BeingArchetype::named(name)
        };
        BuildSettings {
            terrain: TerrainParameters::flat(1000, 1000, 0.01),
            curve: CliffProfileCurve::flat(),
            material: Some(MaterialHandle::new("M_ReefSand")),
            placement: PlacementParameters {
                seed: 11,
                placing_precision: 0.1,
                placing_passes: 4,
                cluster_range: 300.0,
            },
            archetypes: vec![open("staghorn", 150.0), open("sponge", 90.0)],
        }
    }

    fn environment(settings: BuildSettings) -> Environment<HeadlessHost> {
        Environment::new(settings, HeadlessHost::new(), PARENT)
    }

    fn build(env: &mut Environment<HeadlessHost>) -> Result<BuildReport, EnvironmentError> {
        env.regenerate_terrain(CancellationToken::new(), &mut NullProgress)
    }

    fn locations(env: &Environment<HeadlessHost>) -> Vec<Vec3> {
        env.placer().placed().iter().map(|b| b.location).collect()
    }

    #[test]
    fn test_regenerate_terrain_places_beings() {
        let mut env = environment(settings());
        let report = build(&mut env).unwrap();

        assert_eq!(report.grid, (10, 10));
        assert_eq!(report.terrain_generations, 1);
        assert!(report.placed > 0, "Open archetypes should place something");
        assert_eq!(report.placed as u64, report.stats.placed);
        assert_eq!(env.host().active_count(), report.placed);
        assert_eq!(env.host().live_count(), report.placed, "No pending leftovers");
        assert_eq!(report.bounds_min.z, 0.0);
        assert_eq!(report.bounds_max.z, 0.0);
    }

    #[test]
    fn test_builds_are_deterministic() {
        let mut a = environment(settings());
        let mut b = environment(settings());
        build(&mut a).unwrap();
        build(&mut b).unwrap();
        assert_eq!(locations(&a), locations(&b));
    }

    #[test]
    fn test_unchanged_terrain_is_not_rebuilt() {
        let mut env = environment(settings());
        build(&mut env).unwrap();
        env.apply_settings(settings());
        assert!(!env.terrain().is_dirty(), "Identical settings must not dirty");
        let report = build(&mut env).unwrap();
        assert_eq!(report.terrain_generations, 1);
    }

    #[test]
    fn test_fixed_beings_generate_missing_terrain_first() {
        let mut env = environment(settings());
        let report = env
            .regenerate_fixed_beings(CancellationToken::new(), &mut NullProgress)
            .unwrap();
        assert_eq!(report.terrain_generations, 1);
        assert!(report.placed > 0);

        let again = env
            .regenerate_fixed_beings(CancellationToken::new(), &mut NullProgress)
            .unwrap();
        assert_eq!(again.terrain_generations, 1, "Ready terrain is reused");
        assert_eq!(again.placed, report.placed);
    }

    #[test]
    fn test_missing_material_fails_build() {
        let mut env = environment(BuildSettings {
            material: None,
            ..settings()
        });
        let err = build(&mut env).unwrap_err();
        assert!(matches!(
            err,
            EnvironmentError::Terrain(TerrainError::MissingMaterial)
        ));
        assert_eq!(env.report().placed, 0);
    }

    #[test]
    fn test_empty_catalogue_builds_terrain_only() {
        let mut env = environment(settings());
        build(&mut env).unwrap();
        env.apply_settings(BuildSettings {
            archetypes: Vec::new(),
            ..settings()
        });
        let report = build(&mut env).unwrap();
        assert_eq!(report.placed, 0);
        assert_eq!(env.host().live_count(), 0);
        assert_eq!(report.grid, (10, 10));
    }

    #[test]
    fn test_cancelled_build_keeps_previous_layout() {
        let mut env = environment(settings());
        build(&mut env).unwrap();
        let before = locations(&env);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = env
            .regenerate_terrain(cancel, &mut NullProgress)
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(locations(&env), before);
        assert_eq!(env.host().active_count(), before.len());
    }

    #[test]
    fn test_progress_reaches_completion() {
        let mut env = environment(settings());
        let mut fractions = Vec::new();
        let mut sink = |update: ProgressUpdate<'_>| fractions.push(update.fraction());
        env.regenerate_terrain(CancellationToken::new(), &mut sink)
            .unwrap();
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]), "Progress never goes back");
        assert_eq!(fractions.last().copied(), Some(1.0));
    }

    #[test]
    fn test_clear_fixed_beings() {
        let mut env = environment(settings());
        build(&mut env).unwrap();
        let report = env.clear_fixed_beings();
        assert_eq!(report.placed, 0);
        assert_eq!(env.host().live_count(), 0);
    }

    #[test]
    fn test_reload_children_adopts_attached_instances() {
        let mut env = environment(settings());
        let archetype = settings().archetypes[0].clone();
        let host = env.host_mut();
        let child = host.spawn(&archetype).unwrap();
        host.set_transform(child, Vec3::new(50.0, 60.0, 0.0), glam::Quat::IDENTITY);
        host.attach(child, PARENT);
        let stray = host.spawn(&archetype).unwrap();

        assert_eq!(env.reload_children(), 1);
        let placed = env.placer().placed();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].handle, child);
        assert_eq!(placed[0].location, Vec3::new(50.0, 60.0, 0.0));
        assert!(env.host().is_alive(stray), "Unattached instances are left alone");
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("summary.ron");
        let mut env = environment(settings());
        let report = build(&mut env).unwrap();

        env.write_summary(&path).unwrap();
        let summary = BuildSummary::load(&path).unwrap();
        assert_eq!(summary.report.grid, report.grid);
        assert_eq!(summary.report.stats, report.stats);
        assert_eq!(summary.beings.len(), report.placed);
        let handles: Vec<_> = env.placer().placed().iter().map(|b| b.handle).collect();
        let loaded: Vec<_> = summary.beings.iter().map(|b| b.handle).collect();
        assert_eq!(loaded, handles);
    }
}
