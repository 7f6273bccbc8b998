//! Multi-pass deterministic scatter of fixed beings over the height field.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reef_terrain::{HeightField, Progress, TerrainGenerator};
use tracing::{debug, error, info, warn};

use crate::{
    BeingArchetype, BeingHost, DeterministicSequence, ParentHandle, Picker, PlacedBeing,
    PlacementAudit, PlacementError, PlacementParameters, PlacementStats,
};

/// Where a placer is in its run lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlacerState {
    #[default]
    Idle,
    /// Recycling the previous layout into the picker.
    Preparing,
    /// Sweeping the grid; the pass is 1-based.
    Placing(u32),
    Done,
}

/// Inputs that stay fixed for the whole run.
struct RunContext<'a> {
    params: &'a PlacementParameters,
    field: &'a HeightField,
    parent: ParentHandle,
}

/// Clustering scores of a candidate against the beings placed so far.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ClusterScores {
    self_positive: f32,
    self_negative: f32,
    others_positive: f32,
    others_negative: f32,
    same_nearby: usize,
    others_nearby: usize,
}

/// Scatters fixed beings over a terrain and keeps track of what it placed.
///
/// The placer is re-entrant: every [`redistribute`](Self::redistribute)
/// recycles the current layout and starts over from the seed. A cancelled
/// run restores the layout that existed before it started.
#[derive(Debug, Default)]
pub struct FixedBeingPlacer {
    state: PlacerState,
    catalogue: Vec<BeingArchetype>,
    picker: Picker,
    picker_dirty: bool,
    placed: Vec<PlacedBeing>,
    sequence: DeterministicSequence,
    last_stats: PlacementStats,
}

impl FixedBeingPlacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total progress frames one run over a `num_x` by `num_y` grid enters.
    pub fn work_total(params: &PlacementParameters, grid: (usize, usize)) -> f64 {
        2.0 + params.placing_passes as f64 * (grid.0 * grid.1) as f64
    }

    pub fn state(&self) -> PlacerState {
        self.state
    }

    pub fn placed(&self) -> &[PlacedBeing] {
        &self.placed
    }

    pub fn catalogue(&self) -> &[BeingArchetype] {
        &self.catalogue
    }

    pub fn picker(&self) -> &Picker {
        &self.picker
    }

    pub fn last_stats(&self) -> PlacementStats {
        self.last_stats
    }

    /// Replace the catalogue. A catalogue that differs by value rebuilds the
    /// picker pools on the next run.
    pub fn set_catalogue(&mut self, archetypes: &[BeingArchetype]) {
        if self.catalogue.as_slice() != archetypes {
            self.catalogue = archetypes.to_vec();
            self.picker_dirty = true;
        }
    }

    /// Scatter beings from `archetypes` over the terrain's current field.
    ///
    /// Runs `placing_passes` sweeps, each walking the grid with golden-ratio
    /// steps and making one placement attempt per visited point. The
    /// cancellation flag is polled after every row.
    pub fn redistribute<H: BeingHost>(
        &mut self,
        params: &PlacementParameters,
        archetypes: &[BeingArchetype],
        terrain: &TerrainGenerator,
        parent: ParentHandle,
        host: &mut H,
        progress: &mut Progress<'_>,
    ) -> Result<PlacementStats, PlacementError> {
        if let Err(e) = params.validate() {
            error!("Fixed being placement aborted: {e}");
            return Err(e);
        }

        let previous_catalogue = self.catalogue.clone();
        self.set_catalogue(archetypes);

        let field = match terrain.field() {
            Some(field) if terrain.is_ready() => field.clone(),
            _ => {
                error!("Fixed being placement aborted: terrain is not ready");
                return Err(PlacementError::TerrainNotReady);
            }
        };
        if self.catalogue.is_empty() {
            error!("Fixed being placement aborted: no archetypes to place");
            return Err(PlacementError::EmptyCatalogue);
        }

        self.state = PlacerState::Preparing;
        progress.enter_frame(1.0, "Preparing fixed beings");
        if progress.should_cancel() {
            self.state = PlacerState::Idle;
            return Err(PlacementError::Cancelled);
        }

        let committed = self.placed.clone();
        self.picker
            .ensure_layout(self.catalogue.len(), self.picker_dirty, host);
        self.picker_dirty = false;
        self.despawn_to_picker(host);

        self.sequence.reset(params.seed);
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed as u64);
        let mut stats = PlacementStats::default();
        let ctx = RunContext {
            params,
            field: &field,
            parent,
        };

        progress.enter_frame(1.0, "Placing fixed beings");
        for pass in 1..=params.placing_passes {
            self.state = PlacerState::Placing(pass);
            if let Err(e) = self.place_pass(pass, &ctx, host, &mut rng, &mut stats, progress) {
                info!(
                    "Fixed being placement cancelled in pass {pass}, restoring {} beings",
                    committed.len()
                );
                self.roll_back(committed, &previous_catalogue, parent, host);
                return Err(e);
            }
            stats.passes = pass;
            debug!(
                "Fixed being pass {pass}: {} placed so far, {} attempts",
                self.placed.len(),
                stats.attempts
            );
        }

        self.picker.clear(host);
        self.state = PlacerState::Done;
        self.last_stats = stats;
        info!(
            "Placed {} fixed beings in {} passes ({} attempts, {} rejected, {} too close)",
            stats.placed,
            stats.passes,
            stats.attempts,
            stats.rejected(),
            stats.rejected_spacing
        );
        Ok(stats)
    }

    fn place_pass<H: BeingHost>(
        &mut self,
        pass: u32,
        ctx: &RunContext<'_>,
        host: &mut H,
        rng: &mut ChaCha8Rng,
        stats: &mut PlacementStats,
        progress: &mut Progress<'_>,
    ) -> Result<(), PlacementError> {
        if progress.should_cancel() {
            return Err(PlacementError::Cancelled);
        }

        let num_x = ctx.field.num_x();
        let num_y = ctx.field.num_y();
        let precision = ctx.params.placing_precision;
        let message = format!("Placing fixed beings pass {pass}");

        // Cursors start one before the grid so a step of 1 visits index 0.
        let mut y: Option<usize> = None;
        loop {
            let y_step = self.sequence.step(pass, precision);
            let row = y.map_or(y_step - 1, |y| y + y_step);
            if row >= num_y {
                break;
            }
            y = Some(row);

            let mut x: Option<usize> = None;
            loop {
                let x_step = self.sequence.step(pass, precision);
                let next = x.map_or(x_step - 1, |x| x + x_step);
                if next >= num_x {
                    break;
                }
                x = Some(next);
                self.attempt(pass, next, row, ctx, host, rng, stats);
            }

            progress.enter_frame((y_step * num_x) as f64, &message);
            if progress.should_cancel() {
                return Err(PlacementError::Cancelled);
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn attempt<H: BeingHost>(
        &mut self,
        pass: u32,
        x: usize,
        y: usize,
        ctx: &RunContext<'_>,
        host: &mut H,
        rng: &mut ChaCha8Rng,
        stats: &mut PlacementStats,
    ) {
        let (fx, fy) = (x as f32, y as f32);
        let depth = ctx.field.depth_percentage(fx, fy);
        let normal = ctx.field.normal(fx, fy);
        let location = ctx.field.vertex_position(fx, fy);
        let flatness = normal.z.abs();
        let upside_down = normal.z < 0.0;

        self.picker.refill(&self.catalogue, host);
        let index = self.sequence.picker_index(self.catalogue.len());
        let rolls = self.sequence.attempt_rolls();

        let Some(candidate) = self.picker.front(index) else {
            stats.empty_picker += 1;
            return;
        };
        let archetype = &self.catalogue[index];
        stats.attempts += 1;

        if !archetype.spawnable {
            stats.rejected_unspawnable += 1;
            return;
        }
        if rolls.frequency > archetype.frequency {
            stats.rejected_frequency += 1;
            return;
        }
        if !archetype.can_be_upside_down && upside_down {
            stats.rejected_upside_down += 1;
            return;
        }
        let skewed_depth_affinity = archetype.depth_affinity(depth);
        if rolls.depth > skewed_depth_affinity {
            stats.rejected_depth += 1;
            return;
        }
        let skewed_flatness_affinity = archetype.flatness_affinity(flatness);
        if rolls.slope > skewed_flatness_affinity {
            stats.rejected_slope += 1;
            return;
        }

        let Some(scores) = cluster_scores(
            &self.placed,
            archetype,
            location,
            ctx.params.cluster_range,
            host,
        ) else {
            stats.rejected_spacing += 1;
            return;
        };
        if rolls.self_negative > scores.self_negative
            || rolls.self_positive > scores.self_positive
            || rolls.others_negative > scores.others_negative
            || rolls.others_positive > scores.others_positive
        {
            stats.rejected_cluster += 1;
            return;
        }

        let rotation = placement_rotation(archetype, normal, rng);
        host.set_transform(candidate, location, rotation);
        host.set_active(candidate, true);
        host.attach(candidate, ctx.parent);
        self.picker.take_front(index);

        let audit = PlacementAudit {
            item_number: (x * y) as u64,
            skewed_depth_affinity,
            skewed_flatness_affinity,
            self_cluster_positive_score: scores.self_positive,
            self_cluster_negative_score: scores.self_negative,
            others_cluster_positive_score: scores.others_positive,
            others_cluster_negative_score: scores.others_negative,
            placement_pass: pass,
            beings_when_placed: self.placed.len(),
            beings_nearby: scores.same_nearby + scores.others_nearby,
            same_beings_nearby: scores.same_nearby,
            other_beings_nearby: scores.others_nearby,
            cluster_radius: ctx.params.cluster_range,
        };
        self.placed.push(PlacedBeing {
            handle: candidate,
            archetype: archetype.id.clone(),
            location,
            rotation,
            minimum_spacing: archetype.minimum_spacing,
            audit,
        });
        stats.placed += 1;
    }

    /// Move every placed being back into its archetype's pool. Beings whose
    /// archetype left the catalogue are destroyed.
    fn despawn_to_picker<H: BeingHost>(&mut self, host: &mut H) {
        for being in std::mem::take(&mut self.placed) {
            if !host.is_alive(being.handle) {
                continue;
            }
            match self.catalogue.iter().position(|a| a.id == being.archetype) {
                Some(index) => self.picker.add(index, being.handle, host),
                None => host.destroy(being.handle),
            }
        }
    }

    /// Throw away everything this run touched and rebuild `committed`.
    fn roll_back<H: BeingHost>(
        &mut self,
        committed: Vec<PlacedBeing>,
        previous_catalogue: &[BeingArchetype],
        parent: ParentHandle,
        host: &mut H,
    ) {
        self.clear_all(host);
        for record in committed {
            let archetype = self
                .catalogue
                .iter()
                .chain(previous_catalogue)
                .find(|a| a.id == record.archetype);
            let Some(archetype) = archetype else {
                warn!("Cannot restore '{}': archetype no longer known", record.archetype);
                continue;
            };
            let Some(handle) = host.spawn(archetype) else {
                warn!("Cannot restore '{}': host refused to spawn", record.archetype);
                continue;
            };
            host.set_transform(handle, record.location, record.rotation);
            host.set_active(handle, true);
            host.attach(handle, parent);
            self.placed.push(PlacedBeing { handle, ..record });
        }
        self.state = PlacerState::Idle;
    }

    /// Re-adopt instances attached to `parent`, for example after the host
    /// reloaded a saved level. Returns how many beings were adopted.
    pub fn reconcile_children<H: BeingHost>(
        &mut self,
        parent: ParentHandle,
        host: &mut H,
    ) -> usize {
        self.placed.retain(|b| host.is_alive(b.handle));

        let mut adopted = 0;
        for child in host.children_of(parent) {
            if self.placed.iter().any(|b| b.handle == child) {
                continue;
            }
            let Some(archetype) = host.archetype_of(child) else {
                continue;
            };
            if self.picker.take(child) {
                host.set_active(child, true);
            }
            let (location, rotation) = host
                .transform_of(child)
                .unwrap_or((Vec3::ZERO, Quat::IDENTITY));
            let minimum_spacing = self
                .catalogue
                .iter()
                .find(|a| a.id == archetype)
                .map_or(0.0, |a| a.minimum_spacing);
            self.placed.push(PlacedBeing {
                handle: child,
                archetype,
                location,
                rotation,
                minimum_spacing,
                audit: PlacementAudit::default(),
            });
            adopted += 1;
        }
        if adopted > 0 {
            info!("Re-adopted {adopted} fixed beings attached to the parent");
        }
        adopted
    }

    /// Destroy every pending and placed instance.
    pub fn clear_all<H: BeingHost>(&mut self, host: &mut H) {
        self.picker.clear(host);
        for being in self.placed.drain(..) {
            if host.is_alive(being.handle) {
                host.destroy(being.handle);
            }
        }
        self.state = PlacerState::Idle;
    }

    /// Forget every instance without destroying it, for host teardown.
    pub fn release_all(&mut self) {
        self.placed.clear();
        self.picker.release();
        self.state = PlacerState::Idle;
    }
}

/// Scores for placing `archetype` at `location`, or `None` when a live
/// placed being sits closer than either one's minimum spacing.
fn cluster_scores<H: BeingHost>(
    placed: &[PlacedBeing],
    archetype: &BeingArchetype,
    location: Vec3,
    cluster_range: f32,
    host: &H,
) -> Option<ClusterScores> {
    let mut scores = ClusterScores {
        self_positive: 1.0 - archetype.self_cluster_affinity,
        self_negative: 1.0,
        others_positive: 1.0 - archetype.others_cluster_affinity,
        others_negative: 1.0,
        same_nearby: 0,
        others_nearby: 0,
    };

    for other in placed {
        if !host.is_alive(other.handle) {
            continue;
        }
        let distance = location.distance(other.location);
        if distance < archetype.minimum_spacing.max(other.minimum_spacing) {
            return None;
        }
        if distance >= cluster_range {
            continue;
        }

        let weight = (1.0 - (distance - archetype.minimum_spacing) / cluster_range).clamp(0.0, 1.0);
        if other.archetype == archetype.id {
            scores.same_nearby += 1;
            scores.self_negative -= weight * archetype.self_cluster_aversion;
            scores.self_positive += weight * archetype.self_cluster_affinity;
        } else {
            scores.others_nearby += 1;
            scores.others_negative -= weight * archetype.others_cluster_aversion;
            scores.others_positive += weight * archetype.others_cluster_affinity;
        }
    }
    Some(scores)
}

/// Random spin about world up, or about the surface normal after aligning
/// world up with it.
fn placement_rotation(archetype: &BeingArchetype, normal: Vec3, rng: &mut ChaCha8Rng) -> Quat {
    let spin: f32 = rng.random_range(0.0..TAU);
    if archetype.always_point_up {
        return Quat::from_rotation_z(spin);
    }
    let up = match normal.try_normalize() {
        Some(n) => n,
        None => Vec3::Z,
    };
    Quat::from_axis_angle(up, spin) * Quat::from_rotation_arc(Vec3::Z, up)
}
