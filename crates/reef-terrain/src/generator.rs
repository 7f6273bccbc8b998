//! The terrain generator: owns the inputs, the cached field and the
//! caching/dirty rules around rebuilding it.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use tracing::{debug, error, info};

use crate::field::{Bounds2, Bounds3, HeightField};
use crate::mesh::{compute_normals_and_tangents, push_row_triangles};
use crate::{CliffProfileCurve, CliffSurface, Progress, TerrainError, TerrainParameters};

/// Frames entered before the first vertex row.
const SETUP_FRAMES: f64 = 4.0;
/// Frames entered once the new field is swapped in.
const FINALIZE_FRAMES: f64 = 1.0;

/// Name of the surface material the host renders the mesh with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub String);

impl MaterialHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Builds and caches the reef height field.
///
/// A new field is built only when the parameters differ bit-wise from the
/// last build or something marked the generator dirty. A build writes into
/// fresh buffers, so a cancelled or failed build leaves the previous field
/// in place.
#[derive(Debug, Default)]
pub struct TerrainGenerator {
    params: Option<TerrainParameters>,
    cliff_curve: Option<Arc<CliffProfileCurve>>,
    material: Option<MaterialHandle>,
    dirty: bool,
    field: Option<Arc<HeightField>>,
    generation_count: u64,
}

impl TerrainGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator with both inputs already set.
    pub fn with_inputs(material: MaterialHandle, curve: CliffProfileCurve) -> Self {
        let mut generator = Self::new();
        generator.set_material(material);
        generator.set_cliff_curve(curve);
        generator
    }

    /// Total progress frames one build of `params` enters.
    pub fn work_total(params: &TerrainParameters) -> f64 {
        let (num_x, num_y) = params.grid_size();
        let cells = (num_x * num_y) as f64;
        let quads = (num_x.saturating_sub(1) * num_y.saturating_sub(1)) as f64;
        SETUP_FRAMES + cells + quads + cells + FINALIZE_FRAMES
    }

    pub fn set_material(&mut self, material: MaterialHandle) {
        if self.material.as_ref() != Some(&material) {
            self.material = Some(material);
            self.dirty = true;
        }
    }

    pub fn material(&self) -> Option<&MaterialHandle> {
        self.material.as_ref()
    }

    pub fn set_cliff_curve(&mut self, curve: CliffProfileCurve) {
        self.cliff_curve = Some(Arc::new(curve));
        self.dirty = true;
    }

    pub fn cliff_curve(&self) -> Option<&CliffProfileCurve> {
        self.cliff_curve.as_deref()
    }

    /// The curve asset was edited in place by its owner.
    pub fn notify_curve_modified(&mut self) {
        self.dirty = true;
    }

    /// Force the next [`generate`](Self::generate) to rebuild.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drop the cached field. The next generate always rebuilds.
    pub fn release(&mut self) {
        if self.field.take().is_some() {
            debug!("Terrain field released");
        }
        self.params = None;
    }

    pub fn generation_count(&self) -> u64 {
        self.generation_count
    }

    pub fn params(&self) -> Option<&TerrainParameters> {
        self.params.as_ref()
    }

    /// Last completed field, if any.
    pub fn field(&self) -> Option<&Arc<HeightField>> {
        self.field.as_ref()
    }

    /// True when a non-empty field exists, both inputs are set and nothing
    /// invalidated the field since it was built.
    pub fn is_ready(&self) -> bool {
        let has_mesh = self
            .field
            .as_ref()
            .is_some_and(|f| !f.vertices().is_empty() && !f.triangles().is_empty());
        has_mesh && self.material.is_some() && self.cliff_curve.is_some() && !self.dirty
    }

    /// Build the field for `params`, or return the cached one when nothing
    /// changed since the last build.
    pub fn generate(
        &mut self,
        params: &TerrainParameters,
        progress: &mut Progress<'_>,
    ) -> Result<Arc<HeightField>, TerrainError> {
        if self.material.is_none() {
            error!("Terrain generation aborted: no surface material set");
            return Err(TerrainError::MissingMaterial);
        }
        let Some(curve) = self.cliff_curve.clone() else {
            error!("Terrain generation aborted: no cliff profile curve set");
            return Err(TerrainError::MissingCliffCurve);
        };
        if let Err(e) = params.validate() {
            error!("Terrain generation aborted: {e}");
            return Err(e);
        }

        if !self.dirty && self.params.as_ref() == Some(params) {
            if let Some(field) = &self.field {
                debug!("Terrain parameters unchanged, reusing cached field");
                progress.enter_frame(Self::work_total(params), "Terrain unchanged");
                return Ok(Arc::clone(field));
            }
        }

        let field = Arc::new(build_field(params, &curve, progress)?);
        info!(
            "Terrain generated: {}x{} vertices, {} tris, z range {:.1}..{:.1}",
            field.num_x(),
            field.num_y(),
            field.triangles().len() / 3,
            field.bounds().min.z,
            field.bounds().max.z
        );

        self.field = Some(Arc::clone(&field));
        self.params = Some(*params);
        self.dirty = false;
        self.generation_count += 1;
        progress.enter_frame(FINALIZE_FRAMES, "Terrain ready");
        Ok(field)
    }

    pub fn vertex_position(&self, x: f32, y: f32) -> Vec3 {
        self.field
            .as_ref()
            .map_or(Vec3::ZERO, |f| f.vertex_position(x, y))
    }

    pub fn normal(&self, x: f32, y: f32) -> Vec3 {
        self.field.as_ref().map_or(Vec3::ZERO, |f| f.normal(x, y))
    }

    pub fn depth_percentage(&self, x: f32, y: f32) -> f32 {
        self.field
            .as_ref()
            .map_or(0.0, |f| f.depth_percentage(x, y))
    }

    pub fn bounding_box_2d(&self) -> Bounds2 {
        self.field.as_ref().map_or(
            Bounds2 {
                min: Vec2::ZERO,
                max: Vec2::ZERO,
            },
            |f| f.bounding_box_2d(),
        )
    }

    pub fn bounding_box_3d(&self) -> Bounds3 {
        self.field.as_ref().map_or(
            Bounds3 {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            },
            |f| f.bounding_box_3d(),
        )
    }

    /// Vertex counts along X and Y of the current field, `(0, 0)` before
    /// the first build.
    pub fn grid_size(&self) -> (usize, usize) {
        self.field
            .as_ref()
            .map_or((0, 0), |f| (f.num_x(), f.num_y()))
    }
}

fn build_field(
    params: &TerrainParameters,
    curve: &CliffProfileCurve,
    progress: &mut Progress<'_>,
) -> Result<HeightField, TerrainError> {
    let (num_x, num_y) = params.grid_size();
    let surface = CliffSurface::new(params, curve);
    let spacing = 1.0 / params.density;

    let cells = num_x * num_y;
    let mut vertices = Vec::with_capacity(cells);
    let mut uvs = Vec::with_capacity(cells);
    let mut triangles = Vec::with_capacity(6 * (num_x - 1) * (num_y - 1));
    let mut bounds = Bounds3::EMPTY;
    progress.enter_frame(SETUP_FRAMES, "Preparing terrain");

    for y in 0..num_y {
        if progress.should_cancel() {
            return Err(cancelled());
        }
        for x in 0..num_x {
            let pos = Vec2::new(x as f32 * spacing, y as f32 * spacing);
            let vertex = surface.vertex(pos);
            bounds.include(vertex);
            vertices.push(vertex);
            uvs.push(Vec2::new(x as f32, y as f32));
        }
        progress.enter_frame(num_x as f64, "Generating vertices");
    }

    for y in 0..num_y - 1 {
        if progress.should_cancel() {
            return Err(cancelled());
        }
        push_row_triangles(num_x, y, &mut triangles);
        progress.enter_frame((num_x - 1) as f64, "Generating triangles");
    }

    if progress.should_cancel() {
        return Err(cancelled());
    }
    let (normals, tangents) = compute_normals_and_tangents(&vertices, &triangles, &uvs);
    progress.enter_frame(cells as f64, "Computing normals");

    Ok(HeightField::from_parts(
        num_x, num_y, vertices, normals, tangents, uvs, triangles, bounds,
    ))
}

fn cancelled() -> TerrainError {
    info!("Terrain generation cancelled, keeping previous field");
    TerrainError::Cancelled
}
