//! Terrain generation parameters.

use crate::TerrainError;

/// Parameters controlling one height-field generation.
///
/// Extents are in world units and `density` is vertices per world unit, so
/// the grid is `ceil(width * density) x ceil(height * density)` vertices.
/// Equality compares every float bit-for-bit: a generation is skipped only
/// when nothing at all changed.
#[derive(Clone, Copy, Debug)]
pub struct TerrainParameters {
    pub width: i32,
    pub height: i32,
    pub density: f32,

    /// Amplitude of the sand bank noise on the basin floor.
    pub sand_bank_height: f32,
    /// Frequency of the sand bank noise.
    pub sand_roughness: f32,
    /// Offset added to every noise lookup coordinate.
    pub perlin_offset: f32,

    pub cliff_scale: f32,
    /// Scales both the cliff height and its horizontal encroachment.
    pub cliff_intensity: f32,
    /// Frequency of the jagged cliff edge noise.
    pub cliff_roughness: f32,
    pub cliff_roughness_intensity: f32,

    pub cliff_modifier_seed: f32,
    pub cliff_modifier_density: f32,
    pub cliff_modifier_intensity: f32,
}

impl Default for TerrainParameters {
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
        }
    }
}

impl TerrainParameters {
    /// Parameters that produce a perfectly flat lattice: no noise, no cliff.
    pub fn flat(width: i32, height: i32, density: f32) -> Self {
        Self {
            width,
            height,
            density,
            sand_bank_height: 0.0,
            sand_roughness: 0.0,
            perlin_offset: 0.0,
            cliff_scale: 0.0,
            cliff_intensity: 0.0,
            cliff_roughness: 0.0,
            cliff_roughness_intensity: 0.0,
            cliff_modifier_seed: 0.0,
            cliff_modifier_density: 0.0,
            cliff_modifier_intensity: 0.0,
        }
    }

    /// Number of vertices along X and Y.
    pub fn grid_size(&self) -> (usize, usize) {
        let num_x = (self.width as f32 * self.density).ceil().max(0.0) as usize;
        let num_y = (self.height as f32 * self.density).ceil().max(0.0) as usize;
        (num_x, num_y)
    }

    /// Reject parameters that cannot produce at least one quad.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(TerrainError::InvalidParameters(format!(
                "density must be positive, got {}",
                self.density
            )));
        }
        let (num_x, num_y) = self.grid_size();
        if num_x < 2 || num_y < 2 {
            return Err(TerrainError::InvalidParameters(format!(
                "grid must be at least 2x2 vertices, got {num_x}x{num_y}"
            )));
        }
        if num_x.checked_mul(num_y).is_none_or(|count| count > u32::MAX as usize) {
            return Err(TerrainError::InvalidParameters(format!(
                "grid of {num_x}x{num_y} vertices exceeds the u32 index range"
            )));
        }
        Ok(())
    }

    fn float_bits(&self) -> [u32; 11] {
        [
            self.density.to_bits(),
            self.sand_bank_height.to_bits(),
            self.sand_roughness.to_bits(),
            self.perlin_offset.to_bits(),
            self.cliff_scale.to_bits(),
            self.cliff_intensity.to_bits(),
            self.cliff_roughness.to_bits(),
            self.cliff_roughness_intensity.to_bits(),
            self.cliff_modifier_seed.to_bits(),
            self.cliff_modifier_density.to_bits(),
            self.cliff_modifier_intensity.to_bits(),
        ]
    }
}

impl PartialEq for TerrainParameters {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.float_bits() == other.float_bits()
    }
}

impl Eq for TerrainParameters {}
