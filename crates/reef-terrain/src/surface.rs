//! Noise composition for the reef basin surface.
//!
//! The basin floor is sand-bank Perlin noise. Toward the rim the cliff
//! profile curve takes over the height and pulls vertices inward, with a
//! rough edge and a low-frequency modifier layered on top.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};

use crate::{CliffProfileCurve, TerrainParameters};

/// Seed of the shared Perlin permutation table. Variation between levels
/// comes from `perlin_offset` and `cliff_modifier_seed`, not from this.
const NOISE_SEED: u32 = 0;

/// Constant added to the skewed distance so the cliff edge stays rough even
/// near the centre.
const CLIFF_NOISE_BIAS: f32 = 0.3;

/// Evaluates the displaced surface at world-space sample positions.
pub struct CliffSurface<'a> {
    params: &'a TerrainParameters,
    curve: &'a CliffProfileCurve,
    noise: Perlin,
    centre: Vec2,
    max_distance: f32,
}

impl<'a> CliffSurface<'a> {
    pub fn new(params: &'a TerrainParameters, curve: &'a CliffProfileCurve) -> Self {
        let centre = Vec2::new(params.width as f32, params.height as f32) * 0.5;
        Self {
            params,
            curve,
            noise: Perlin::new(NOISE_SEED),
            centre,
            max_distance: centre.length(),
        }
    }

    /// 2D Perlin noise in roughly `[-1, 1]`.
    fn perlin(&self, p: Vec2) -> f32 {
        let offset = self.params.perlin_offset as f64;
        self.noise.get([p.x as f64 + offset, p.y as f64 + offset]) as f32
    }

    /// Angle around the centre mapped from `[-PI, PI]` to `[0, 1]`.
    pub fn normalized_angle(&self, pos: Vec2) -> f32 {
        let delta = pos - self.centre;
        (libm::atan2f(delta.y, delta.x) + PI) / (2.0 * PI)
    }

    /// Distance to the centre in `[0, 1]`, skewed by the curve's X channel
    /// sampled at the angle around the centre.
    pub fn normalized_skewed_distance(&self, pos: Vec2) -> f32 {
        if self.max_distance <= f32::EPSILON {
            return 0.0;
        }
        let distance = pos.distance(self.centre) / self.max_distance;
        distance * self.curve.x.sample(self.normalized_angle(pos))
    }

    pub fn height(&self, pos: Vec2) -> f32 {
        let p = self.params;
        let distance = self.normalized_skewed_distance(pos);
        let cliff = self.curve.z.sample(distance);

        let sand_noise = self.perlin(pos * p.sand_roughness) * p.sand_bank_height;
        let modifier_pos = (pos + Vec2::splat(p.cliff_modifier_seed)) * p.cliff_modifier_density;
        let modifier = self.perlin(modifier_pos) * p.cliff_modifier_intensity;

        sand_noise * (1.0 - cliff) + cliff * p.cliff_intensity + modifier
    }

    /// Horizontal encroachment toward the centre in XY, height in Z.
    pub fn displacement(&self, pos: Vec2) -> Vec3 {
        let p = self.params;
        let distance = self.normalized_skewed_distance(pos);

        let cliff_noise = self.perlin(pos * p.cliff_roughness)
            * p.cliff_roughness_intensity
            * (distance + CLIFF_NOISE_BIAS);
        let encroachment_amount = self.curve.y.sample(distance) * p.cliff_intensity;
        let direction = (self.centre - pos).normalize_or_zero();

        let encroachment = direction * encroachment_amount + Vec2::splat(cliff_noise);
        encroachment.extend(self.height(pos))
    }

    /// Final vertex for the sample position `pos`.
    pub fn vertex(&self, pos: Vec2) -> Vec3 {
        pos.extend(0.0) + self.displacement(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_parameters_leave_lattice_untouched() {
        let params = TerrainParameters::flat(1000, 1000, 0.01);
        let curve = CliffProfileCurve::flat();
        let surface = CliffSurface::new(&params, &curve);

        for &(x, y) in &[(0.0, 0.0), (250.0, 700.0), (999.0, 1.0), (500.0, 500.0)] {
            let pos = Vec2::new(x, y);
            assert_eq!(surface.vertex(pos), Vec3::new(x, y, 0.0));
        }
    }

    #[test]
    fn test_angle_is_normalized() {
        let params = TerrainParameters::flat(100, 100, 0.1);
        let curve = CliffProfileCurve::flat();
        let surface = CliffSurface::new(&params, &curve);

        // Directly "west" of centre is atan2(0, -x) = PI -> 1.0
        let west = surface.normalized_angle(Vec2::new(0.0, 50.0));
        assert!((west - 1.0).abs() < 1e-6);
        // Directly "east" of centre is 0 -> 0.5
        let east = surface.normalized_angle(Vec2::new(100.0, 50.0));
        assert!((east - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_skewed_distance_scales_with_x_channel() {
        let params = TerrainParameters::flat(100, 100, 0.1);
        let unit = CliffProfileCurve::constant(Vec3::new(1.0, 0.0, 0.0));
        let half = CliffProfileCurve::constant(Vec3::new(0.5, 0.0, 0.0));

        let corner = Vec2::ZERO;
        let d_unit = CliffSurface::new(&params, &unit).normalized_skewed_distance(corner);
        let d_half = CliffSurface::new(&params, &half).normalized_skewed_distance(corner);

        assert!((d_unit - 1.0).abs() < 1e-6, "Corner is the farthest point");
        assert!((d_half - 0.5).abs() < 1e-6);
        let centre =
            CliffSurface::new(&params, &unit).normalized_skewed_distance(Vec2::splat(50.0));
        assert_eq!(centre, 0.0);
    }

    #[test]
    fn test_cliff_height_follows_z_channel() {
        let mut params = TerrainParameters::flat(100, 100, 0.1);
        params.cliff_intensity = 200.0;
        let curve = CliffProfileCurve::constant(Vec3::new(1.0, 0.0, 0.5));
        let surface = CliffSurface::new(&params, &curve);

        let h = surface.height(Vec2::new(10.0, 20.0));
        assert!((h - 100.0).abs() < 1e-4, "0.5 * 200 expected, got {h}");
    }

    #[test]
    fn test_encroachment_points_toward_centre() {
        let mut params = TerrainParameters::flat(100, 100, 0.1);
        params.cliff_intensity = 10.0;
        let curve = CliffProfileCurve::constant(Vec3::new(1.0, 1.0, 0.0));
        let surface = CliffSurface::new(&params, &curve);

        let d = surface.displacement(Vec2::new(0.0, 50.0));
        assert!((d.x - 10.0).abs() < 1e-4);
        assert!(d.y.abs() < 1e-4);

        let at_centre = surface.displacement(Vec2::splat(50.0));
        assert_eq!(at_centre.truncate(), Vec2::ZERO, "No direction at the centre");
    }

    #[test]
    fn test_noise_is_deterministic() {
        let params = TerrainParameters::default();
        let curve = CliffProfileCurve::constant(Vec3::new(1.0, 0.1, 0.3));
        let a = CliffSurface::new(&params, &curve).vertex(Vec2::new(1234.0, 5678.0));
        let b = CliffSurface::new(&params, &curve).vertex(Vec2::new(1234.0, 5678.0));
        assert_eq!(a, b);
    }
}
