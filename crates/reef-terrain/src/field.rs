//! The generated height field and its point queries.

use glam::{Vec2, Vec3};

/// Height ranges at or below this are treated as flat.
const SMALL_NUMBER: f32 = 1e-8;

/// Axis-aligned 2D bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2 {
    pub min: Vec2,
    pub max: Vec2,
}

/// Axis-aligned 3D bounds, accumulated one point at a time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds3 {
    /// Inverted bounds that any included point replaces.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn to_2d(&self) -> Bounds2 {
        Bounds2 {
            min: self.min.truncate(),
            max: self.max.truncate(),
        }
    }
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Row-major grid of displaced vertices with the mesh built over them.
///
/// Invariants: `vertices`, `normals`, `tangents` and `uvs` all hold
/// `num_x * num_y` entries, and `triangles` holds
/// `6 * (num_x - 1) * (num_y - 1)` indices.
#[derive(Clone, Debug)]
pub struct HeightField {
    num_x: usize,
    num_y: usize,
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
    uvs: Vec<Vec2>,
    triangles: Vec<u32>,
    bounds: Bounds3,
}

/// Corner indices and fractions of the cell containing a grid coordinate.
struct Cell {
    i00: usize,
    i01: usize,
    i10: usize,
    i11: usize,
    fx: f32,
    fy: f32,
}

impl HeightField {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        num_x: usize,
        num_y: usize,
        vertices: Vec<Vec3>,
        normals: Vec<Vec3>,
        tangents: Vec<Vec3>,
        uvs: Vec<Vec2>,
        triangles: Vec<u32>,
        bounds: Bounds3,
    ) -> Self {
        debug_assert_eq!(vertices.len(), num_x * num_y);
        debug_assert_eq!(normals.len(), vertices.len());
        debug_assert_eq!(uvs.len(), vertices.len());
        Self {
            num_x,
            num_y,
            vertices,
            normals,
            tangents,
            uvs,
            triangles,
            bounds,
        }
    }

    pub fn num_x(&self) -> usize {
        self.num_x
    }

    pub fn num_y(&self) -> usize {
        self.num_y
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    pub fn bounds(&self) -> Bounds3 {
        self.bounds
    }

    pub fn bounding_box_2d(&self) -> Bounds2 {
        self.bounds.to_2d()
    }

    pub fn bounding_box_3d(&self) -> Bounds3 {
        self.bounds
    }

    fn cell(&self, x: f32, y: f32) -> Option<Cell> {
        if self.vertices.is_empty() {
            return None;
        }
        let max_x = (self.num_x - 1) as f32;
        let max_y = (self.num_y - 1) as f32;
        // Written so that NaN falls outside.
        if !(x >= 0.0 && y >= 0.0 && x <= max_x && y <= max_y) {
            return None;
        }

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = if x < max_x { x.ceil() as usize } else { self.num_x - 1 };
        let y1 = if y < max_y { y.ceil() as usize } else { self.num_y - 1 };

        Some(Cell {
            i00: x0 + y0 * self.num_x,
            i01: x0 + y1 * self.num_x,
            i10: x1 + y0 * self.num_x,
            i11: x1 + y1 * self.num_x,
            fx: x - x0 as f32,
            fy: y - y0 as f32,
        })
    }

    fn bilinear_vec3(data: &[Vec3], c: &Cell) -> Vec3 {
        let a = data[c.i00].lerp(data[c.i01], c.fy);
        let b = data[c.i10].lerp(data[c.i11], c.fy);
        a.lerp(b, c.fx)
    }

    /// Bilinearly interpolated vertex at grid coordinate `(x, y)`.
    ///
    /// Returns `Vec3::ZERO` outside `[0, num_x - 1] x [0, num_y - 1]`.
    pub fn vertex_position(&self, x: f32, y: f32) -> Vec3 {
        match self.cell(x, y) {
            Some(c) => Self::bilinear_vec3(&self.vertices, &c),
            None => Vec3::ZERO,
        }
    }

    /// Interpolated, renormalized surface normal. `Vec3::ZERO` out of bounds.
    pub fn normal(&self, x: f32, y: f32) -> Vec3 {
        match self.cell(x, y) {
            Some(c) => Self::bilinear_vec3(&self.normals, &c).normalize_or_zero(),
            None => Vec3::ZERO,
        }
    }

    /// How deep the interpolated surface sits: 1.0 at the lowest vertex,
    /// 0.0 at the highest. Returns 0.0 out of bounds or on a flat field.
    pub fn depth_percentage(&self, x: f32, y: f32) -> f32 {
        let Some(c) = self.cell(x, y) else {
            return 0.0;
        };
        let range = self.bounds.max.z - self.bounds.min.z;
        if range <= SMALL_NUMBER {
            return 0.0;
        }

        let z = |i: usize| self.vertices[i].z;
        let a = z(c.i00) + (z(c.i01) - z(c.i00)) * c.fy;
        let b = z(c.i10) + (z(c.i11) - z(c.i10)) * c.fy;
        let height = a + (b - a) * c.fx;

        (1.0 - (height - self.bounds.min.z) / range).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x2 grid, heights 0..5 along the row-major order.
    fn ramp_field() -> HeightField {
        let (num_x, num_y) = (3, 2);
        let mut vertices = Vec::new();
        let mut bounds = Bounds3::EMPTY;
        for y in 0..num_y {
            for x in 0..num_x {
                let v = Vec3::new(x as f32 * 10.0, y as f32 * 10.0, (x + y * num_x) as f32);
                bounds.include(v);
                vertices.push(v);
            }
        }
        let normals = vec![Vec3::Z; vertices.len()];
        let tangents = vec![Vec3::X; vertices.len()];
        let uvs = (0..num_y)
            .flat_map(|y| (0..num_x).map(move |x| Vec2::new(x as f32, y as f32)))
            .collect();
        let triangles = crate::mesh::grid_triangles(num_x, num_y);
        HeightField::from_parts(num_x, num_y, vertices, normals, tangents, uvs, triangles, bounds)
    }

    #[test]
    fn test_vertex_position_on_grid_points() {
        let field = ramp_field();
        assert_eq!(field.vertex_position(0.0, 0.0), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(field.vertex_position(2.0, 1.0), Vec3::new(20.0, 10.0, 5.0));
    }

    #[test]
    fn test_vertex_position_interpolates() {
        let field = ramp_field();
        let v = field.vertex_position(0.5, 0.5);
        assert!((v - Vec3::new(5.0, 5.0, 2.0)).length() < 1e-5, "got {v}");
    }

    #[test]
    fn test_out_of_bounds_returns_zero() {
        let field = ramp_field();
        assert_eq!(field.vertex_position(-0.1, 0.0), Vec3::ZERO);
        assert_eq!(field.vertex_position(0.0, 1.01), Vec3::ZERO);
        assert_eq!(field.normal(3.0, 0.0), Vec3::ZERO);
        assert_eq!(field.depth_percentage(f32::NAN, 0.0), 0.0);
    }

    #[test]
    fn test_depth_percentage_range() {
        let field = ramp_field();
        assert_eq!(field.depth_percentage(0.0, 0.0), 1.0, "Lowest vertex is deepest");
        assert_eq!(field.depth_percentage(2.0, 1.0), 0.0, "Highest vertex is shallowest");
        let mid = field.depth_percentage(1.0, 0.5);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn test_depth_percentage_flat_field_is_zero() {
        let mut field = ramp_field();
        for v in &mut field.vertices {
            v.z = 3.0;
        }
        field.bounds.min.z = 3.0;
        field.bounds.max.z = 3.0;
        assert_eq!(field.depth_percentage(1.0, 1.0), 0.0);
    }

    #[test]
    fn test_normal_is_unit_length() {
        let field = ramp_field();
        assert!((field.normal(1.3, 0.7).length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_accumulate() {
        let mut bounds = Bounds3::EMPTY;
        assert!(bounds.is_empty());
        bounds.include(Vec3::new(1.0, -2.0, 3.0));
        bounds.include(Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
        assert!(bounds.contains(Vec3::ZERO));
        assert_eq!(bounds.to_2d().max, Vec2::new(1.0, 2.0));
    }
}
