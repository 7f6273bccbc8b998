//! Triangle topology and smooth shading for the height-field grid.

use glam::{Vec2, Vec3};

/// Append the six indices for every quad in row `y` of an `num_x`-wide grid.
///
/// Each quad `(x, y)` is split into `(x,y) (x,y+1) (x+1,y)` and
/// `(x+1,y) (x,y+1) (x+1,y+1)`, which faces +Z on an undisplaced lattice.
pub fn push_row_triangles(num_x: usize, y: usize, out: &mut Vec<u32>) {
    let index = |x: usize, y: usize| (x + y * num_x) as u32;
    for x in 0..num_x.saturating_sub(1) {
        let a = index(x, y);
        let b = index(x, y + 1);
        let c = index(x + 1, y);
        let d = index(x + 1, y + 1);
        out.extend_from_slice(&[a, b, c, c, b, d]);
    }
}

/// Index list for the whole `num_x` by `num_y` grid.
#[cfg(test)]
pub(crate) fn grid_triangles(num_x: usize, num_y: usize) -> Vec<u32> {
    let quads = num_x.saturating_sub(1) * num_y.saturating_sub(1);
    let mut out = Vec::with_capacity(quads * 6);
    for y in 0..num_y.saturating_sub(1) {
        push_row_triangles(num_x, y, &mut out);
    }
    out
}

/// Area-weighted smooth vertex normals and UV-derived tangents.
///
/// Face normals are accumulated unnormalized, so larger faces weigh more.
/// Vertices touched by no usable face get `+Z` and `+X`.
pub fn compute_normals_and_tangents(
    vertices: &[Vec3],
    triangles: &[u32],
    uvs: &[Vec2],
) -> (Vec<Vec3>, Vec<Vec3>) {
    let mut normals = vec![Vec3::ZERO; vertices.len()];
    let mut tangents = vec![Vec3::ZERO; vertices.len()];

    for tri in triangles.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (p0, p1, p2) = (vertices[i0], vertices[i1], vertices[i2]);
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let face_normal = e2.cross(e1);

        let mut face_tangent = Vec3::ZERO;
        if let (Some(&uv0), Some(&uv1), Some(&uv2)) = (uvs.get(i0), uvs.get(i1), uvs.get(i2)) {
            let d1 = uv1 - uv0;
            let d2 = uv2 - uv0;
            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() > f32::EPSILON {
                face_tangent = (e1 * d2.y - e2 * d1.y) / det;
            }
        }

        for i in [i0, i1, i2] {
            normals[i] += face_normal;
            tangents[i] += face_tangent;
        }
    }

    for (n, t) in normals.iter_mut().zip(tangents.iter_mut()) {
        *n = n.normalize_or_zero();
        if *n == Vec3::ZERO {
            *n = Vec3::Z;
        }
        // Gram-Schmidt
        let ortho = (*t - *n * n.dot(*t)).normalize_or_zero();
        *t = if ortho == Vec3::ZERO {
            n.any_orthonormal_vector()
        } else {
            ortho
        };
    }

    (normals, tangents)
}
