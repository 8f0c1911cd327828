//! Procedural geometry for the static parts of the scene.

use bytemuck::{Pod, Zeroable};
use lavaworld_kernel::config::MAX_SEGMENTS;

/// Lava terrain vertex. Height comes from the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PlaneVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Subdivision count clamped to `[min, MAX_SEGMENTS]`.
fn clamp_segments(segments: u32, min: u32) -> u32 {
    segments.clamp(min, MAX_SEGMENTS)
}

/// `a * b` as a buffer length, or zero if it does not fit.
fn grid_len(a: u32, b: u32) -> usize {
    (a as usize).checked_mul(b as usize).unwrap_or(0)
}

/// Flat square on the XZ plane centred at the origin.
///
/// `segments` quads per edge, so `(segments + 1)^2` vertices. `u` grows with
/// x and `v` shrinks with z. Segment counts above [`MAX_SEGMENTS`] are clamped.
pub fn plane(size: f32, segments: u32) -> (Vec<PlaneVertex>, Vec<u32>) {
    let segments = clamp_segments(segments, 1);
    let row = segments + 1;
    let half = size / 2.0;
    let step = size / segments as f32;

    let mut vertices = Vec::with_capacity(grid_len(row, row));
    for iz in 0..row {
        for ix in 0..row {
            vertices.push(PlaneVertex {
                position: [-half + ix as f32 * step, 0.0, -half + iz as f32 * step],
                uv: [
                    ix as f32 / segments as f32,
                    1.0 - iz as f32 / segments as f32,
                ],
            });
        }
    }

    let mut indices = Vec::with_capacity(grid_len(segments, segments).saturating_mul(6));
    for iz in 0..segments {
        for ix in 0..segments {
            let a = iz * row + ix;
            let b = a + row;
            // Counter-clockwise seen from +Y.
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    (vertices, indices)
}

/// UV sphere positions. Triangles wind counter-clockwise seen from outside.
pub fn sphere(radius: f32, segments: u32) -> (Vec<[f32; 3]>, Vec<u32>) {
    let lon = clamp_segments(segments, 3);
    let lat = clamp_segments(segments, 2);
    let mut vertices = Vec::with_capacity(grid_len(lon + 1, lat + 1));
    for iy in 0..=lat {
        let phi = std::f32::consts::PI * iy as f32 / lat as f32;
        for ix in 0..=lon {
            let theta = std::f32::consts::TAU * ix as f32 / lon as f32;
            vertices.push([
                -radius * theta.cos() * phi.sin(),
                radius * phi.cos(),
                radius * theta.sin() * phi.sin(),
            ]);
        }
    }

    let row = lon + 1;
    let mut indices = Vec::new();
    for iy in 0..lat {
        for ix in 0..lon {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != lat - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    (vertices, indices)
}

/// Corners of a unit billboard quad, expanded in the rain shader.
pub const BILLBOARD_CORNERS: [[f32; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];
pub const BILLBOARD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn plane_counts_and_extent() {
        let (v, i) = plane(75.0, 300);
        assert_eq!(v.len(), 301 * 301);
        assert_eq!(i.len(), 300 * 300 * 6);
        assert_eq!(v[0].position, [-37.5, 0.0, -37.5]);
        assert_eq!(v[v.len() - 1].position, [37.5, 0.0, 37.5]);
        assert_eq!(v[0].uv, [0.0, 1.0]);
        assert!(i.iter().all(|&idx| (idx as usize) < v.len()));
    }

    #[test]
    fn plane_faces_up() {
        let (v, i) = plane(2.0, 1);
        let p = |k: usize| Vec3::from(v[i[k] as usize].position);
        let normal = (p(1) - p(0)).cross(p(2) - p(0));
        assert!(normal.y > 0.0);
    }

    #[test]
    fn sphere_vertices_on_radius() {
        let (v, i) = sphere(100.0, 32);
        assert_eq!(v.len(), 33 * 33);
        for p in &v {
            assert!((Vec3::from(*p).length() - 100.0).abs() < 1e-3);
        }
        assert!(i.iter().all(|&idx| (idx as usize) < v.len()));
        assert_eq!(i.len() % 3, 0);
    }

    #[test]
    fn huge_segment_counts_are_clamped() {
        assert_eq!(clamp_segments(70_000, 1), MAX_SEGMENTS);
        assert_eq!(clamp_segments(u32::MAX, 3), MAX_SEGMENTS);
        assert_eq!(clamp_segments(0, 1), 1);

        let row = MAX_SEGMENTS + 1;
        let last_index = grid_len(row, row) - 1;
        assert!(u32::try_from(last_index).is_ok());
        assert_eq!(grid_len(0, u32::MAX), 0);
    }

    #[test]
    fn sphere_winds_outward() {
        let (v, i) = sphere(1.0, 8);
        let tri = &i[0..3];
        let p: Vec<Vec3> = tri.iter().map(|&k| Vec3::from(v[k as usize])).collect();
        let normal = (p[1] - p[0]).cross(p[2] - p[0]);
        let centroid = (p[0] + p[1] + p[2]) / 3.0;
        assert!(normal.dot(centroid) > 0.0);
    }
}
