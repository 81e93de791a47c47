use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::scene::bounds::Aabb;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("position array length {0} is not a multiple of 3")]
    PositionLength(usize),
    #[error("normal array has {normals} floats, expected {expected}")]
    NormalLength { normals: usize, expected: usize },
    #[error("uv array has {uvs} floats, expected {expected}")]
    UvLength { uvs: usize, expected: usize },
    #[error("index count {0} is not a multiple of 3")]
    IndexLength(usize),
    #[error("index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u16, vertices: usize },
}

/// CPU copy of an indexed triangle mesh as handed over by the asset loader.
///
/// Normals and UVs are optional; when present they hold one entry per vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    positions: Vec<f32>,
    normals: Vec<f32>,
    uvs: Vec<f32>,
    indices: Vec<u16>,
}

/// Per-vertex tangent frame derived from positions, normals and UVs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TangentFrames {
    pub tangents: Vec<f32>,
    pub bitangents: Vec<f32>,
}

impl MeshData {
    pub fn new(
        positions: Vec<f32>,
        normals: Vec<f32>,
        uvs: Vec<f32>,
        indices: Vec<u16>,
    ) -> Result<Self, MeshError> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::PositionLength(positions.len()));
        }
        let vertices = positions.len() / 3;

        if !normals.is_empty() && normals.len() != positions.len() {
            return Err(MeshError::NormalLength {
                normals: normals.len(),
                expected: positions.len(),
            });
        }
        if !uvs.is_empty() && uvs.len() != vertices * 2 {
            return Err(MeshError::UvLength {
                uvs: uvs.len(),
                expected: vertices * 2,
            });
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexLength(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices) {
            return Err(MeshError::IndexOutOfRange { index, vertices });
        }

        Ok(Self {
            positions,
            normals,
            uvs,
            indices,
        })
    }

    /// Unit quad in the XZ plane facing -Y, spanning [-1, 1].
    pub fn plane() -> Self {
        Self {
            positions: vec![
                -1.0, 0.0, -1.0, //
                1.0, 0.0, -1.0, //
                1.0, 0.0, 1.0, //
                -1.0, 0.0, 1.0,
            ],
            normals: vec![
                0.0, -1.0, 0.0, //
                0.0, -1.0, 0.0, //
                0.0, -1.0, 0.0, //
                0.0, -1.0, 0.0,
            ],
            uvs: vec![
                1.0, 1.0, //
                1.0, 0.0, //
                0.0, 0.0, //
                0.0, 1.0,
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Axis-aligned cube of half-size 1 with outward, counter-clockwise faces.
    pub fn cube() -> Self {
        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Self::default();
        for (face, (normal, u, v)) in faces.iter().enumerate() {
            let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
            for (cu, cv) in corners {
                let p = *normal + *u * cu + *v * cv;
                mesh.positions.extend_from_slice(&p.to_array());
                mesh.normals.extend_from_slice(&normal.to_array());
                mesh.uvs.extend_from_slice(&[(cu + 1.0) * 0.5, 1.0 - (cv + 1.0) * 0.5]);
            }
            let base = (face * 4) as u16;
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[vertex * 3..vertex * 3 + 3])
    }

    pub fn normal(&self, vertex: usize) -> Option<Vec3> {
        self.normals
            .get(vertex * 3..vertex * 3 + 3)
            .map(Vec3::from_slice)
    }

    pub fn uv(&self, vertex: usize) -> Option<Vec2> {
        self.uvs.get(vertex * 2..vertex * 2 + 2).map(Vec2::from_slice)
    }

    /// Vertex indices of each triangle, in index-buffer order.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0] as usize, tri[1] as usize, tri[2] as usize])
    }

    /// Local-space bounds of all vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points((0..self.vertex_count()).map(|i| self.position(i)))
    }

    /// Replace the normals with angle-weighted (smooth) or flat-accumulated
    /// vertex normals.
    pub fn compute_normals(&mut self, smooth: bool) {
        let mut accumulated = vec![Vec3::ZERO; self.vertex_count()];

        for [i0, i1, i2] in self.triangles() {
            let (v0, v1, v2) = (self.position(i0), self.position(i1), self.position(i2));
            let face = (v1 - v0).cross(v2 - v0);
            let weights = if smooth {
                [
                    (v1 - v0).angle_between(v2 - v0),
                    (v2 - v1).angle_between(v0 - v1),
                    (v0 - v2).angle_between(v1 - v2),
                ]
            } else {
                [1.0; 3]
            };
            accumulated[i0] += face * weights[0];
            accumulated[i1] += face * weights[1];
            accumulated[i2] += face * weights[2];
        }

        self.normals = accumulated
            .into_iter()
            .flat_map(|n| n.normalize_or_zero().to_array())
            .collect();
    }

    /// Gram-Schmidt orthogonalized tangents/bitangents, accumulated per
    /// vertex. `None` unless the mesh has both normals and UVs.
    pub fn compute_tangent_frames(&self) -> Option<TangentFrames> {
        if !self.has_normals() || !self.has_uvs() {
            return None;
        }

        let mut tangents = vec![Vec3::ZERO; self.vertex_count()];
        let mut bitangents = vec![Vec3::ZERO; self.vertex_count()];

        for tri in self.triangles() {
            let [i0, i1, i2] = tri;
            let (v0, v1, v2) = (self.position(i0), self.position(i1), self.position(i2));
            let (uv0, uv1, uv2) = (self.uv(i0)?, self.uv(i1)?, self.uv(i2)?);

            let delta_pos1 = v1 - v0;
            let delta_pos2 = v2 - v0;
            let delta_uv1 = uv1 - uv0;
            let delta_uv2 = uv2 - uv0;

            let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
            let r = if det.abs() < 1e-4 { 1.0 } else { 1.0 / det };

            let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
            let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * r;

            for vertex in tri {
                let n = self.normal(vertex)?;
                tangents[vertex] += (tangent - n * n.dot(tangent)).normalize_or_zero();
                bitangents[vertex] += (bitangent - n * n.dot(bitangent)).normalize_or_zero();
            }
        }

        Some(TangentFrames {
            tangents: tangents.into_iter().flat_map(|t| t.to_array()).collect(),
            bitangents: bitangents.into_iter().flat_map(|t| t.to_array()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_index() {
        let err = MeshData::new(vec![0.0; 9], vec![], vec![], vec![0, 1, 3]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                index: 3,
                vertices: 3
            }
        );
    }

    #[test]
    fn rejects_mismatched_attribute_lengths() {
        assert_eq!(
            MeshData::new(vec![0.0; 8], vec![], vec![], vec![]).unwrap_err(),
            MeshError::PositionLength(8)
        );
        assert!(matches!(
            MeshData::new(vec![0.0; 9], vec![0.0; 6], vec![], vec![0, 1, 2]),
            Err(MeshError::NormalLength { .. })
        ));
        assert!(matches!(
            MeshData::new(vec![0.0; 9], vec![], vec![0.0; 4], vec![0, 1, 2]),
            Err(MeshError::UvLength { .. })
        ));
        assert_eq!(
            MeshData::new(vec![0.0; 9], vec![], vec![], vec![0, 1]).unwrap_err(),
            MeshError::IndexLength(2)
        );
    }

    #[test]
    fn cube_counts_look_right() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        let bounds = cube.bounds().expect("cube has vertices");
        assert!(bounds.min.abs_diff_eq(Vec3::splat(-1.0), 1e-6));
        assert!(bounds.max.abs_diff_eq(Vec3::splat(1.0), 1e-6));
    }

    #[test]
    fn cube_faces_wind_outward() {
        let cube = MeshData::cube();
        for [i0, i1, i2] in cube.triangles() {
            let (v0, v1, v2) = (cube.position(i0), cube.position(i1), cube.position(i2));
            let face = (v1 - v0).cross(v2 - v0).normalize();
            let stored = cube.normal(i0).expect("cube has normals");
            assert!(face.abs_diff_eq(stored, 1e-5), "{face:?} vs {stored:?}");
        }
    }

    #[test]
    fn computed_normals_match_flat_plane() {
        let mut plane = MeshData::plane();
        let expected = plane.normals().to_vec();
        plane.compute_normals(true);
        for (a, b) in plane.normals().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn tangent_frames_are_perpendicular_to_normals() {
        let cube = MeshData::cube();
        let frames = cube.compute_tangent_frames().expect("cube has uvs");
        for vertex in 0..cube.vertex_count() {
            let t = Vec3::from_slice(&frames.tangents[vertex * 3..vertex * 3 + 3]);
            let n = cube.normal(vertex).unwrap();
            assert!(t.dot(n).abs() < 1e-5);
            assert!(t.length() > 0.5);
        }
    }

    #[test]
    fn tangent_frames_need_uvs() {
        let mesh = MeshData::new(vec![0.0; 9], vec![0.0; 9], vec![], vec![0, 1, 2]).unwrap();
        assert!(mesh.compute_tangent_frames().is_none());
    }
}
