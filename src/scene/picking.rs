use glam::{Vec2, Vec3};
use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::components::{MeshComponent, Pickable};
use super::node::SceneNode;
use super::ray::Ray;
use super::scene::Scene;
use crate::asset::MeshData;

const PARALLEL_EPSILON: f32 = 1e-6;

/// Which triangle facing is eligible for a hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullingPolicy {
    /// Both facings count.
    None,
    /// Only triangles wound counter-clockwise toward the ray.
    #[default]
    FrontOnly,
    /// Only triangles facing away from the ray, e.g. the inside of a sky dome.
    BackOnly,
}

impl CullingPolicy {
    pub fn accepts(self, front_facing: bool) -> bool {
        match self {
            CullingPolicy::None => true,
            CullingPolicy::FrontOnly => front_facing,
            CullingPolicy::BackOnly => !front_facing,
        }
    }
}

/// Which accepted triangle a mesh query reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HitPolicy {
    /// First accepted triangle in index order.
    First,
    /// Accepted triangle closest to the ray origin.
    #[default]
    Nearest,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleHit {
    pub position: Vec3,
    /// Distance along the ray.
    pub distance: f32,
    /// Weights of the second and third vertex.
    pub barycentric: Vec2,
    pub front_facing: bool,
}

/// Möller–Trumbore ray/triangle test.
///
/// Both windings are tested; `front_facing` tells them apart. Rays parallel
/// to the triangle plane and hits behind the ray origin report `None`.
pub fn intersect_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<TriangleHit> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let r = ray.direction.cross(e2);
    let a = e1.dot(r);

    let s = ray.origin - v0;
    let q = s.cross(e1);
    let u = s.dot(r);
    let v = ray.direction.dot(q);

    if a > PARALLEL_EPSILON {
        if u < 0.0 || u > a || v < 0.0 || u + v > a {
            return None;
        }
    } else if a < -PARALLEL_EPSILON {
        if u > 0.0 || u < a || v > 0.0 || u + v < a {
            return None;
        }
    } else {
        return None;
    }

    let t = e2.dot(q) / a;
    if t < 0.0 {
        return None;
    }

    Some(TriangleHit {
        position: ray.at(t),
        distance: t,
        barycentric: Vec2::new(u / a, v / a),
        front_facing: a > PARALLEL_EPSILON,
    })
}

/// Result of a mesh query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// World-space hit point.
    pub position: Vec3,
    /// Hit point in the node's local space.
    pub local_position: Vec3,
    /// World-space surface normal.
    pub normal: Vec3,
    /// Interpolated texture coordinate, when the mesh has UVs.
    pub uv: Option<Vec2>,
    pub distance: f32,
    pub front_facing: bool,
    /// Triangle number in index-buffer order.
    pub triangle: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickResult {
    pub entity: Entity,
    pub hit: Hit,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Picker {
    pub hit_policy: HitPolicy,
}

impl Picker {
    pub fn new(hit_policy: HitPolicy) -> Self {
        Self { hit_policy }
    }

    /// Intersect `ray` with `mesh` placed by `node`'s current model matrix.
    pub fn intersect_mesh(
        &self,
        ray: &Ray,
        mesh: &MeshData,
        node: &SceneNode,
        culling: CullingPolicy,
    ) -> Option<Hit> {
        let model = node.model_matrix();
        let mut best: Option<(usize, [usize; 3], TriangleHit)> = None;

        for (triangle, indices) in mesh.triangles().enumerate() {
            let [i0, i1, i2] = indices;
            let v0 = model.transform_point3(mesh.position(i0));
            let v1 = model.transform_point3(mesh.position(i1));
            let v2 = model.transform_point3(mesh.position(i2));

            let Some(hit) = intersect_triangle(ray, v0, v1, v2) else {
                continue;
            };
            if !culling.accepts(hit.front_facing) {
                continue;
            }

            let closer = best
                .as_ref()
                .map_or(true, |(_, _, current)| hit.distance < current.distance);
            if closer {
                best = Some((triangle, indices, hit));
            }
            if self.hit_policy == HitPolicy::First {
                break;
            }
        }

        best.map(|(triangle, indices, hit)| surface_hit(mesh, node, triangle, indices, hit))
    }

    /// Closest hit over every pickable node with a mesh.
    pub fn pick(&self, scene: &Scene, ray: &Ray) -> Option<PickResult> {
        let mut best: Option<PickResult> = None;

        for (entity, (node, mesh, pickable)) in scene
            .world
            .query::<(&SceneNode, &MeshComponent, &Pickable)>()
            .iter()
        {
            let Some(mesh) = scene.assets.meshes.get(mesh.0) else {
                log::warn!("Pickable node {:?} references a missing mesh", entity);
                continue;
            };
            let Some(hit) = self.intersect_mesh(ray, mesh, node, pickable.0) else {
                continue;
            };
            log::trace!("Ray hit {:?} at distance {}", entity, hit.distance);

            if best.map_or(true, |current| hit.distance < current.hit.distance) {
                best = Some(PickResult { entity, hit });
            }
        }

        best
    }

    /// Pick through a viewport pixel of the scene camera.
    pub fn pick_screen(&self, scene: &Scene, x: f32, y: f32) -> Option<PickResult> {
        let ray = Ray::from_screen_point(x, y, scene.camera())?;
        self.pick(scene, &ray)
    }
}

fn surface_hit(
    mesh: &MeshData,
    node: &SceneNode,
    triangle: usize,
    [i0, i1, i2]: [usize; 3],
    hit: TriangleHit,
) -> Hit {
    let (u, v) = (hit.barycentric.x, hit.barycentric.y);
    let w = 1.0 - u - v;

    let normal = match (mesh.normal(i0), mesh.normal(i1), mesh.normal(i2)) {
        (Some(n0), Some(n1), Some(n2)) => {
            let local = n0 * w + n1 * u + n2 * v;
            (node.normal_matrix3() * local).normalize_or_zero()
        }
        _ => {
            let model = node.model_matrix();
            let (v0, v1, v2) = (
                model.transform_point3(mesh.position(i0)),
                model.transform_point3(mesh.position(i1)),
                model.transform_point3(mesh.position(i2)),
            );
            (v1 - v0).cross(v2 - v0).normalize_or_zero()
        }
    };

    let uv = match (mesh.uv(i0), mesh.uv(i1), mesh.uv(i2)) {
        (Some(uv0), Some(uv1), Some(uv2)) => Some(uv0 * w + uv1 * u + uv2 * v),
        _ => None,
    };

    Hit {
        position: hit.position,
        local_position: node.model_inverse_matrix().transform_point3(hit.position),
        normal,
        uv,
        distance: hit.distance,
        front_facing: hit.front_facing,
        triangle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;
    use glam::Quat;

    fn down_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap()
    }

    const TRI: [Vec3; 3] = [
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ];

    #[test]
    fn canonical_triangle_hit() {
        let hit = intersect_triangle(&down_ray(), TRI[0], TRI[1], TRI[2]).expect("hit");
        assert!(hit.position.abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!((hit.distance - 5.0).abs() < 1e-6);
        assert!(hit.barycentric.abs_diff_eq(Vec2::new(0.25, 0.5), 1e-6));
        assert!(hit.front_facing);
    }

    #[test]
    fn translated_ray_misses() {
        let mut ray = down_ray();
        ray.origin += Vec3::new(10.0, 0.0, 0.0);
        assert!(intersect_triangle(&ray, TRI[0], TRI[1], TRI[2]).is_none());
    }

    #[test]
    fn reversed_winding_is_back_facing() {
        let hit = intersect_triangle(&down_ray(), TRI[0], TRI[2], TRI[1]).expect("hit");
        assert!(!hit.front_facing);
        assert!(hit.position.abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X).unwrap();
        assert!(intersect_triangle(&ray, TRI[0], TRI[1], TRI[2]).is_none());
    }

    #[test]
    fn triangle_behind_origin_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z).unwrap();
        assert!(intersect_triangle(&ray, TRI[0], TRI[1], TRI[2]).is_none());
    }

    #[test]
    fn culling_policy_table() {
        assert!(CullingPolicy::None.accepts(true));
        assert!(CullingPolicy::None.accepts(false));
        assert!(CullingPolicy::FrontOnly.accepts(true));
        assert!(!CullingPolicy::FrontOnly.accepts(false));
        assert!(CullingPolicy::BackOnly.accepts(false));
        assert!(!CullingPolicy::BackOnly.accepts(true));
    }

    fn node_with(transform: Transform) -> SceneNode {
        let mut node = SceneNode::new(transform);
        node.transform(None);
        node
    }

    #[test]
    fn cube_front_and_back_faces() {
        let cube = MeshData::cube();
        let node = node_with(Transform::IDENTITY);
        let ray = Ray::new(Vec3::new(0.2, 0.1, 5.0), Vec3::NEG_Z).unwrap();
        let picker = Picker::default();

        let front = picker
            .intersect_mesh(&ray, &cube, &node, CullingPolicy::FrontOnly)
            .expect("front face");
        assert!(front.position.abs_diff_eq(Vec3::new(0.2, 0.1, 1.0), 1e-5));
        assert!(front.normal.abs_diff_eq(Vec3::Z, 1e-5));
        assert!(front.front_facing);

        let back = picker
            .intersect_mesh(&ray, &cube, &node, CullingPolicy::BackOnly)
            .expect("back face");
        assert!(back.position.abs_diff_eq(Vec3::new(0.2, 0.1, -1.0), 1e-5));
        assert!(!back.front_facing);
    }

    #[test]
    fn first_hit_follows_index_order() {
        // The +Z face precedes the -Z face in the cube's index buffer, and
        // is the far one for a ray travelling +Z.
        let cube = MeshData::cube();
        let node = node_with(Transform::IDENTITY);
        let ray = Ray::new(Vec3::new(0.2, 0.1, -5.0), Vec3::Z).unwrap();

        let first = Picker::new(HitPolicy::First)
            .intersect_mesh(&ray, &cube, &node, CullingPolicy::None)
            .unwrap();
        let nearest = Picker::new(HitPolicy::Nearest)
            .intersect_mesh(&ray, &cube, &node, CullingPolicy::None)
            .unwrap();

        assert!((first.distance - 6.0).abs() < 1e-5);
        assert!(!first.front_facing);
        assert!((nearest.distance - 4.0).abs() < 1e-5);
        assert!(nearest.front_facing);
        assert!(first.triangle < nearest.triangle);
    }

    #[test]
    fn hit_reports_local_position_and_uv() {
        let plane = MeshData::plane();
        let node = node_with(Transform::from_trs(
            Vec3::new(0.0, 2.0, 0.0),
            Quat::IDENTITY,
            Vec3::new(3.0, 1.0, 3.0),
        ));
        let ray = Ray::new(Vec3::new(1.5, 10.0, -1.5), Vec3::NEG_Y).unwrap();

        let hit = Picker::default()
            .intersect_mesh(&ray, &plane, &node, CullingPolicy::None)
            .expect("plane hit");

        assert!(hit.position.abs_diff_eq(Vec3::new(1.5, 2.0, -1.5), 1e-5));
        assert!(hit.local_position.abs_diff_eq(Vec3::new(0.5, 0.0, -0.5), 1e-5));
        // u runs 1 -> 0 along +z, v runs 1 -> 0 along +x.
        let uv = hit.uv.expect("plane has uvs");
        assert!(uv.abs_diff_eq(Vec2::new(0.75, 0.25), 1e-5), "{uv:?}");
        assert!(hit.normal.abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }

    #[test]
    fn nonuniform_scale_keeps_normals_unit_length() {
        let cube = MeshData::cube();
        let node = node_with(Transform::IDENTITY.with_scale(Vec3::new(5.0, 0.5, 2.0)));
        let ray = Ray::new(Vec3::new(0.3, 0.2, 10.0), Vec3::NEG_Z).unwrap();

        let hit = Picker::default()
            .intersect_mesh(&ray, &cube, &node, CullingPolicy::FrontOnly)
            .unwrap();
        assert!((hit.normal.length() - 1.0).abs() < 1e-5);
        assert!(hit.position.abs_diff_eq(Vec3::new(0.3, 0.2, 2.0), 1e-5));
    }
}
