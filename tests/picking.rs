use glam::{Quat, Vec2, Vec3};
use xr_scene::asset::MeshData;
use xr_scene::scene::{
    intersect_triangle, CullingPolicy, HitPolicy, Picker, Ray, Scene, Transform,
};

const EPSILON: f32 = 1e-5;

fn scene_with_two_boxes() -> (Scene, hecs::Entity, hecs::Entity) {
    let mut scene = Scene::new();
    scene.camera_mut().resize(640.0, 480.0);
    scene.camera_mut().translation = Vec3::new(0.1, 0.2, 10.0);
    scene.camera_mut().update(true);

    let cube = scene.add_mesh(MeshData::cube());
    let far = scene
        .spawn()
        .with_name("far")
        .with_mesh(cube)
        .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, -5.0)))
        .pickable(CullingPolicy::FrontOnly)
        .spawn()
        .unwrap();
    let near = scene
        .spawn()
        .with_name("near")
        .with_mesh(cube)
        .pickable(CullingPolicy::FrontOnly)
        .spawn()
        .unwrap();
    scene.update_transforms();
    (scene, near, far)
}

#[test]
fn canonical_ray_hits_triangle_at_origin() {
    let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0)).unwrap();
    let hit = intersect_triangle(
        &ray,
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    )
    .expect("hit");

    assert!(hit.position.abs_diff_eq(Vec3::ZERO, EPSILON));
    assert!(hit.position.abs_diff_eq(ray.origin + ray.direction * hit.distance, EPSILON));
    assert!((hit.distance - 5.0).abs() < EPSILON);
    assert!(hit.barycentric.abs_diff_eq(Vec2::new(0.25, 0.5), EPSILON));
    assert!(hit.front_facing);
}

#[test]
fn pick_returns_nearest_node() {
    let (scene, near, _far) = scene_with_two_boxes();
    let ray = Ray::new(Vec3::new(0.1, 0.2, 10.0), Vec3::NEG_Z).unwrap();

    let result = Picker::default().pick(&scene, &ray).expect("boxes in line");
    assert_eq!(result.entity, near);
    assert!((result.hit.distance - 9.0).abs() < EPSILON);
    assert!(result.hit.normal.abs_diff_eq(Vec3::Z, EPSILON));
}

#[test]
fn pick_screen_through_center_matches_world_ray() {
    let (scene, near, _far) = scene_with_two_boxes();
    let result = Picker::default()
        .pick_screen(&scene, 320.0, 240.0)
        .expect("center of screen");
    assert_eq!(result.entity, near);
    assert!(result.hit.position.abs_diff_eq(Vec3::new(0.1, 0.2, 1.0), 1e-3));
}

#[test]
fn culling_policy_filters_facing() {
    let mut scene = Scene::new();
    let cube = scene.add_mesh(MeshData::cube());
    let inside_out = scene
        .spawn()
        .with_mesh(cube)
        .pickable(CullingPolicy::BackOnly)
        .spawn()
        .unwrap();
    scene.update_transforms();

    // From inside the cube every face is seen from behind.
    let ray = Ray::new(Vec3::new(0.1, 0.2, 0.0), Vec3::NEG_Z).unwrap();
    let result = Picker::default().pick(&scene, &ray).expect("inside hit");
    assert_eq!(result.entity, inside_out);
    assert!(!result.hit.front_facing);
    assert!((result.hit.distance - 1.0).abs() < EPSILON);

    scene
        .world
        .insert_one(inside_out, xr_scene::scene::Pickable(CullingPolicy::FrontOnly))
        .unwrap();
    assert!(Picker::default().pick(&scene, &ray).is_none());
}

#[test]
fn nodes_without_pickable_are_ignored() {
    let mut scene = Scene::new();
    let cube = scene.add_mesh(MeshData::cube());
    scene.spawn().with_mesh(cube).spawn().unwrap();
    scene.update_transforms();

    let ray = Ray::new(Vec3::new(0.0, 0.3, 5.0), Vec3::NEG_Z).unwrap();
    assert!(Picker::default().pick(&scene, &ray).is_none());
}

#[test]
fn child_mesh_is_picked_in_world_space() {
    let mut scene = Scene::new();
    let cube = scene.add_mesh(MeshData::cube());
    let parent = scene
        .spawn()
        .with_transform(
            Transform::from_translation(Vec3::new(10.0, 0.0, 0.0))
                .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        )
        .spawn()
        .unwrap();
    let child = scene
        .spawn()
        .with_mesh(cube)
        .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 3.0)))
        .pickable(CullingPolicy::FrontOnly)
        .child_of(parent)
        .spawn()
        .unwrap();
    scene.update_transforms();

    // Local +Z under a +90deg yaw is world +X: the child sits at (13, 0, 0).
    let ray = Ray::new(Vec3::new(13.2, 0.1, 5.0), Vec3::NEG_Z).unwrap();
    let result = Picker::default().pick(&scene, &ray).expect("child hit");
    assert_eq!(result.entity, child);
    assert!(result.hit.position.abs_diff_eq(Vec3::new(13.2, 0.1, 1.0), 1e-4));
    // World +Z face of the child is its local -X face.
    assert!(result
        .hit
        .local_position
        .abs_diff_eq(Vec3::new(-1.0, 0.1, 0.2), 1e-4));
}

#[test]
fn first_hit_policy_stops_at_index_order() {
    let mesh = MeshData::cube();
    let mut node = xr_scene::scene::SceneNode::default();
    node.transform(None);
    let ray = Ray::new(Vec3::new(0.2, 0.1, -5.0), Vec3::Z).unwrap();

    let first = Picker::new(HitPolicy::First)
        .intersect_mesh(&ray, &mesh, &node, CullingPolicy::None)
        .unwrap();
    let nearest = Picker::new(HitPolicy::Nearest)
        .intersect_mesh(&ray, &mesh, &node, CullingPolicy::None)
        .unwrap();
    assert!(first.distance > nearest.distance);
}
