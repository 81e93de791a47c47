use glam::Vec2;
use hecs::Entity;

use super::components::{MeshComponent, Pickable};
use super::node::SceneNode;
use super::picking::{CullingPolicy, Hit, Picker};
use super::ray::Ray;
use super::scene::Scene;

/// A textured quad in the scene that forwards pointer input to a 2D surface
/// of `width` x `height` pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractivePanel {
    pub node: Entity,
    pub width: f32,
    pub height: f32,
}

impl InteractivePanel {
    pub fn new(node: Entity, width: f32, height: f32) -> Self {
        Self {
            node,
            width,
            height,
        }
    }

    fn hit(&self, scene: &Scene, picker: &Picker, ray: &Ray) -> Option<Hit> {
        let node = *scene.world.get::<&SceneNode>(self.node).ok()?;
        let handle = scene.world.get::<&MeshComponent>(self.node).ok()?.0;
        let culling = scene
            .world
            .get::<&Pickable>(self.node)
            .map(|pickable| pickable.0)
            .unwrap_or(CullingPolicy::None);
        let mesh = scene.assets.meshes.get(handle)?;
        picker.intersect_mesh(ray, mesh, &node, culling)
    }

    /// Panel pixel under `ray`, or `None` when the ray misses the panel or
    /// its mesh has no texture coordinates.
    pub fn surface_point(&self, scene: &Scene, picker: &Picker, ray: &Ray) -> Option<Vec2> {
        let uv = self.hit(scene, picker, ray)?.uv?;
        let point = uv * Vec2::new(self.width, self.height);
        log::trace!("Panel {:?} hit at {:?}", self.node, point);
        Some(point)
    }

    /// Panel pixel under a viewport pixel of the scene camera.
    pub fn surface_point_from_screen(
        &self,
        scene: &Scene,
        picker: &Picker,
        x: f32,
        y: f32,
    ) -> Option<Vec2> {
        let ray = Ray::from_screen_point(x, y, scene.camera())?;
        self.surface_point(scene, picker, &ray)
    }

    /// Viewport pixel where a device ray meets the panel, for drawing a cursor.
    pub fn screen_point_from_ray(&self, scene: &Scene, picker: &Picker, ray: &Ray) -> Option<Vec2> {
        let hit = self.hit(scene, picker, ray)?;
        Some(scene.camera().world_to_screen_point(hit.position))
    }
}
