use glam::{Quat, Vec2, Vec3};

use super::camera::Camera;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length.
    pub direction: Vec3,
}

impl Ray {
    /// `None` when `direction` has no length.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    /// Ray from the camera through a viewport pixel (origin top-left).
    ///
    /// The viewport must be non-empty.
    pub fn from_screen_point(x: f32, y: f32, camera: &Camera) -> Option<Self> {
        let viewport = camera.viewport();
        let ndc = Vec2::new(2.0 * x / viewport.x - 1.0, 1.0 - 2.0 * y / viewport.y);
        let direction = camera.unproject_direction(ndc);
        Self::new(camera.translation, direction)
    }

    /// Ray along the -Z axis of a tracked pose (controller laser).
    pub fn from_pose(origin: Vec3, rotation: Quat) -> Self {
        Self {
            origin,
            direction: (rotation.normalize() * Vec3::NEG_Z).normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(translation: Vec3) -> Camera {
        let mut camera = Camera::default();
        camera.resize(640.0, 480.0);
        camera.translation = translation;
        camera.update(true);
        camera
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(Ray::new(Vec3::ZERO, Vec3::ZERO).is_none());
    }

    #[test]
    fn center_pixel_follows_forward() {
        let camera = camera_at(Vec3::new(1.0, 2.0, 3.0));
        let ray = Ray::from_screen_point(320.0, 240.0, &camera).unwrap();
        assert_eq!(ray.origin, Vec3::new(1.0, 2.0, 3.0));
        assert!(ray.direction.abs_diff_eq(camera.forward(), 1e-5));
    }

    #[test]
    fn top_left_pixel_points_up_and_left() {
        let camera = camera_at(Vec3::ZERO);
        let ray = Ray::from_screen_point(0.0, 0.0, &camera).unwrap();
        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.y > 0.0);
        assert!(ray.direction.z < 0.0);
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);

        // The corner ray sits on the frustum edge: half the vertical FOV.
        let fov = camera.projection().fov_y_radians;
        let vertical = ray.direction.y / -ray.direction.z;
        assert!((vertical - (fov * 0.5).tan()).abs() < 1e-4);
    }

    #[test]
    fn screen_ray_passes_through_unprojected_point() {
        let mut camera = camera_at(Vec3::new(0.0, 1.0, 4.0));
        camera.rotation = Vec3::new(0.2, -0.5, 0.0);
        camera.update(true);

        let world = camera.screen_to_world_point(Vec3::new(100.0, 380.0, 0.9));
        let ray = Ray::from_screen_point(100.0, 380.0, &camera).unwrap();
        let to_point = (world - ray.origin).normalize();
        assert!(to_point.abs_diff_eq(ray.direction, 1e-3));
    }

    #[test]
    fn pose_ray_points_down_rotated_negative_z() {
        let ray = Ray::from_pose(
            Vec3::new(0.0, 1.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_X, 1e-6));
        assert!(ray.at(2.0).abs_diff_eq(Vec3::new(-2.0, 1.0, 0.0), 1e-6));
    }
}
