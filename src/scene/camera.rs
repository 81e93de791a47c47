use bitflags::bitflags;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use std::f32::consts::FRAC_PI_2;

use crate::settings::CameraSettings;

bitflags! {
    /// Movement keys held this frame. The two reserved bits are accepted
    /// from the input layer but drive nothing.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct MoveFlags: u8 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const RESERVED_0 = 1 << 6;
        const RESERVED_1 = 1 << 7;
    }
}

impl MoveFlags {
    /// Build from the eight positional booleans the input layer produces.
    pub fn from_array(pressed: [bool; 8]) -> Self {
        pressed
            .iter()
            .enumerate()
            .filter(|(_, down)| **down)
            .fold(MoveFlags::empty(), |flags, (bit, _)| {
                flags | MoveFlags::from_bits_retain(1 << bit)
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    /// Pose integrated from keyboard/mouse input.
    Free,
    /// View and projection supplied by a tracked device.
    External,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.z_near, self.z_far)
    }
}

/// Free-fly perspective camera with velocity-damped input.
///
/// `rotation` holds Euler angles: x is pitch, y is yaw, z is roll (kept at
/// zero). The view matrix is `Rx(pitch) * Ry(yaw) * Rz(roll) * T(-translation)`
/// and the basis vectors are read back from its rotation rows, so anything
/// that consumes `right`/`up`/`forward` depends on that order.
#[derive(Clone, Debug)]
pub struct Camera {
    pub translation: Vec3,
    pub rotation: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
    projection: Projection,
    viewport: Vec2,
    view: Mat4,
    projection_matrix: Mat4,
    view_projection: Mat4,
    view_inverse: Mat4,
    projection_inverse: Mat4,
    view_projection_inverse: Mat4,
    translation_velocity: Vec3,
    rotation_velocity: Vec3,
    delta_time: f32,
    mode: CameraMode,
    needs_update: bool,
    settings: CameraSettings,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraSettings::default())
    }
}

impl Camera {
    pub fn new(settings: &CameraSettings) -> Self {
        let projection = Projection {
            fov_y_radians: settings.fov_y_radians(),
            aspect: 1.0,
            z_near: settings.z_near,
            z_far: settings.z_far,
        };
        let projection_matrix = projection.matrix();

        let mut camera = Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            right: Vec3::X,
            up: Vec3::Y,
            forward: Vec3::NEG_Z,
            projection,
            viewport: Vec2::ONE,
            view: Mat4::IDENTITY,
            projection_matrix,
            view_projection: projection_matrix,
            view_inverse: Mat4::IDENTITY,
            projection_inverse: projection_matrix.inverse(),
            view_projection_inverse: projection_matrix.inverse(),
            translation_velocity: Vec3::ZERO,
            rotation_velocity: Vec3::ZERO,
            delta_time: 0.0,
            mode: CameraMode::Free,
            needs_update: true,
            settings: settings.clone(),
        };
        camera.update(true);
        camera
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        if self.mode != mode {
            log::debug!("Camera mode {:?} -> {:?}", self.mode, mode);
            self.translation_velocity = Vec3::ZERO;
            self.rotation_velocity = Vec3::ZERO;
        }
        self.mode = mode;
    }

    /// Whether the last update still had velocity to integrate.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn translation_velocity(&self) -> Vec3 {
        self.translation_velocity
    }

    pub fn rotation_velocity(&self) -> Vec3 {
        self.rotation_velocity
    }

    pub fn set_translation_velocity(&mut self, velocity: Vec3) {
        self.translation_velocity = velocity;
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection
    }

    pub fn view_inverse_matrix(&self) -> Mat4 {
        self.view_inverse
    }

    pub fn projection_inverse_matrix(&self) -> Mat4 {
        self.projection_inverse
    }

    pub fn view_projection_inverse_matrix(&self) -> Mat4 {
        self.view_projection_inverse
    }

    /// Store the viewport and rebuild the projection for its aspect ratio.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            log::warn!("Ignoring camera resize to {}x{}", width, height);
            return;
        }
        self.viewport = Vec2::new(width, height);
        self.projection.aspect = width / height;
        self.projection_matrix = self.projection.matrix();
        log::debug!(
            "Camera resized to {}x{} (aspect {:.3})",
            width,
            height,
            self.projection.aspect
        );
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.projection_matrix = projection.matrix();
    }

    /// Feed a tracked-device pose. Takes effect on the next `update`.
    pub fn set_external_pose(&mut self, view: Mat4, projection: Mat4, viewport: Vec2) {
        self.set_mode(CameraMode::External);
        self.view = view;
        self.projection_matrix = projection;
        self.viewport = viewport;
        if viewport.y > 0.0 {
            self.projection.aspect = viewport.x / viewport.y;
        }
        self.translation = view.inverse().w_axis.truncate();
    }

    /// Accumulate one frame of input into the velocity integrators.
    pub fn control(&mut self, flags: MoveFlags, look_delta: Vec2, delta_time: f32) {
        self.delta_time = delta_time;
        if self.mode != CameraMode::Free {
            return;
        }

        let speed = self.settings.move_speed * delta_time;
        let mut direction = Vec3::ZERO;

        if flags.contains(MoveFlags::FORWARD) {
            direction.z += speed;
        } else if flags.contains(MoveFlags::BACKWARD) {
            direction.z -= speed;
        }
        if flags.contains(MoveFlags::LEFT) {
            direction.x += speed;
        } else if flags.contains(MoveFlags::RIGHT) {
            direction.x -= speed;
        }
        if flags.contains(MoveFlags::UP) {
            direction.y -= speed;
        } else if flags.contains(MoveFlags::DOWN) {
            direction.y += speed;
        }

        self.translation_velocity += direction;
        self.rotation_velocity += Vec3::new(look_delta.x, look_delta.y, 0.0);
    }

    /// Move relative to the current heading. The direction is expressed in
    /// the camera's "away" frame, hence the subtraction.
    pub fn move_local(&mut self, direction: Vec3) {
        if direction == Vec3::ZERO {
            return;
        }
        let unrotate = Quat::from_rotation_y(-self.rotation.y) * Quat::from_rotation_x(-self.rotation.x);
        self.translation -= unrotate * direction;
    }

    /// Apply a look delta: `delta.y` drives pitch, `delta.x` drives yaw.
    pub fn look(&mut self, delta: Vec2, delta_time: f32) {
        self.rotation.x += delta.y * delta_time;
        self.rotation.y += delta.x * delta_time;
        self.rotation.x = self.rotation.x.clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Integrate velocities and refresh every derived matrix.
    ///
    /// With `reset_smoothing` the velocities are dropped instead of applied.
    pub fn update(&mut self, reset_smoothing: bool) {
        self.needs_update = false;

        if self.mode == CameraMode::Free {
            if reset_smoothing {
                self.translation_velocity = Vec3::ZERO;
                self.rotation_velocity = Vec3::ZERO;
            } else {
                self.integrate_velocity();
            }
            self.view = Mat4::from_rotation_x(self.rotation.x)
                * Mat4::from_rotation_y(self.rotation.y)
                * Mat4::from_rotation_z(self.rotation.z)
                * Mat4::from_translation(-self.translation);
        }

        self.right = self.view.row(0).truncate().normalize_or_zero();
        self.up = self.view.row(1).truncate().normalize_or_zero();
        self.forward = -self.view.row(2).truncate().normalize_or_zero();

        self.projection_inverse = self.projection_matrix.inverse();
        self.view_inverse = self.view.inverse();
        self.view_projection = self.projection_matrix * self.view;
        self.view_projection_inverse = self.view_projection.inverse();
    }

    fn integrate_velocity(&mut self) {
        let epsilon = self.settings.settle_epsilon;

        if self.translation_velocity.length() <= epsilon {
            self.translation_velocity = Vec3::ZERO;
        } else {
            self.needs_update = true;
        }
        self.translation_velocity *= self.settings.translation_damping;
        self.move_local(self.translation_velocity);

        if self.rotation_velocity.length() <= epsilon {
            self.rotation_velocity = Vec3::ZERO;
        } else {
            self.needs_update = true;
        }
        self.rotation_velocity *= self.settings.rotation_damping;
        let look = self.rotation_velocity.truncate();
        if look != Vec2::ZERO {
            self.look(look, self.delta_time);
        }

        log::trace!(
            "Camera velocity t={:?} r={:?} settled={}",
            self.translation_velocity,
            self.rotation_velocity,
            !self.needs_update
        );
    }

    /// Viewport pixel (x, y) plus depth in [0, 1] to world space.
    pub fn screen_to_world_point(&self, point: Vec3) -> Vec3 {
        let ndc = Vec3::new(
            2.0 * point.x / self.viewport.x - 1.0,
            1.0 - 2.0 * point.y / self.viewport.y,
            point.z,
        );
        self.view_projection_inverse.project_point3(ndc)
    }

    /// World position to viewport pixels, origin at the top-left corner.
    pub fn world_to_screen_point(&self, point: Vec3) -> Vec2 {
        let ndc = self.view_projection.project_point3(point);
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        )
    }

    pub fn model_view_inverse(&self, model: &Mat4) -> Mat4 {
        (self.view * *model).inverse()
    }

    /// Origin of `model` in view space; `-z` is the distance along the view axis.
    pub fn view_space_position(&self, model: &Mat4) -> Vec3 {
        (self.view * model.w_axis).truncate()
    }

    /// World-space direction (not normalized) through an NDC point.
    pub(crate) fn unproject_direction(&self, ndc: Vec2) -> Vec3 {
        let eye = self.projection_inverse * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let camera_dir = Vec4::new(eye.x, eye.y, -1.0, 0.0);
        (self.view_inverse * camera_dir).truncate()
    }
}
