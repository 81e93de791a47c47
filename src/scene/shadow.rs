use glam::{Mat4, Vec3};

use super::bounds::Aabb;
use super::camera::Camera;
use crate::settings::{ShadowFit, ShadowSettings, SplitFractions};

/// One depth slice of the camera frustum and the box that covers it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSplit {
    pub fractions: SplitFractions,
    pub z_near: f32,
    pub z_far: f32,
    /// World-space corners: near plane top-left, top-right, bottom-right,
    /// bottom-left, then the far plane in the same order.
    pub corners: [Vec3; 8],
    /// Bound of `corners` in light view space.
    pub light_space_bounds: Aabb,
    pub ortho: Mat4,
    view_projection: Mat4,
}

impl ShadowSplit {
    fn new(fractions: SplitFractions) -> Self {
        Self {
            fractions,
            z_near: 0.0,
            z_far: 0.0,
            corners: [Vec3::ZERO; 8],
            light_space_bounds: Aabb {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            },
            ortho: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
        }
    }

    /// `ortho * light_view` for this split.
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }
}

/// Parallel-split shadow cascades for the single directional light.
#[derive(Clone, Debug)]
pub struct CascadedShadow {
    splits: Vec<ShadowSplit>,
    fit: ShadowFit,
    light_position: Vec3,
    light_target: Vec3,
    light_up: Vec3,
    light_view: Mat4,
    shadow_space: Mat4,
}

impl Default for CascadedShadow {
    fn default() -> Self {
        Self::new(&ShadowSettings::default())
    }
}

impl CascadedShadow {
    pub fn new(settings: &ShadowSettings) -> Self {
        let splits: Vec<ShadowSplit> = settings
            .cascades
            .iter()
            .copied()
            .map(ShadowSplit::new)
            .collect();
        log::debug!("Cascaded shadow with {} splits, fit {:?}", splits.len(), settings.fit);

        let mut light_position = Vec3::from(settings.light_position);
        let mut light_target = Vec3::from(settings.light_target);
        if light_position.distance_squared(light_target) < 1e-6 {
            log::warn!("Light position and target coincide. Using default light placement.");
            let defaults = ShadowSettings::default();
            light_position = Vec3::from(defaults.light_position);
            light_target = Vec3::from(defaults.light_target);
        }
        let light_up = stable_light_up(
            (light_target - light_position).normalize(),
            Vec3::from(settings.light_up),
        );

        Self {
            splits,
            fit: settings.fit,
            light_position,
            light_target,
            light_up,
            light_view: Mat4::IDENTITY,
            shadow_space: Mat4::IDENTITY,
        }
    }

    pub fn splits(&self) -> &[ShadowSplit] {
        &self.splits
    }

    pub fn fit(&self) -> ShadowFit {
        self.fit
    }

    pub fn light_view_matrix(&self) -> Mat4 {
        self.light_view
    }

    /// Matrix sampled by the lighting pass: split 0's ortho times the light view.
    pub fn shadow_space_matrix(&self) -> Mat4 {
        self.shadow_space
    }

    /// World-space direction the light travels.
    pub fn light_direction(&self) -> Vec3 {
        (self.light_target - self.light_position).normalize_or_zero()
    }

    /// Recompute every split from the camera's current pose and projection.
    /// The camera must already be updated for this frame.
    pub fn update(&mut self, camera: &Camera) {
        // The light follows the camera across the ground plane only.
        let translation = camera.translation;
        self.light_view = Mat4::look_at_rh(self.light_position, self.light_target, self.light_up)
            * Mat4::from_translation(-Vec3::new(translation.x, 0.0, translation.z));

        let projection = camera.projection();
        for split in &mut self.splits {
            split.z_near = split.fractions.near * projection.z_near;
            split.z_far = split.fractions.far * projection.z_far;
            split.corners = slab_corners(camera, split.z_near, split.z_far);

            let light_space = split.corners.map(|c| self.light_view.transform_point3(c));
            split.light_space_bounds = frustum_bounds(&light_space);
            split.ortho = ortho_for(self.fit, &split.light_space_bounds);
            split.view_projection = split.ortho * self.light_view;

            log::trace!(
                "Shadow split [{:.3}, {:.3}] bounds {:?}",
                split.z_near,
                split.z_far,
                split.light_space_bounds
            );
        }

        self.shadow_space = self
            .splits
            .first()
            .map_or(Mat4::IDENTITY, |split| split.view_projection);
    }
}

/// Per-axis min/max over a set of light-space corners.
pub fn frustum_bounds(corners: &[Vec3; 8]) -> Aabb {
    corners.iter().skip(1).fold(
        Aabb {
            min: corners[0],
            max: corners[0],
        },
        |bounds, &c| Aabb {
            min: bounds.min.min(c),
            max: bounds.max.max(c),
        },
    )
}

/// Up vector for the light's look-at. Falls back to +X (or +Z) when `up` is
/// degenerate or nearly parallel to `direction`.
pub(crate) fn stable_light_up(direction: Vec3, up: Vec3) -> Vec3 {
    let usable = |axis: Vec3| axis != Vec3::ZERO && axis.dot(direction).abs() <= 0.95;
    let up = up.normalize_or_zero();
    if usable(up) {
        up
    } else if usable(Vec3::X) {
        Vec3::X
    } else {
        Vec3::Z
    }
}

fn slab_corners(camera: &Camera, z_near: f32, z_far: f32) -> [Vec3; 8] {
    let projection = camera.projection();
    let tan_half_fov = (projection.fov_y_radians * 0.5).tan();
    let (right, up, forward) = (camera.right(), camera.up(), camera.forward());

    let plane = |distance: f32| {
        let center = camera.translation + forward * distance;
        let half_height = up * (tan_half_fov * distance);
        let half_width = right * (tan_half_fov * distance * projection.aspect);
        [
            center + half_height - half_width,
            center + half_height + half_width,
            center - half_height + half_width,
            center - half_height - half_width,
        ]
    };

    let [n0, n1, n2, n3] = plane(z_near);
    let [f0, f1, f2, f3] = plane(z_far);
    [n0, n1, n2, n3, f0, f1, f2, f3]
}

fn ortho_for(fit: ShadowFit, bounds: &Aabb) -> Mat4 {
    match fit {
        ShadowFit::Bounds { padding } => {
            let Aabb { min, max } = bounds.expanded(padding);
            // Light space looks down -Z. Depth starts at the light itself so
            // casters between the light and the slab stay inside the box.
            let near = (-max.z).min(0.0);
            Mat4::orthographic_rh(min.x, max.x, min.y, max.y, near, -min.z)
        }
        ShadowFit::Fixed {
            half_extent,
            near,
            far,
        } => Mat4::orthographic_rh(
            -half_extent,
            half_extent,
            -half_extent,
            half_extent,
            near,
            far,
        ),
    }
}
