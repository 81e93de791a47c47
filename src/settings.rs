use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::scene::shadow::stable_light_up;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSettings {
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub shadow: ShadowSettings,
}

impl SceneSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {:?} ({}). Falling back to default scene settings.",
                    path, err
                );
                SceneSettings::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Scene settings file {:?} not found. Using default settings.",
                    path
                );
                SceneSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default scene settings.",
                    path, err
                );
                SceneSettings::default()
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let settings = serde_json::from_str::<SceneSettings>(contents)?;
        Ok(settings.validate())
    }

    fn validate(mut self) -> Self {
        self.camera = self.camera.validate();
        self.shadow = self.shadow.validate();
        self
    }
}

/// Projection and free-fly tuning for the camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "CameraSettings::default_fov_y_degrees")]
    pub fov_y_degrees: f32,
    #[serde(default = "CameraSettings::default_z_near")]
    pub z_near: f32,
    #[serde(default = "CameraSettings::default_z_far")]
    pub z_far: f32,
    /// Units per second added to the translation velocity per held key.
    #[serde(default = "CameraSettings::default_move_speed")]
    pub move_speed: f32,
    #[serde(default = "CameraSettings::default_translation_damping")]
    pub translation_damping: f32,
    #[serde(default = "CameraSettings::default_rotation_damping")]
    pub rotation_damping: f32,
    /// Velocities at or below this length snap to zero.
    #[serde(default = "CameraSettings::default_settle_epsilon")]
    pub settle_epsilon: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: Self::default_fov_y_degrees(),
            z_near: Self::default_z_near(),
            z_far: Self::default_z_far(),
            move_speed: Self::default_move_speed(),
            translation_damping: Self::default_translation_damping(),
            rotation_damping: Self::default_rotation_damping(),
            settle_epsilon: Self::default_settle_epsilon(),
        }
    }
}

impl CameraSettings {
    pub fn fov_y_radians(&self) -> f32 {
        self.fov_y_degrees.to_radians()
    }

    fn validate(mut self) -> Self {
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            warn!(
                "Camera FOV {} is outside (0, 180) degrees. Using default.",
                self.fov_y_degrees
            );
            self.fov_y_degrees = Self::default_fov_y_degrees();
        }

        if !(self.z_near > 0.0 && self.z_far > self.z_near) {
            warn!(
                "Camera clip range [{}, {}] is invalid. Using default range.",
                self.z_near, self.z_far
            );
            self.z_near = Self::default_z_near();
            self.z_far = Self::default_z_far();
        }

        if !(0.0..1.0).contains(&self.translation_damping) {
            warn!("Translation damping must be in [0, 1). Using default value.");
            self.translation_damping = Self::default_translation_damping();
        }

        if !(0.0..1.0).contains(&self.rotation_damping) {
            warn!("Rotation damping must be in [0, 1). Using default value.");
            self.rotation_damping = Self::default_rotation_damping();
        }

        if self.settle_epsilon < 0.0 {
            warn!("Settle epsilon must not be negative. Using default value.");
            self.settle_epsilon = Self::default_settle_epsilon();
        }

        self
    }

    const fn default_fov_y_degrees() -> f32 {
        45.0
    }

    const fn default_z_near() -> f32 {
        0.1
    }

    const fn default_z_far() -> f32 {
        2048.0
    }

    const fn default_move_speed() -> f32 {
        4.0
    }

    const fn default_translation_damping() -> f32 {
        0.75
    }

    const fn default_rotation_damping() -> f32 {
        0.6125
    }

    const fn default_settle_epsilon() -> f32 {
        1e-4
    }
}

/// Near/far multipliers of one cascade, applied to the camera clip planes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitFractions {
    pub near: f32,
    pub far: f32,
}

impl SplitFractions {
    pub const fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }
}

pub const DEFAULT_CASCADE_FRACTIONS: [SplitFractions; 6] = [
    SplitFractions::new(-0.005, 0.005),
    SplitFractions::new(-0.005, 0.01),
    SplitFractions::new(0.0, 0.02),
    SplitFractions::new(0.01, 0.04),
    SplitFractions::new(0.02, 0.06),
    SplitFractions::new(0.05, 0.16),
];

/// How each cascade's orthographic box is sized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ShadowFit {
    /// Fit the box to the cascade's light-space corners, grown by `padding`.
    Bounds { padding: f32 },
    /// Constant box around the light, identical for every cascade.
    Fixed { half_extent: f32, near: f32, far: f32 },
}

impl Default for ShadowFit {
    fn default() -> Self {
        ShadowFit::Bounds { padding: 10.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowSettings {
    #[serde(default = "ShadowSettings::default_cascades")]
    pub cascades: Vec<SplitFractions>,
    #[serde(default)]
    pub fit: ShadowFit,
    #[serde(default = "ShadowSettings::default_light_position")]
    pub light_position: [f32; 3],
    #[serde(default = "ShadowSettings::default_light_target")]
    pub light_target: [f32; 3],
    #[serde(default = "ShadowSettings::default_light_up")]
    pub light_up: [f32; 3],
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            cascades: Self::default_cascades(),
            fit: ShadowFit::default(),
            light_position: Self::default_light_position(),
            light_target: Self::default_light_target(),
            light_up: Self::default_light_up(),
        }
    }
}

impl ShadowSettings {
    fn validate(mut self) -> Self {
        if self.cascades.is_empty() {
            warn!("Shadow cascade table is empty. Using default cascades.");
            self.cascades = Self::default_cascades();
        }

        let monotonic = self
            .cascades
            .windows(2)
            .all(|pair| pair[0].far <= pair[1].far);
        let ordered = self.cascades.iter().all(|split| split.near < split.far);
        if !monotonic || !ordered {
            warn!("Shadow cascade fractions must grow toward the far plane. Using default cascades.");
            self.cascades = Self::default_cascades();
        }

        match self.fit {
            ShadowFit::Bounds { padding } if padding < 0.0 => {
                warn!("Shadow fit padding must not be negative. Using default fit.");
                self.fit = ShadowFit::default();
            }
            ShadowFit::Fixed {
                half_extent,
                near,
                far,
            } if half_extent <= 0.0 || far <= near => {
                warn!("Fixed shadow extent is degenerate. Using default fit.");
                self.fit = ShadowFit::default();
            }
            _ => {}
        }

        let direction = glam::Vec3::from(self.light_target) - glam::Vec3::from(self.light_position);
        if direction.length_squared() < 1e-6 {
            warn!("Light position and target coincide. Using default light placement.");
            self.light_position = Self::default_light_position();
            self.light_target = Self::default_light_target();
        }

        let direction = (glam::Vec3::from(self.light_target) - glam::Vec3::from(self.light_position))
            .normalize();
        let up = glam::Vec3::from(self.light_up);
        let stable_up = stable_light_up(direction, up);
        if stable_up != up.normalize_or_zero() {
            warn!(
                "Light up vector {:?} is parallel to the light direction. Using {:?}.",
                self.light_up, stable_up
            );
            self.light_up = stable_up.to_array();
        }

        self
    }

    fn default_cascades() -> Vec<SplitFractions> {
        DEFAULT_CASCADE_FRACTIONS.to_vec()
    }

    const fn default_light_position() -> [f32; 3] {
        [20.0, 80.0, 60.0]
    }

    const fn default_light_target() -> [f32; 3] {
        [0.0, 1.0, 0.0]
    }

    const fn default_light_up() -> [f32; 3] {
        [0.0, 1.0, 0.0]
    }
}
