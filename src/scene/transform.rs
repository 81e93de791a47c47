use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

/// Local pose of a scene node plus the texture-coordinate sub-transform
/// applied to its UVs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub texture_offset: Vec2,
    pub texture_scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        texture_offset: Vec2::ZERO,
        texture_scale: Vec2::ONE,
    };

    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self {
            translation: t,
            rotation: r,
            scale: s,
            ..Self::IDENTITY
        }
    }

    pub fn from_translation(t: Vec3) -> Self {
        Self {
            translation: t,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_texture(mut self, offset: Vec2, scale: Vec2) -> Self {
        self.texture_offset = offset;
        self.texture_scale = scale;
        self
    }

    /// `T * R * S` with the rotation renormalized first.
    pub fn matrix(&self) -> Mat4 {
        let rotation = self.rotation.normalize();
        Mat4::from_translation(self.translation)
            * Mat4::from_quat(rotation)
            * Mat4::from_scale(self.scale)
    }

    /// UV transform as a 2D affine matrix: scale, then offset.
    pub fn texture_matrix(&self) -> Mat3 {
        Mat3::from_translation(self.texture_offset) * Mat3::from_scale(self.texture_scale)
    }

    pub fn has_degenerate_scale(&self) -> bool {
        self.scale.cmpeq(Vec3::ZERO).any()
    }

    /// Rotate around a local axis, keeping the quaternion normalized.
    pub fn rotate_local(&mut self, axis: Vec3, angle: f32) {
        self.rotation = (self.rotation * Quat::from_axis_angle(axis.normalize(), angle)).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let m = Transform::default().matrix();
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        assert!(Transform::default()
            .texture_matrix()
            .abs_diff_eq(Mat3::IDENTITY, 1e-6));
    }

    #[test]
    fn translate_then_scale_ok() {
        let tr = Transform::from_trs(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::splat(2.0));
        let p = tr.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        // (1,0,0) -> (2,0,0) -> (3,2,3)
        assert!(p.abs_diff_eq(Vec3::new(3.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn unnormalized_rotation_does_not_scale() {
        let tr = Transform::IDENTITY.with_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 3.0));
        let p = tr.matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn texture_matrix_scales_before_offset() {
        let tr = Transform::IDENTITY.with_texture(Vec2::new(0.5, 0.25), Vec2::new(2.0, 4.0));
        let uv = tr.texture_matrix().transform_point2(Vec2::new(1.0, 1.0));
        assert!(uv.abs_diff_eq(Vec2::new(2.5, 4.25), 1e-6));
    }

    #[test]
    fn rotate_local_stays_normalized() {
        let mut tr = Transform::IDENTITY;
        for _ in 0..100 {
            tr.rotate_local(Vec3::new(1.0, 1.0, 0.0), 0.37);
        }
        assert!((tr.rotation.length() - 1.0).abs() < 1e-5);
    }
}
