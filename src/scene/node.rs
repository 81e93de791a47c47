use glam::{Mat3, Mat4};

use super::transform::Transform;

/// A transform with its derived world matrices.
///
/// The cached matrices are identity until [`SceneNode::transform`] runs and
/// are recomputed from scratch on every call.
#[derive(Clone, Copy, Debug)]
pub struct SceneNode {
    pub transform: Transform,
    model: Mat4,
    normal: Mat4,
    model_inverse: Mat4,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new(Transform::IDENTITY)
    }
}

impl SceneNode {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            model: Mat4::IDENTITY,
            normal: Mat4::IDENTITY,
            model_inverse: Mat4::IDENTITY,
        }
    }

    /// Rebuild the model, inverse and normal matrices.
    ///
    /// `parent_model` must already be current for this frame; the scene walks
    /// its update list parent-first to guarantee that.
    ///
    /// # Panics
    /// When any scale component is zero, since the model matrix would be
    /// singular.
    pub fn transform(&mut self, parent_model: Option<&Mat4>) {
        assert!(
            !self.transform.has_degenerate_scale(),
            "scene node has zero scale {:?}",
            self.transform.scale
        );

        self.transform.rotation = self.transform.rotation.normalize();
        let local = self.transform.matrix();

        self.model = match parent_model {
            Some(parent) => *parent * local,
            None => local,
        };

        let determinant = self.model.determinant();
        assert!(
            determinant.is_finite() && determinant != 0.0,
            "scene node model matrix is singular"
        );

        self.model_inverse = self.model.inverse();
        self.normal = self.model_inverse.transpose();
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn normal_matrix(&self) -> Mat4 {
        self.normal
    }

    /// Upper 3x3 of the normal matrix, ready to apply to direction vectors.
    pub fn normal_matrix3(&self) -> Mat3 {
        Mat3::from_mat4(self.normal)
    }

    pub fn model_inverse_matrix(&self) -> Mat4 {
        self.model_inverse
    }

    pub fn world_position(&self) -> glam::Vec3 {
        self.model.w_axis.truncate()
    }
}
