// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::scene::{Camera, CascadedShadow, SceneNode};

/// Per-frame block: camera and shadow matrices.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, PartialEq, Debug)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub inverse_view_proj: [[f32; 4]; 4],
    pub shadow_space: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl FrameUniforms {
    pub fn new() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            inverse_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            shadow_space: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0, 0.0, 0.0],
            _padding: 0.0,
        }
    }

    pub fn from_camera(camera: &Camera, shadow: &CascadedShadow) -> Self {
        Self {
            view: camera.view_matrix().to_cols_array_2d(),
            projection: camera.projection_matrix().to_cols_array_2d(),
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            inverse_view_proj: camera.view_projection_inverse_matrix().to_cols_array_2d(),
            shadow_space: shadow.shadow_space_matrix().to_cols_array_2d(),
            camera_pos: camera.translation.to_array(),
            _padding: 0.0,
        }
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-node block: model, normal and texture matrices.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, PartialEq, Debug)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub model_inverse: [[f32; 4]; 4],
    // mat3x3<f32> columns padded to vec4 in uniform layout
    pub texture: [[f32; 4]; 3],
}

impl ObjectUniforms {
    pub fn from_node(node: &SceneNode) -> Self {
        let texture = node.transform.texture_matrix();
        Self {
            model: node.model_matrix().to_cols_array_2d(),
            normal: node.normal_matrix().to_cols_array_2d(),
            model_inverse: node.model_inverse_matrix().to_cols_array_2d(),
            texture: [
                texture.x_axis.extend(0.0).to_array(),
                texture.y_axis.extend(0.0).to_array(),
                texture.z_axis.extend(0.0).to_array(),
            ],
        }
    }
}

impl Default for ObjectUniforms {
    fn default() -> Self {
        Self::from_node(&SceneNode::default())
    }
}
