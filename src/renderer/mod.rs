pub mod uniforms;

pub use uniforms::{FrameUniforms, ObjectUniforms};
