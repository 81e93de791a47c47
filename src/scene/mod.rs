// scene/mod.rs

pub mod bounds;
pub mod builder;
pub mod camera;
pub mod components;
mod internal;
pub mod node;
pub mod panel;
pub mod picking;
pub mod ray;
pub mod scene;
pub mod shadow;
pub mod transform;

// Re-export commonly used types
pub use bounds::Aabb;
pub use builder::NodeBuilder;
pub use camera::{Camera, CameraMode, MoveFlags, Projection};
pub use node::SceneNode;
pub use panel::InteractivePanel;
pub use picking::{intersect_triangle, CullingPolicy, Hit, HitPolicy, PickResult, Picker, TriangleHit};
pub use ray::Ray;
pub use scene::{FrameInput, Scene, SceneError};
pub use shadow::{frustum_bounds, CascadedShadow, ShadowSplit};
pub use transform::Transform;

// Re-export all components
pub use components::{Children, MeshComponent, Name, Parent, Pickable, SpawnOrder};
