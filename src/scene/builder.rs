// scene/builder.rs
// Fluent helper for spawning scene nodes

use hecs::Entity;

use super::components::*;
use super::node::SceneNode;
use super::picking::CullingPolicy;
use super::scene::{Scene, SceneError};
use crate::asset::{Handle, MeshData};
use crate::scene::Transform;

/// Builds one scene node. Obtained from [`Scene::spawn`].
pub struct NodeBuilder<'s> {
    scene: &'s mut Scene,
    builder: hecs::EntityBuilder,
    transform: Transform,
    mesh: Option<Handle<MeshData>>,
    parent: Option<Entity>,
}

impl<'s> NodeBuilder<'s> {
    pub(crate) fn new(scene: &'s mut Scene) -> Self {
        Self {
            scene,
            builder: hecs::EntityBuilder::new(),
            transform: Transform::IDENTITY,
            mesh: None,
            parent: None,
        }
    }

    /// Add a name component
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.builder.add(Name::new(name));
        self
    }

    /// Local transform relative to the parent
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Add a mesh component
    pub fn with_mesh(mut self, mesh: Handle<MeshData>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Make the node selectable by the picker
    pub fn pickable(mut self, culling: CullingPolicy) -> Self {
        self.builder.add(Pickable(culling));
        self
    }

    /// Attach under an existing node
    pub fn child_of(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Spawn the node into the scene
    pub fn spawn(mut self) -> Result<Entity, SceneError> {
        if let Some(mesh) = self.mesh {
            if !self.scene.assets.meshes.contains(mesh) {
                return Err(SceneError::MissingMesh(mesh));
            }
            self.builder.add(MeshComponent(mesh));
        }
        self.builder.add(SceneNode::new(self.transform));
        self.scene.insert_node(&mut self.builder, self.parent)
    }
}
