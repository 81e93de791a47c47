// scene/scene.rs
use glam::Vec2;
use hecs::{Entity, World};
use std::collections::HashMap;
use thiserror::Error;

use super::bounds::Aabb;
use super::builder::NodeBuilder;
use super::camera::{Camera, MoveFlags};
use super::components::*;
use super::internal::transforms::{build_update_order, propagate_transforms, spawn_key};
use super::node::SceneNode;
use super::shadow::CascadedShadow;
use crate::asset::{Assets, Handle, MeshData};
use crate::scene::Transform;
use crate::settings::SceneSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("entity {0:?} is not a scene node")]
    NoSuchNode(Entity),
    #[error("mesh {0:?} is not in the asset cache")]
    MissingMesh(Handle<MeshData>),
}

/// Input gathered by the host for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub move_flags: MoveFlags,
    pub look_delta: Vec2,
    pub delta_time: f32,
}

/// Node arena plus the camera and shadow state driven by [`Scene::update`].
///
/// `world` is open for queries and extra components. Nodes should be spawned
/// and despawned through [`Scene::spawn`] and [`Scene::despawn`]; nodes
/// added directly are picked up by the next update but sort after every
/// node spawned through the scene.
pub struct Scene {
    pub world: World,
    pub assets: Assets,
    camera: Camera,
    shadow: CascadedShadow,
    update_order: Vec<Entity>,
    hierarchy_dirty: bool,
    next_spawn: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_settings(&SceneSettings::default())
    }

    pub fn with_settings(settings: &SceneSettings) -> Self {
        Self {
            world: World::new(),
            assets: Assets::default(),
            camera: Camera::new(&settings.camera),
            shadow: CascadedShadow::new(&settings.shadow),
            update_order: Vec::new(),
            hierarchy_dirty: false,
            next_spawn: 0,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn shadow(&self) -> &CascadedShadow {
        &self.shadow
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> Handle<MeshData> {
        self.assets.meshes.insert(mesh)
    }

    /// Start building a node. Nothing is spawned until [`NodeBuilder::spawn`].
    pub fn spawn(&mut self) -> NodeBuilder<'_> {
        NodeBuilder::new(self)
    }

    pub(crate) fn insert_node(
        &mut self,
        builder: &mut hecs::EntityBuilder,
        parent: Option<Entity>,
    ) -> Result<Entity, SceneError> {
        if let Some(parent) = parent {
            self.ensure_node(parent)?;
            builder.add(Parent(parent));
        }
        builder.add(SpawnOrder(self.next_spawn));
        self.next_spawn += 1;

        let entity = self.world.spawn(builder.build());
        if let Some(parent) = parent {
            let linked = self
                .world
                .get::<&mut Children>(parent)
                .map(|mut children| children.0.push(entity))
                .is_ok();
            if !linked {
                self.world.insert_one(parent, Children(vec![entity])).ok();
            }
        }

        log::debug!("Spawned node {:?} under {:?}", entity, parent);
        self.hierarchy_dirty = true;
        Ok(entity)
    }

    fn ensure_node(&self, entity: Entity) -> Result<(), SceneError> {
        match self.world.satisfies::<&SceneNode>(entity) {
            Ok(true) => Ok(()),
            _ => Err(SceneError::NoSuchNode(entity)),
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.ensure_node(entity).is_ok()
    }

    pub fn node_count(&self) -> usize {
        self.world.query::<&SceneNode>().iter().count()
    }

    /// Snapshot of a node and its derived matrices.
    pub fn node(&self, entity: Entity) -> Result<SceneNode, SceneError> {
        self.world
            .get::<&SceneNode>(entity)
            .map(|node| *node)
            .map_err(|_| SceneError::NoSuchNode(entity))
    }

    /// Replace a node's local transform. Matrices follow on the next update.
    pub fn set_transform(&mut self, entity: Entity, transform: Transform) -> Result<(), SceneError> {
        let mut node = self
            .world
            .get::<&mut SceneNode>(entity)
            .map_err(|_| SceneError::NoSuchNode(entity))?;
        node.transform = transform;
        Ok(())
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&Parent>(entity).ok().map(|parent| parent.0)
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.world
            .get::<&Children>(entity)
            .map(|children| children.0.clone())
            .unwrap_or_default()
    }

    pub fn name(&self, entity: Entity) -> Option<String> {
        self.world.get::<&Name>(entity).ok().map(|name| name.0.clone())
    }

    /// First root node carrying `name`, in spawn order. Children are not searched.
    pub fn find_root_by_name(&self, name: &str) -> Option<Entity> {
        let mut matches: Vec<Entity> = self
            .world
            .query::<(&Name, &SceneNode)>()
            .without::<&Parent>()
            .iter()
            .filter(|(_, (node_name, _))| node_name.0 == name)
            .map(|(entity, _)| entity)
            .collect();
        matches.sort_by_key(|&entity| spawn_key(&self.world, entity));
        matches.first().copied()
    }

    /// Node and all its descendants, parent first.
    pub fn subtree(&self, root: Entity) -> Result<Vec<Entity>, SceneError> {
        self.ensure_node(root)?;
        let mut nodes = Vec::new();
        let mut stack = vec![root];
        while let Some(entity) = stack.pop() {
            nodes.push(entity);
            if let Ok(children) = self.world.get::<&Children>(entity) {
                stack.extend(children.0.iter().rev().copied());
            }
        }
        Ok(nodes)
    }

    /// Remove a node together with its subtree. Returns the number of nodes removed.
    pub fn despawn(&mut self, root: Entity) -> Result<usize, SceneError> {
        let nodes = self.subtree(root)?;

        if let Some(parent) = self.parent(root) {
            if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
                children.0.retain(|&child| child != root);
            }
        }
        for &entity in &nodes {
            if let Err(e) = self.world.despawn(entity) {
                log::error!("Failed to despawn node {:?}: {:?}", entity, e);
            }
        }

        log::debug!("Despawned {} nodes under {:?}", nodes.len(), root);
        self.hierarchy_dirty = true;
        Ok(nodes.len())
    }

    /// Copy a subtree, attaching the copy under `parent` (or as a new root).
    /// Mesh handles are shared with the source nodes.
    pub fn clone_subtree(
        &mut self,
        root: Entity,
        parent: Option<Entity>,
    ) -> Result<Entity, SceneError> {
        self.ensure_node(root)?;
        if let Some(parent) = parent {
            self.ensure_node(parent)?;
        }

        // Snapshot first: the copy may land inside the source subtree.
        let sources = self.subtree(root)?;
        let mut copies: HashMap<Entity, Entity> = HashMap::with_capacity(sources.len());

        for source in sources {
            let new_parent = if source == root {
                parent
            } else {
                self.parent(source).and_then(|p| copies.get(&p).copied())
            };

            let mut builder = hecs::EntityBuilder::new();
            builder.add(SceneNode::new(self.node(source)?.transform));
            if let Ok(name) = self.world.get::<&Name>(source) {
                builder.add((*name).clone());
            }
            if let Ok(mesh) = self.world.get::<&MeshComponent>(source) {
                builder.add(*mesh);
            }
            if let Ok(pickable) = self.world.get::<&Pickable>(source) {
                builder.add(*pickable);
            }

            let copy = self.insert_node(&mut builder, new_parent)?;
            copies.insert(source, copy);
        }

        log::debug!("Cloned {} nodes from {:?}", copies.len(), root);
        copies.get(&root).copied().ok_or(SceneError::NoSuchNode(root))
    }

    /// Parent-first node order, rebuilt after hierarchy changes.
    pub fn update_order(&mut self) -> &[Entity] {
        let stale = self.update_order.len() != self.node_count();
        if self.hierarchy_dirty || stale {
            self.update_order = build_update_order(&self.world);
            self.hierarchy_dirty = false;
        }
        &self.update_order
    }

    /// Recompute every node's matrices, parents before children.
    pub fn update_transforms(&mut self) {
        self.update_order();
        propagate_transforms(&mut self.world, &self.update_order);
    }

    /// One frame of the update chain: camera input and integration, node
    /// transforms, then the shadow cascades from the settled camera.
    pub fn update(&mut self, input: &FrameInput) {
        self.camera
            .control(input.move_flags, input.look_delta, input.delta_time);
        self.camera.update(false);
        self.update_transforms();
        self.shadow.update(&self.camera);
    }

    /// World-space bounds of a node's mesh under its current model matrix.
    pub fn world_bounds(&self, entity: Entity) -> Option<Aabb> {
        let mesh = self.world.get::<&MeshComponent>(entity).ok()?.0;
        let node = self.world.get::<&SceneNode>(entity).ok()?;
        let bounds = self.assets.meshes.get(mesh)?.bounds()?;
        Some(bounds.transformed(&node.model_matrix()))
    }
}
