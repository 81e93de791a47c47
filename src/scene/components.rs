// scene/components.rs
// hecs components attached to scene nodes

use crate::asset::{Handle, MeshData};
use crate::scene::picking::CullingPolicy;

/// Triangle mesh drawn and picked for this node.
#[derive(Debug, Clone, Copy)]
pub struct MeshComponent(pub Handle<MeshData>);

/// Marks a node as selectable; the policy decides which facing counts.
#[derive(Debug, Clone, Copy)]
pub struct Pickable(pub CullingPolicy);

/// Name component for lookup and debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Parent node; fixed when the node is spawned.
#[derive(Debug, Clone, Copy)]
pub struct Parent(pub hecs::Entity);

/// Children in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Children(pub Vec<hecs::Entity>);

/// Position in the scene's spawn sequence. Entity ids are recycled, this is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpawnOrder(pub u64);
