use crate::scene::components::{Children, Parent, SpawnOrder};
use crate::scene::node::SceneNode;
use hecs::{Entity, World};

/// Parent-first ordering of every scene node.
pub(crate) fn build_update_order(world: &World) -> Vec<Entity> {
    let mut roots: Vec<Entity> = world
        .query::<&SceneNode>()
        .without::<&Parent>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    roots.sort_by_key(|&entity| spawn_key(world, entity));

    log::trace!("Building update order from {} root nodes", roots.len());

    let mut order = Vec::new();
    let mut stack: Vec<Entity> = Vec::new();

    for root in roots {
        stack.push(root);

        while let Some(entity) = stack.pop() {
            if !world.satisfies::<&SceneNode>(entity).unwrap_or(false) {
                log::trace!("Entity {:?} has no SceneNode, skipping", entity);
                continue;
            }
            order.push(entity);

            if let Ok(children) = world.get::<&Children>(entity) {
                stack.extend(children.0.iter().rev().copied());
            }
        }
    }

    order
}

/// Sort key for roots: spawn sequence, then id for nodes spawned outside the
/// scene API.
pub(crate) fn spawn_key(world: &World, entity: Entity) -> (u64, u32) {
    let order = world
        .get::<&SpawnOrder>(entity)
        .map_or(u64::MAX, |order| order.0);
    (order, entity.id())
}

/// Recompute every node's matrices along `order`.
pub(crate) fn propagate_transforms(world: &mut World, order: &[Entity]) {
    for &entity in order {
        let parent_model = world
            .get::<&Parent>(entity)
            .ok()
            .and_then(|parent| world.get::<&SceneNode>(parent.0).ok())
            .map(|parent| parent.model_matrix());

        match world.get::<&mut SceneNode>(entity) {
            Ok(mut node) => {
                node.transform(parent_model.as_ref());
                log::trace!(
                    "Node {:?}: local T:{:?}, world T:{:?}",
                    entity,
                    node.transform.translation,
                    node.world_position()
                );
            }
            Err(e) => log::error!("Node {:?} in update order is gone: {:?}", entity, e),
        }
    }
}
