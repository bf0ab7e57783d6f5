//! Scene graph for the gameplay layer.
//!
//! The `Scene` owns every entity and the translation-only parent/child
//! hierarchy. It provides:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Hierarchy edits that keep world positions stable
//! - The downward circle cast used by ground probes ([`ShapeCast`])
//!
//! # Hierarchy
//!
//! Positions are stored in world space. [`Scene::translate`] moves an entity
//! and all of its descendants by the same delta, which is what "inheriting a
//! parent's motion" means in a translation-only hierarchy. Re-parenting never
//! moves anything.
//!
//! # Example
//!
//! ```
//! use skyhop_core::entity::EntityKind;
//! use skyhop_core::scene::Scene;
//! use glam::Vec2;
//!
//! let mut scene = Scene::new();
//! let platform = scene.spawn(EntityKind::Platform, Vec2::ZERO);
//! let player = scene.spawn(EntityKind::Player, Vec2::new(0.0, 1.0));
//!
//! scene.set_parent(player, Some(platform)).unwrap();
//! scene.translate(platform, Vec2::new(2.0, 0.0)).unwrap();
//! assert_eq!(scene.position(player), Some(Vec2::new(2.0, 1.0)));
//!
//! // Deactivating a platform returns its riders to the top level.
//! scene.deactivate(platform).unwrap();
//! assert_eq!(scene.get(player).unwrap().parent(), None);
//! ```

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collision::{sweep_circle_down, Aabb, CastHit, Layers, ShapeCast};
use crate::entity::{Entity, EntityId, EntityKind};
use crate::error::SceneError;

/// Container for all entities of a running level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawns a bare entity and returns its ID.
    pub fn spawn(&mut self, kind: EntityKind, position: Vec2) -> EntityId {
        self.spawn_with(kind, position, |entity| entity)
    }

    /// Spawns an entity, letting `build` attach a body or collider first.
    pub fn spawn_with(
        &mut self,
        kind: EntityKind,
        position: Vec2,
        build: impl FnOnce(Entity) -> Entity,
    ) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        let entity = build(Entity::new(id, kind, position));
        self.entities.insert(id, entity);
        id
    }

    /// Removes an entity. Its children return to the top level.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.release_children(id);
        if let Some(parent) = self.entities.get(&id).and_then(Entity::parent) {
            if let Some(parent) = self.entities.get_mut(&parent) {
                parent.remove_child_raw(id);
            }
        }
        self.entities.remove(&id)
    }

    /// Deactivates an entity. Its children return to the top level.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownEntity`] if `id` does not exist.
    pub fn deactivate(&mut self, id: EntityId) -> Result<(), SceneError> {
        self.require(id)?;
        self.release_children(id);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.set_active_raw(false);
        }
        debug!(entity = %id, "deactivated");
        Ok(())
    }

    /// Reactivates an entity.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownEntity`] if `id` does not exist.
    pub fn activate(&mut self, id: EntityId) -> Result<(), SceneError> {
        self.entity_mut(id)?.set_active_raw(true);
        Ok(())
    }

    fn release_children(&mut self, id: EntityId) {
        let children: Vec<EntityId> = match self.entities.get(&id) {
            Some(entity) => entity.children().collect(),
            None => return,
        };
        for child in children {
            if let Some(entity) = self.entities.get_mut(&child) {
                entity.set_parent_raw(None);
            }
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.remove_child_raw(child);
            }
            debug!(entity = %child, parent = %id, "returned to top level");
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Gets an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Gets an entity mutably. Position, scale and hierarchy stay behind the
    /// scene's own methods.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// World position of an entity.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.entities.get(&id).map(Entity::position)
    }

    /// Visual scale of an entity.
    #[must_use]
    pub fn scale(&self, id: EntityId) -> Option<Vec2> {
        self.entities.get(&id).map(Entity::scale)
    }

    /// World-space collision box of an entity, if it has a collider.
    #[must_use]
    pub fn aabb(&self, id: EntityId) -> Option<Aabb> {
        let entity = self.entities.get(&id)?;
        entity.collider.map(|c| c.aabb_at(entity.position()))
    }

    /// Whether the entity exists and is active.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.entities.get(&id).is_some_and(Entity::is_active)
    }

    /// Iterates entity IDs in ascending order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Iterates entities in ID order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Number of entities, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn require(&self, id: EntityId) -> Result<&Entity, SceneError> {
        self.entities.get(&id).ok_or(SceneError::UnknownEntity(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, SceneError> {
        self.entities
            .get_mut(&id)
            .ok_or(SceneError::UnknownEntity(id))
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Moves an entity and all of its descendants by `delta`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownEntity`] if `id` does not exist.
    pub fn translate(&mut self, id: EntityId, delta: Vec2) -> Result<(), SceneError> {
        self.require(id)?;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(entity) = self.entities.get_mut(&current) {
                entity.set_position_raw(entity.position() + delta);
                pending.extend(entity.children());
            }
        }
        Ok(())
    }

    /// Places an entity at `position`, carrying its descendants along.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownEntity`] if `id` does not exist.
    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> Result<(), SceneError> {
        let current = self.require(id)?.position();
        self.translate(id, position - current)?;
        self.entity_mut(id)?.set_position_raw(position);
        Ok(())
    }

    /// Sets the visual scale of one entity. Children are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownEntity`] if `id` does not exist.
    pub fn set_scale(&mut self, id: EntityId, scale: Vec2) -> Result<(), SceneError> {
        self.entity_mut(id)?.set_scale_raw(scale);
        Ok(())
    }

    /// Re-parents `child` under `parent` (or the top level for `None`),
    /// keeping its world position.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownEntity`] if either entity is missing and
    /// [`SceneError::ParentCycle`] if `parent` is `child` or one of its
    /// descendants.
    pub fn set_parent(
        &mut self,
        child: EntityId,
        parent: Option<EntityId>,
    ) -> Result<(), SceneError> {
        let old_parent = self.require(child)?.parent();
        if let Some(parent) = parent {
            self.require(parent)?;
            let mut cursor = Some(parent);
            while let Some(ancestor) = cursor {
                if ancestor == child {
                    return Err(SceneError::ParentCycle { child, parent });
                }
                cursor = self.entities.get(&ancestor).and_then(Entity::parent);
            }
        }
        if old_parent == parent {
            return Ok(());
        }

        if let Some(old) = old_parent.and_then(|old| self.entities.get_mut(&old)) {
            old.remove_child_raw(child);
        }
        if let Some(new) = parent.and_then(|new| self.entities.get_mut(&new)) {
            new.add_child_raw(child);
        }
        self.entity_mut(child)?.set_parent_raw(parent);
        Ok(())
    }
}

impl ShapeCast for Scene {
    fn circle_cast_down(
        &self,
        origin: Vec2,
        radius: f32,
        distance: f32,
        mask: Layers,
        ignore: Option<EntityId>,
    ) -> Option<CastHit> {
        let mut best: Option<CastHit> = None;
        for entity in self.entities.values() {
            if !entity.is_active() || Some(entity.id()) == ignore {
                continue;
            }
            let Some(collider) = entity.collider else {
                continue;
            };
            if collider.is_trigger || !collider.layer.intersects(mask) {
                continue;
            }
            let aabb = collider.aabb_at(entity.position());
            if let Some((travel, point, normal)) = sweep_circle_down(origin, radius, distance, &aabb)
            {
                if best.map_or(true, |hit| travel < hit.distance) {
                    best = Some(CastHit {
                        entity: entity.id(),
                        distance: travel,
                        point,
                        normal,
                    });
                }
            }
        }
        best
    }
}
