//! Entity types for the gameplay layer.
//!
//! - [`EntityId`]: Unique identifier for entities
//! - [`EntityKind`]: Closed classification used by every collision filter
//! - [`Body`]: Velocity and kinematic/dynamic classification (see [`components`])
//! - [`Entity`]: The scene record (position, scale, hierarchy, body, collider)
//!
//! # Tag Contract
//!
//! Exactly one kind, [`EntityKind::Player`], qualifies for hazards, portals
//! and platform riding. Filters compare kinds instead of free-form strings,
//! so a misspelled tag cannot silently disable a trap.
//!
//! # Example
//!
//! ```
//! use skyhop_core::entity::{Entity, EntityId, EntityKind};
//! use glam::Vec2;
//!
//! let player = Entity::new(EntityId::new(7), EntityKind::Player, Vec2::new(1.0, 2.0));
//!
//! assert!(player.kind().is_rider());
//! assert_eq!(player.position(), Vec2::new(1.0, 2.0));
//! assert_eq!(player.scale(), Vec2::ONE);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::Collider;

pub mod components;

pub use components::{Body, BodyKind};

/// Unique identifier for an entity.
///
/// Ordered by numeric value; the scene iterates in this order, which makes
/// every per-step pass deterministic.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Closed classification of scene entities.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The player character; the only qualifying entity for hazards and riding.
    Player,
    /// A moving platform that may carry riders.
    Platform,
    /// Spikes, death floors and moving-box traps.
    Hazard,
    /// The end-of-level portal.
    Portal,
    /// Static level geometry.
    Solid,
    /// A trigger volume that forwards entry to another entity.
    Zone,
}

impl EntityKind {
    /// Whether this kind passes hazard, portal and carrier filters.
    #[must_use]
    pub const fn is_rider(self) -> bool {
        matches!(self, Self::Player)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Platform => write!(f, "Platform"),
            Self::Hazard => write!(f, "Hazard"),
            Self::Portal => write!(f, "Portal"),
            Self::Solid => write!(f, "Solid"),
            Self::Zone => write!(f, "Zone"),
        }
    }
}

/// A scene entity.
///
/// Positions are stored in world space. The hierarchy is translation-only:
/// moving a parent moves every descendant by the same delta (see
/// [`Scene::translate`](crate::scene::Scene::translate)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    position: Vec2,
    scale: Vec2,
    parent: Option<EntityId>,
    children: BTreeSet<EntityId>,
    /// Optional physics body.
    pub body: Option<Body>,
    /// Optional collision volume.
    pub collider: Option<Collider>,
    active: bool,
}

impl Entity {
    /// Creates an active, unparented entity with unit scale.
    #[must_use]
    pub fn new(id: EntityId, kind: EntityKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            scale: Vec2::ONE,
            parent: None,
            children: BTreeSet::new(),
            body: None,
            collider: None,
            active: true,
        }
    }

    /// Attaches a body.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Attaches a collider.
    #[must_use]
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    /// Returns this entity's ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns this entity's kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// World-space position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Visual scale. Never feeds back into collision.
    #[must_use]
    pub const fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Parent in the transform hierarchy, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Direct children in ID order.
    pub fn children(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.children.iter().copied()
    }

    /// Whether the entity takes part in stepping and collision.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_position_raw(&mut self, position: Vec2) {
        self.position = position;
    }

    pub(crate) fn set_scale_raw(&mut self, scale: Vec2) {
        self.scale = scale;
    }

    pub(crate) fn set_parent_raw(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    pub(crate) fn add_child_raw(&mut self, child: EntityId) {
        self.children.insert(child);
    }

    pub(crate) fn remove_child_raw(&mut self, child: EntityId) {
        self.children.remove(&child);
    }

    pub(crate) fn set_active_raw(&mut self, active: bool) {
        self.active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod entity_id_tests {
        use super::*;

        #[test]
        fn ordering_follows_raw_value() {
            assert!(EntityId::new(1) < EntityId::new(2));
            assert_eq!(EntityId::from(9).as_u64(), 9);
        }

        #[test]
        fn debug_and_display() {
            let id = EntityId::new(42);
            assert_eq!(format!("{id:?}"), "EntityId(42)");
            assert_eq!(format!("{id}"), "42");
        }
    }

    mod kind_tests {
        use super::*;

        #[test]
        fn only_player_rides() {
            assert!(EntityKind::Player.is_rider());
            for kind in [
                EntityKind::Platform,
                EntityKind::Hazard,
                EntityKind::Portal,
                EntityKind::Solid,
                EntityKind::Zone,
            ] {
                assert!(!kind.is_rider(), "{kind} should not ride");
            }
        }

        #[test]
        fn kinds_serialize_snake_case() {
            let json = serde_json::to_string(&EntityKind::Platform).unwrap();
            assert_eq!(json, "\"platform\"");
        }
    }

    mod entity_tests {
        use super::*;
        use crate::collision::{Collider, Layers};

        #[test]
        fn builder_attaches_parts() {
            let entity = Entity::new(EntityId::new(1), EntityKind::Solid, Vec2::ZERO)
                .with_body(Body::kinematic())
                .with_collider(Collider::solid(Vec2::ONE, Layers::GROUND));
            assert!(entity.body.is_some());
            assert!(entity.collider.is_some());
            assert!(entity.is_active());
            assert_eq!(entity.parent(), None);
            assert_eq!(entity.children().count(), 0);
        }
    }
}
