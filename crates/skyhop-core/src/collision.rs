//! Collision primitives: layers, boxes, the ground probe cast and contacts.
//!
//! The gameplay layer only needs three geometric questions answered:
//!
//! 1. Does a downward circle sweep from the player's feet hit walkable ground?
//!    ([`ShapeCast::circle_cast_down`])
//! 2. Do two colliders touch this step? ([`Aabb::overlaps`])
//! 3. Did a falling body pass through the top of a solid? (landing resolution
//!    in the simulation step)
//!
//! Everything else a full physics engine does is out of scope.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

bitflags! {
    /// Collision layers. Probes and filters select surfaces by mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Layers: u32 {
        /// Anything not otherwise classified.
        const DEFAULT = 1 << 0;
        /// Static walkable geometry.
        const GROUND = 1 << 1;
        /// The player character.
        const PLAYER = 1 << 2;
        /// Moving platforms.
        const PLATFORM = 1 << 3;
        /// Spikes, death floors and traps.
        const HAZARD = 1 << 4;
        /// Trigger volumes (zones, portals).
        const TRIGGER = 1 << 5;
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Layers {
    /// Surfaces a player can stand on by default.
    #[must_use]
    pub const fn walkable() -> Self {
        Self::GROUND.union(Self::PLATFORM)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Aabb {
    /// Box centered at `center` with the given half extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Y coordinate of the top face.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.max.y
    }

    /// Y coordinate of the bottom face.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.min.y
    }

    /// Whether the boxes overlap once both are inflated by `skin`.
    ///
    /// A positive skin makes resting contact (touching faces) count.
    #[must_use]
    pub fn overlaps(&self, other: &Self, skin: f32) -> bool {
        self.min.x - skin <= other.max.x
            && self.max.x + skin >= other.min.x
            && self.min.y - skin <= other.max.y
            && self.max.y + skin >= other.min.y
    }

    /// Closest point inside the box to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

/// Collision volume attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Half extents of the box.
    pub half_extents: Vec2,
    /// Offset of the box center from the entity position.
    #[serde(default)]
    pub offset: Vec2,
    /// Layer this collider lives on.
    #[serde(default)]
    pub layer: Layers,
    /// Trigger colliders report contacts but are never stood on.
    #[serde(default)]
    pub is_trigger: bool,
}

impl Collider {
    /// A solid collider.
    #[must_use]
    pub fn solid(half_extents: Vec2, layer: Layers) -> Self {
        Self {
            half_extents,
            offset: Vec2::ZERO,
            layer,
            is_trigger: false,
        }
    }

    /// A trigger-only collider.
    #[must_use]
    pub fn trigger(half_extents: Vec2, layer: Layers) -> Self {
        Self {
            half_extents,
            offset: Vec2::ZERO,
            layer,
            is_trigger: true,
        }
    }

    /// World-space box for an entity at `position`.
    #[must_use]
    pub fn aabb_at(&self, position: Vec2) -> Aabb {
        Aabb::from_center(position + self.offset, self.half_extents)
    }
}

/// Result of a shape cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// Entity owning the collider that was hit.
    pub entity: EntityId,
    /// Distance travelled before contact (zero when overlapping at the start).
    pub distance: f32,
    /// Contact point on the hit surface.
    pub point: Vec2,
    /// Unit surface normal at the contact.
    pub normal: Vec2,
}

/// Scene queries the ground probe depends on.
///
/// Implemented by [`Scene`](crate::scene::Scene); tests substitute scripted
/// implementations.
pub trait ShapeCast {
    /// Sweeps a circle of `radius` from `origin` straight down by `distance`
    /// and returns the nearest non-trigger collider on `mask`, ignoring
    /// `ignore`.
    fn circle_cast_down(
        &self,
        origin: Vec2,
        radius: f32,
        distance: f32,
        mask: Layers,
        ignore: Option<EntityId>,
    ) -> Option<CastHit>;
}

/// Sweeps a circle downward against a single box.
///
/// Returns `(distance, point, normal)`. A circle overlapping the box at the
/// start reports distance zero with an upward normal.
#[must_use]
pub fn sweep_circle_down(
    origin: Vec2,
    radius: f32,
    distance: f32,
    aabb: &Aabb,
) -> Option<(f32, Vec2, Vec2)> {
    let radius = radius.max(0.0);
    let closest = aabb.closest_point(origin);
    if origin.distance_squared(closest) <= radius * radius {
        return Some((0.0, closest, Vec2::Y));
    }

    // Only the top face or its corners can be reached by a downward sweep.
    if origin.y <= aabb.top() {
        return None;
    }
    let dx = origin.x - closest.x;
    if dx.abs() > radius {
        return None;
    }
    let rise = (radius * radius - dx * dx).sqrt();
    let travel = origin.y - rise - aabb.top();
    if travel < 0.0 || travel > distance {
        return None;
    }
    let point = Vec2::new(closest.x, aabb.top());
    let normal = if radius > 0.0 {
        Vec2::new(dx, rise) / radius
    } else {
        Vec2::Y
    };
    Some((travel, point, normal))
}

/// How two colliders met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    /// At least one side is a trigger volume.
    Trigger,
    /// Both sides are solid.
    Collision,
}

impl ContactKind {
    /// Classifies a contact from the trigger flags of both colliders.
    #[must_use]
    pub const fn between(a: &Collider, b: &Collider) -> Self {
        if a.is_trigger || b.is_trigger {
            Self::Trigger
        } else {
            Self::Collision
        }
    }
}

/// A contact edge between a rider and another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contact {
    /// The rider started touching `other` this step.
    Began {
        /// The qualifying entity (player).
        rider: EntityId,
        /// The entity it touched.
        other: EntityId,
        /// Trigger or solid contact.
        kind: ContactKind,
    },
    /// The rider stopped touching `other` this step.
    Ended {
        /// The qualifying entity (player).
        rider: EntityId,
        /// The entity it left.
        other: EntityId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    mod layer_tests {
        use super::*;

        #[test]
        fn walkable_covers_ground_and_platforms() {
            let walkable = Layers::walkable();
            assert!(walkable.contains(Layers::GROUND));
            assert!(walkable.contains(Layers::PLATFORM));
            assert!(!walkable.intersects(Layers::PLAYER));
        }

        #[test]
        fn layers_round_trip_through_json() {
            let layers = Layers::GROUND | Layers::HAZARD;
            let json = serde_json::to_string(&layers).unwrap();
            let parsed: Layers = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, layers);
        }
    }

    mod aabb_tests {
        use super::*;

        #[test]
        fn touching_boxes_overlap_only_with_skin() {
            let a = Aabb::from_center(Vec2::ZERO, Vec2::ONE);
            let b = Aabb::from_center(Vec2::new(0.0, 2.01), Vec2::ONE);
            assert!(!a.overlaps(&b, 0.0));
            assert!(a.overlaps(&b, 0.02));
        }

        #[test]
        fn negative_half_extents_are_normalized() {
            let a = Aabb::from_center(Vec2::ZERO, Vec2::new(-1.0, -2.0));
            assert_eq!(a.min, Vec2::new(-1.0, -2.0));
            assert_eq!(a.max, Vec2::new(1.0, 2.0));
            assert_eq!(a.center(), Vec2::ZERO);
        }

        #[test]
        fn collider_offset_moves_box() {
            let mut collider = Collider::solid(Vec2::ONE, Layers::GROUND);
            collider.offset = Vec2::new(0.0, 1.0);
            let aabb = collider.aabb_at(Vec2::new(2.0, 0.0));
            assert_eq!(aabb.center(), Vec2::new(2.0, 1.0));
        }
    }

    mod sweep_tests {
        use super::*;

        fn floor() -> Aabb {
            Aabb::from_center(Vec2::new(0.0, -0.5), Vec2::new(5.0, 0.5))
        }

        #[test]
        fn hits_flat_ground_within_range() {
            let (distance, point, normal) =
                sweep_circle_down(Vec2::new(0.0, 0.3), 0.2, 0.15, &floor()).unwrap();
            assert!((distance - 0.1).abs() < 1e-5);
            assert_eq!(point, Vec2::new(0.0, 0.0));
            assert_eq!(normal, Vec2::Y);
        }

        #[test]
        fn misses_ground_out_of_range() {
            assert!(sweep_circle_down(Vec2::new(0.0, 1.0), 0.2, 0.15, &floor()).is_none());
        }

        #[test]
        fn overlap_at_start_reports_zero_distance() {
            let (distance, _, normal) =
                sweep_circle_down(Vec2::new(0.0, 0.1), 0.2, 0.15, &floor()).unwrap();
            assert_eq!(distance, 0.0);
            assert_eq!(normal, Vec2::Y);
        }

        #[test]
        fn corner_graze_tilts_normal() {
            // Circle center just past the right edge of the floor.
            let origin = Vec2::new(5.19, 0.3);
            let (_, _, normal) = sweep_circle_down(origin, 0.2, 0.5, &floor()).unwrap();
            assert!(normal.y < 0.5, "normal {normal:?} should be steep");
            assert!((normal.length() - 1.0).abs() < 1e-4);
        }

        #[test]
        fn boxes_beside_the_path_are_missed() {
            assert!(sweep_circle_down(Vec2::new(6.0, 0.3), 0.2, 1.0, &floor()).is_none());
        }

        #[test]
        fn boxes_above_the_origin_are_missed() {
            let ceiling = Aabb::from_center(Vec2::new(0.0, 3.0), Vec2::new(5.0, 0.5));
            assert!(sweep_circle_down(Vec2::ZERO, 0.2, 10.0, &ceiling).is_none());
        }
    }

    mod contact_tests {
        use super::*;

        #[test]
        fn any_trigger_makes_a_trigger_contact() {
            let solid = Collider::solid(Vec2::ONE, Layers::GROUND);
            let trigger = Collider::trigger(Vec2::ONE, Layers::TRIGGER);
            assert_eq!(ContactKind::between(&solid, &trigger), ContactKind::Trigger);
            assert_eq!(ContactKind::between(&trigger, &solid), ContactKind::Trigger);
            assert_eq!(ContactKind::between(&solid, &solid), ContactKind::Collision);
        }
    }
}
