//! Rider bookkeeping for moving platforms.
//!
//! The [`PassengerTable`] maps each rider to the single platform carrying it.
//! Two carrying disciplines sit behind the same attach/detach/propagate
//! interface:
//!
//! - [`CarryMode::DeltaPropagation`]: the platform's per-step delta is added
//!   to the rider's position by [`PassengerTable::propagate`]
//! - [`CarryMode::Reparent`]: the rider becomes a scene child of the platform
//!   and moves with it through [`Scene::translate`]
//!
//! Either way a rider moves by exactly the platform's delta, is never carried
//! by two platforms at once, and is returned to the top level on detach.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::{Entity, EntityId};
use crate::error::SceneError;
use crate::scene::Scene;

/// How a platform carries its riders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryMode {
    /// Add the platform delta to each rider's position.
    #[default]
    DeltaPropagation,
    /// Parent the rider to the platform in the scene hierarchy.
    Reparent,
}

/// A rider's current carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ride {
    /// Carrying platform.
    pub platform: EntityId,
    /// Discipline in use.
    pub mode: CarryMode,
}

/// Rider to platform lookup.
///
/// # Example
///
/// ```
/// use skyhop_core::entity::EntityKind;
/// use skyhop_core::motion::{CarryMode, PassengerTable};
/// use skyhop_core::scene::Scene;
/// use glam::Vec2;
///
/// let mut scene = Scene::new();
/// let platform = scene.spawn(EntityKind::Platform, Vec2::ZERO);
/// let rider = scene.spawn(EntityKind::Player, Vec2::Y);
///
/// let mut passengers = PassengerTable::new();
/// passengers.attach(&mut scene, rider, platform, CarryMode::DeltaPropagation).unwrap();
///
/// scene.translate(platform, Vec2::X).unwrap();
/// passengers.propagate(&mut scene, platform, Vec2::X);
/// assert_eq!(scene.position(rider), Some(Vec2::new(1.0, 1.0)));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassengerTable {
    rides: BTreeMap<EntityId, Ride>,
}

impl PassengerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The ride `rider` is on, if any.
    #[must_use]
    pub fn ride_of(&self, rider: EntityId) -> Option<Ride> {
        self.rides.get(&rider).copied()
    }

    /// Riders carried by `platform`, in ID order.
    pub fn riders_of(&self, platform: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.rides
            .iter()
            .filter(move |(_, ride)| ride.platform == platform)
            .map(|(rider, _)| *rider)
    }

    /// Number of riders being carried.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rides.len()
    }

    /// Whether nobody is being carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rides.is_empty()
    }

    /// Attaches `rider` to `platform`, leaving any other platform first.
    ///
    /// Returns `Ok(false)` if the rider was already on this platform.
    ///
    /// # Errors
    ///
    /// Returns a [`SceneError`] if either entity is missing or reparenting
    /// would create a cycle. A previous ride is released before reparenting,
    /// so a failed reparent leaves the rider unattached.
    pub fn attach(
        &mut self,
        scene: &mut Scene,
        rider: EntityId,
        platform: EntityId,
        mode: CarryMode,
    ) -> Result<bool, SceneError> {
        if self.rides.get(&rider).is_some_and(|ride| ride.platform == platform) {
            return Ok(false);
        }
        if scene.get(platform).is_none() {
            return Err(SceneError::UnknownEntity(platform));
        }
        self.release_rider(scene, rider);
        if mode == CarryMode::Reparent {
            scene.set_parent(rider, Some(platform))?;
        } else if scene.get(rider).is_none() {
            return Err(SceneError::UnknownEntity(rider));
        }
        self.rides.insert(rider, Ride { platform, mode });
        debug!(entity = %rider, platform = %platform, ?mode, "rider attached");
        Ok(true)
    }

    /// Detaches `rider` if (and only if) it rides `platform`.
    pub fn detach(&mut self, scene: &mut Scene, rider: EntityId, platform: EntityId) -> bool {
        match self.rides.get(&rider) {
            Some(ride) if ride.platform == platform => {
                self.release_rider(scene, rider);
                true
            }
            _ => false,
        }
    }

    /// Detaches `rider` from whatever carries it, returning the platform.
    pub fn release_rider(&mut self, scene: &mut Scene, rider: EntityId) -> Option<EntityId> {
        let ride = self.rides.remove(&rider)?;
        if ride.mode == CarryMode::Reparent
            && scene.get(rider).and_then(Entity::parent) == Some(ride.platform)
        {
            if let Err(err) = scene.set_parent(rider, None) {
                warn!(entity = %rider, %err, "failed to unparent rider");
            }
        }
        debug!(entity = %rider, platform = %ride.platform, "rider detached");
        Some(ride.platform)
    }

    /// Detaches every rider of `platform` (for example when it is disabled).
    pub fn release_platform(&mut self, scene: &mut Scene, platform: EntityId) -> Vec<EntityId> {
        let riders: Vec<EntityId> = self.riders_of(platform).collect();
        for rider in &riders {
            self.release_rider(scene, *rider);
        }
        riders
    }

    /// Moves every delta-propagated rider of `platform` by `delta`.
    ///
    /// Reparented riders already moved with the platform's own translation.
    /// Riders that no longer exist are forgotten.
    pub fn propagate(&mut self, scene: &mut Scene, platform: EntityId, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        self.rides.retain(|rider, ride| {
            if ride.platform != platform || ride.mode != CarryMode::DeltaPropagation {
                return true;
            }
            scene.translate(*rider, delta).is_ok()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    fn setup() -> (Scene, EntityId, EntityId, EntityId) {
        let mut scene = Scene::new();
        let a = scene.spawn(EntityKind::Platform, Vec2::ZERO);
        let b = scene.spawn(EntityKind::Platform, Vec2::new(5.0, 0.0));
        let rider = scene.spawn(EntityKind::Player, Vec2::new(0.0, 1.0));
        (scene, a, b, rider)
    }

    mod delta_tests {
        use super::*;

        #[test]
        fn rider_delta_matches_platform_delta() {
            let (mut scene, a, _, rider) = setup();
            let mut table = PassengerTable::new();
            table.attach(&mut scene, rider, a, CarryMode::DeltaPropagation).unwrap();

            let delta = Vec2::new(0.05, -0.02);
            let before = scene.position(rider).unwrap();
            scene.translate(a, delta).unwrap();
            table.propagate(&mut scene, a, delta);
            let moved = scene.position(rider).unwrap() - before;
            assert!((moved - delta).length() < 1e-6);
            assert_eq!(scene.get(rider).unwrap().parent(), None);
        }

        #[test]
        fn other_platforms_do_not_carry() {
            let (mut scene, a, b, rider) = setup();
            let mut table = PassengerTable::new();
            table.attach(&mut scene, rider, a, CarryMode::DeltaPropagation).unwrap();
            table.propagate(&mut scene, b, Vec2::X);
            assert_eq!(scene.position(rider), Some(Vec2::new(0.0, 1.0)));
        }

        #[test]
        fn vanished_riders_are_forgotten() {
            let (mut scene, a, _, rider) = setup();
            let mut table = PassengerTable::new();
            table.attach(&mut scene, rider, a, CarryMode::DeltaPropagation).unwrap();
            scene.despawn(rider);
            table.propagate(&mut scene, a, Vec2::X);
            assert!(table.is_empty());
        }
    }

    mod reparent_tests {
        use super::*;

        #[test]
        fn reparented_rider_follows_translation() {
            let (mut scene, a, _, rider) = setup();
            let mut table = PassengerTable::new();
            table.attach(&mut scene, rider, a, CarryMode::Reparent).unwrap();
            assert_eq!(scene.get(rider).unwrap().parent(), Some(a));

            scene.translate(a, Vec2::new(1.0, 0.5)).unwrap();
            table.propagate(&mut scene, a, Vec2::new(1.0, 0.5));
            assert_eq!(scene.position(rider), Some(Vec2::new(1.0, 1.5)));
        }

        #[test]
        fn detach_returns_rider_to_top_level() {
            let (mut scene, a, _, rider) = setup();
            let mut table = PassengerTable::new();
            table.attach(&mut scene, rider, a, CarryMode::Reparent).unwrap();
            assert!(table.detach(&mut scene, rider, a));
            assert_eq!(scene.get(rider).unwrap().parent(), None);
            assert!(table.ride_of(rider).is_none());
        }

        #[test]
        fn detach_from_wrong_platform_is_ignored() {
            let (mut scene, a, b, rider) = setup();
            let mut table = PassengerTable::new();
            table.attach(&mut scene, rider, a, CarryMode::Reparent).unwrap();
            assert!(!table.detach(&mut scene, rider, b));
            assert_eq!(scene.get(rider).unwrap().parent(), Some(a));
        }

        #[test]
        fn foreign_parent_is_left_alone() {
            // A rider re-parented elsewhere (e.g. into a portal) keeps that parent.
            let (mut scene, a, b, rider) = setup();
            let mut table = PassengerTable::new();
            table.attach(&mut scene, rider, a, CarryMode::Reparent).unwrap();
            scene.set_parent(rider, Some(b)).unwrap();
            assert!(table.detach(&mut scene, rider, a));
            assert_eq!(scene.get(rider).unwrap().parent(), Some(b));
        }
    }

    mod exclusivity_tests {
        use super::*;

        #[test]
        fn attaching_elsewhere_leaves_the_first_platform() {
            let (mut scene, a, b, rider) = setup();
            let mut table = PassengerTable::new();
            assert!(table.attach(&mut scene, rider, a, CarryMode::Reparent).unwrap());
            assert!(table.attach(&mut scene, rider, b, CarryMode::DeltaPropagation).unwrap());
            assert_eq!(scene.get(rider).unwrap().parent(), None);
            assert_eq!(table.ride_of(rider).map(|r| r.platform), Some(b));
            assert_eq!(table.riders_of(a).count(), 0);
        }

        #[test]
        fn repeated_attach_is_a_no_op() {
            let (mut scene, a, _, rider) = setup();
            let mut table = PassengerTable::new();
            assert!(table.attach(&mut scene, rider, a, CarryMode::Reparent).unwrap());
            assert!(!table.attach(&mut scene, rider, a, CarryMode::Reparent).unwrap());
            assert_eq!(table.len(), 1);
        }

        #[test]
        fn release_platform_frees_all_riders() {
            let (mut scene, a, _, rider) = setup();
            let other = scene.spawn(EntityKind::Player, Vec2::ZERO);
            let mut table = PassengerTable::new();
            table.attach(&mut scene, rider, a, CarryMode::Reparent).unwrap();
            table.attach(&mut scene, other, a, CarryMode::DeltaPropagation).unwrap();
            let released = table.release_platform(&mut scene, a);
            assert_eq!(released, vec![rider, other]);
            assert!(table.is_empty());
            assert_eq!(scene.get(rider).unwrap().parent(), None);
        }

        #[test]
        fn unknown_platform_is_an_error() {
            let (mut scene, _, _, rider) = setup();
            let mut table = PassengerTable::new();
            let missing = EntityId::new(77);
            assert_eq!(
                table.attach(&mut scene, rider, missing, CarryMode::DeltaPropagation),
                Err(SceneError::UnknownEntity(missing))
            );
            assert!(table.is_empty());
        }
    }
}
