//! Moving platforms: a [`KinematicMover`] plus a carrying discipline.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{MovingPlatformConfig, PlatformTrapConfig};
use crate::entity::EntityId;
use crate::error::ConfigError;
use crate::events::{Effects, Event};
use crate::scene::Scene;

use super::carrier::{CarryMode, PassengerTable};
use super::mover::{KinematicMover, MoverPolicy, MoverStep};

/// A platform entity's behavior.
///
/// A platform without a mover was configured without endpoints; it never
/// moves, but still carries riders that land on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    mover: Option<KinematicMover>,
    carry: CarryMode,
}

fn endpoints(
    component: &'static str,
    name: &str,
    start: Option<Vec2>,
    end: Option<Vec2>,
) -> Result<(Vec2, Vec2), ConfigError> {
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        (None, _) => Err(ConfigError::MissingEndpoint {
            component,
            name: name.to_string(),
            endpoint: "start",
        }),
        (_, None) => Err(ConfigError::MissingEndpoint {
            component,
            name: name.to_string(),
            endpoint: "end",
        }),
    }
}

impl Platform {
    /// A continuously moving platform.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEndpoint`] if an endpoint is unset and
    /// [`ConfigError::InvalidValue`] for negative speeds or dwell times.
    pub fn moving(name: &str, config: &MovingPlatformConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (start, end) = endpoints("moving platform", name, config.start, config.end)?;
        let policy = if config.ping_pong {
            MoverPolicy::PingPong {
                looping: config.looping,
            }
        } else {
            MoverPolicy::Restart {
                looping: config.looping,
            }
        };
        Ok(Self {
            mover: Some(KinematicMover::new(
                start,
                end,
                config.speed,
                config.dwell,
                policy,
                false,
            )),
            carry: config.carry,
        })
    }

    /// A platform trap: alternates forever, or moves one leg per trigger.
    ///
    /// # Errors
    ///
    /// Same as [`Platform::moving`].
    pub fn trap(name: &str, config: &PlatformTrapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (start, end) = endpoints("platform trap", name, config.start, config.end)?;
        let policy = if config.always_moving {
            MoverPolicy::Alternate
        } else {
            MoverPolicy::Triggered
        };
        Ok(Self {
            mover: Some(KinematicMover::new(
                start,
                end,
                config.speed,
                config.dwell,
                policy,
                config.start_at_end,
            )),
            carry: config.carry,
        })
    }

    /// A platform that never moves.
    #[must_use]
    pub fn disabled(carry: CarryMode) -> Self {
        Self { mover: None, carry }
    }

    /// Whether the platform has a mover.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.mover.is_some()
    }

    /// Carrying discipline.
    #[must_use]
    pub fn carry_mode(&self) -> CarryMode {
        self.carry
    }

    /// The mover, if enabled.
    #[must_use]
    pub fn mover(&self) -> Option<&KinematicMover> {
        self.mover.as_ref()
    }

    /// Where the platform should start.
    #[must_use]
    pub fn initial_position(&self) -> Option<Vec2> {
        self.mover.as_ref().map(KinematicMover::initial_position)
    }

    /// Starts one leg of a triggered platform.
    pub fn start_once(&mut self) -> bool {
        self.mover.as_mut().is_some_and(KinematicMover::start_once)
    }

    /// Moves the platform `id` one fixed step and carries its riders.
    pub fn fixed_update(
        &mut self,
        dt: f32,
        scene: &mut Scene,
        passengers: &mut PassengerTable,
        fx: &mut Effects<'_>,
    ) {
        let id = fx.source();
        let Some(mover) = self.mover.as_mut() else {
            return;
        };
        let Some(position) = scene.position(id) else {
            return;
        };

        let step = mover.fixed_update(position, dt);
        let delta = step.delta();
        if delta != Vec2::ZERO && scene.translate(id, delta).is_ok() {
            passengers.propagate(scene, id, delta);
        }
        match step {
            MoverStep::Moved {
                to, arrived: true, ..
            } => fx.emit(Event::PlatformArrived { position: to }),
            MoverStep::Teleported { to, .. } => {
                debug!(entity = %id, ?to, "platform snapped back to start");
            }
            _ => {}
        }
    }

    /// A rider touched the platform.
    pub fn on_rider_entered(
        &mut self,
        rider: EntityId,
        scene: &mut Scene,
        passengers: &mut PassengerTable,
        fx: &mut Effects<'_>,
    ) {
        match passengers.attach(scene, rider, fx.source(), self.carry) {
            Ok(true) => fx.emit(Event::RiderAttached {
                rider,
                mode: self.carry,
            }),
            Ok(false) => {}
            Err(err) => debug!(entity = %fx.source(), %err, "rider not attached"),
        }
    }

    /// A rider stopped touching the platform.
    pub fn on_rider_left(
        &mut self,
        rider: EntityId,
        scene: &mut Scene,
        passengers: &mut PassengerTable,
        fx: &mut Effects<'_>,
    ) {
        if passengers.detach(scene, rider, fx.source()) {
            fx.emit(Event::RiderDetached { rider });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::events::EventLog;
    use crate::services::Services;

    const DT: f32 = 1.0 / 64.0;

    fn config() -> MovingPlatformConfig {
        MovingPlatformConfig {
            start: Some(Vec2::ZERO),
            end: Some(Vec2::new(2.0, 0.0)),
            speed: 4.0,
            ..MovingPlatformConfig::default()
        }
    }

    struct World {
        scene: Scene,
        passengers: PassengerTable,
        services: Services,
        log: EventLog,
    }

    impl World {
        fn new() -> Self {
            Self {
                scene: Scene::new(),
                passengers: PassengerTable::new(),
                services: Services::new(),
                log: EventLog::new(),
            }
        }

        fn step(&mut self, id: EntityId, platform: &mut Platform) {
            let mut fx = Effects::new(id, &self.services, &mut self.log);
            platform.fixed_update(DT, &mut self.scene, &mut self.passengers, &mut fx);
        }

        fn enter(&mut self, id: EntityId, platform: &mut Platform, rider: EntityId) {
            let mut fx = Effects::new(id, &self.services, &mut self.log);
            platform.on_rider_entered(rider, &mut self.scene, &mut self.passengers, &mut fx);
        }

        fn leave(&mut self, id: EntityId, platform: &mut Platform, rider: EntityId) {
            let mut fx = Effects::new(id, &self.services, &mut self.log);
            platform.on_rider_left(rider, &mut self.scene, &mut self.passengers, &mut fx);
        }
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn missing_endpoint_is_reported() {
            let config = MovingPlatformConfig {
                end: None,
                ..config()
            };
            let err = Platform::moving("lift", &config).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::MissingEndpoint { endpoint: "end", .. }
            ));
        }

        #[test]
        fn trap_maps_to_policies() {
            let trap = PlatformTrapConfig {
                start: Some(Vec2::ZERO),
                end: Some(Vec2::Y),
                always_moving: false,
                start_at_end: true,
                ..PlatformTrapConfig::default()
            };
            let platform = Platform::trap("gate", &trap).unwrap();
            let mover = platform.mover().unwrap();
            assert_eq!(mover.policy(), MoverPolicy::Triggered);
            assert_eq!(platform.initial_position(), Some(Vec2::Y));
            assert_eq!(platform.carry_mode(), CarryMode::Reparent);
        }

        #[test]
        fn disabled_platform_never_moves() {
            let mut world = World::new();
            let id = world.scene.spawn(EntityKind::Platform, Vec2::ONE);
            let mut platform = Platform::disabled(CarryMode::DeltaPropagation);
            for _ in 0..10 {
                world.step(id, &mut platform);
            }
            assert_eq!(world.scene.position(id), Some(Vec2::ONE));
            assert!(!platform.start_once());
        }
    }

    mod carry_tests {
        use super::*;

        fn carried_delta(carry: CarryMode) {
            let mut world = World::new();
            let id = world.scene.spawn(EntityKind::Platform, Vec2::ZERO);
            let rider = world.scene.spawn(EntityKind::Player, Vec2::new(0.0, 1.0));
            let mut platform = Platform::moving("lift", &MovingPlatformConfig { carry, ..config() })
                .unwrap();
            world.enter(id, &mut platform, rider);

            for _ in 0..40 {
                let platform_before = world.scene.position(id).unwrap();
                let rider_before = world.scene.position(rider).unwrap();
                world.step(id, &mut platform);
                let platform_delta = world.scene.position(id).unwrap() - platform_before;
                let rider_delta = world.scene.position(rider).unwrap() - rider_before;
                assert!((platform_delta - rider_delta).length() < 1e-5);
            }

            world.leave(id, &mut platform, rider);
            assert_eq!(world.scene.get(rider).unwrap().parent(), None);
            let parked = world.scene.position(rider);
            world.step(id, &mut platform);
            assert_eq!(world.scene.position(rider), parked);
        }

        #[test]
        fn delta_propagation_carries_riders() {
            carried_delta(CarryMode::DeltaPropagation);
        }

        #[test]
        fn reparenting_carries_riders() {
            carried_delta(CarryMode::Reparent);
        }

        #[test]
        fn arrival_is_reported() {
            let mut world = World::new();
            let id = world.scene.spawn(EntityKind::Platform, Vec2::ZERO);
            let mut platform = Platform::moving("lift", &config()).unwrap();
            for _ in 0..32 {
                world.step(id, &mut platform);
            }
            let arrivals: Vec<_> = world
                .log
                .take_events()
                .into_iter()
                .filter(|e| matches!(e.event, Event::PlatformArrived { .. }))
                .collect();
            assert_eq!(arrivals.len(), 1);
            assert_eq!(world.scene.position(id), Some(Vec2::new(2.0, 0.0)));
        }
    }
}
