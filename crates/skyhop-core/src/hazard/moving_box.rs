//! Boxes that jump away and change size when touched.
//!
//! On a qualifying contact the box starts a constant-speed move by its
//! configured offset and multiplies its scale at once. With auto-return on,
//! every contact restarts a return timer; when it fires the box restores its
//! scale and travels back to where it started.
//!
//! Moves and the return timer run on scaled frame time.

use std::collections::BTreeSet;

use glam::Vec2;
use lilt::{Delay, FrameTime, Slot, Tween};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::MovingBoxConfig;
use crate::entity::EntityId;
use crate::error::ConfigError;
use crate::events::{Effects, Event};
use crate::scene::Scene;

use super::wait;

/// Return moves shorter than this snap home instead.
const RETURN_SNAP_DISTANCE_SQ: f32 = 1e-4;

/// What a contact does while a move is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetriggerPolicy {
    /// Keep the current move; the contact still scales the box.
    #[default]
    IgnoreWhileMoving,
    /// Cancel the current move and start a new one from where the box is.
    Restart,
}

/// A moving-box trap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingBox {
    config: MovingBoxConfig,
    home: Vec2,
    home_scale: Vec2,
    affected: BTreeSet<EntityId>,
    motion: Slot<Tween<Vec2>>,
    return_timer: Slot<Delay>,
}

impl MovingBox {
    /// A box resting at `position` with `scale`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative speeds or delays.
    pub fn new(config: MovingBoxConfig, position: Vec2, scale: Vec2) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            home: position,
            home_scale: scale,
            affected: BTreeSet::new(),
            motion: Slot::empty(),
            return_timer: Slot::empty(),
        })
    }

    /// Original position.
    #[must_use]
    pub fn home(&self) -> Vec2 {
        self.home
    }

    /// Whether a move is in flight.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.motion.is_active()
    }

    /// Whether a return is pending.
    #[must_use]
    pub fn return_pending(&self) -> bool {
        self.return_timer.is_active()
    }

    /// A qualifying entity touched the box. Returns whether it reacted.
    pub fn on_contact(
        &mut self,
        other: EntityId,
        scene: &mut Scene,
        fx: &mut Effects<'_>,
    ) -> bool {
        if self.config.affect_once_per_object && !self.affected.insert(other) {
            trace!(entity = %fx.source(), %other, "box already affected by entity");
            return false;
        }

        let displacement = self.config.offset * self.config.offset_multiplier;
        self.start_move(displacement, scene, fx);

        let id = fx.source();
        let scale = scene.scale(id).unwrap_or(self.home_scale) * self.config.scale_multiplier;
        if let Err(err) = scene.set_scale(id, scale) {
            warn!(entity = %id, %err, "box lost its entity");
        }

        if self.config.auto_return {
            self.return_timer.start(Delay::new(self.config.return_delay));
        }
        true
    }

    fn start_move(&mut self, displacement: Vec2, scene: &Scene, fx: &mut Effects<'_>) {
        if displacement.length_squared() <= 0.0 {
            return;
        }
        if self.motion.is_active() {
            match self.config.retrigger {
                RetriggerPolicy::IgnoreWhileMoving => return,
                RetriggerPolicy::Restart => {
                    self.motion.cancel();
                }
            }
        }
        let Some(from) = scene.position(fx.source()) else {
            return;
        };
        let target = from + displacement;
        self.motion
            .start(Tween::at_speed(from, target, self.config.units_per_second));
        fx.emit(Event::BoxMoved { target });
        debug!(entity = %fx.source(), ?target, "box moving");
    }

    fn return_home(&mut self, scene: &mut Scene, fx: &mut Effects<'_>) {
        let id = fx.source();
        if scene.set_scale(id, self.home_scale).is_err() {
            return;
        }
        let position = scene.position(id).unwrap_or(self.home);
        self.motion.cancel();
        if position.distance_squared(self.home) > RETURN_SNAP_DISTANCE_SQ {
            let speed = self.config.units_per_second * self.config.return_speed_multiplier;
            self.motion.start(Tween::at_speed(position, self.home, speed));
        } else if let Err(err) = scene.set_position(id, self.home) {
            warn!(entity = %id, %err, "box lost its entity");
        }
        fx.emit(Event::BoxReturned);
        debug!(entity = %id, "box returning");
    }

    /// Advances the return timer and the in-flight move on scaled time.
    pub fn frame_update(&mut self, frame: FrameTime, scene: &mut Scene, fx: &mut Effects<'_>) {
        let dt = frame.scaled;

        if self
            .return_timer
            .advance(|delay| wait(delay, dt))
            .is_some_and(|step| step.is_finished())
        {
            self.return_home(scene, fx);
        }

        if let Some(step) = self.motion.advance(|tween| tween.tick(dt)) {
            if let Err(err) = scene.set_position(fx.source(), step.value()) {
                warn!(entity = %fx.source(), %err, "box lost its entity");
                self.motion.cancel();
            }
        }
    }
}
