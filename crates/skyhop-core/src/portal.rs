//! End-of-level portal.
//!
//! The first qualifying contact fires the portal; later contacts are ignored.
//! The sequence then runs to completion without further input:
//!
//! 1. Play the activation sound and report [`Event::PortalActivated`]
//! 2. Optionally snap the player to the portal and parent it there
//! 3. Shrink the player to zero over `shrink_duration` of unscaled time,
//!    shaped by the configured easing curve
//! 4. Wait `animation_duration` of scaled time
//! 5. Report completion to progression ([`Event::LevelCompleted`])
//!
//! The player's body is suspended from step 1 on.

use glam::Vec2;
use lilt::{ClockDomain, Delay, FrameTime, Slot, Tween};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PortalConfig;
use crate::entity::EntityId;
use crate::error::ConfigError;
use crate::events::{Effects, Event};
use crate::hazard::wait;
use crate::scene::Scene;

/// Where a portal sequence is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalPhase {
    /// Waiting for the player.
    #[default]
    Waiting,
    /// Shrinking the player.
    Shrinking,
    /// Waiting for the exit animation.
    Animating,
    /// Completion was reported.
    Complete,
}

/// The level exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelPortal {
    config: PortalConfig,
    phase: PortalPhase,
    player: Option<EntityId>,
    shrink: Slot<Tween<Vec2>>,
    animation: Slot<Delay>,
}

impl LevelPortal {
    /// Creates an idle portal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative durations.
    pub fn new(config: PortalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: PortalPhase::Waiting,
            player: None,
            shrink: Slot::empty(),
            animation: Slot::empty(),
        })
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> PortalPhase {
        self.phase
    }

    /// Whether the portal has fired.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.phase != PortalPhase::Waiting
    }

    /// The player that entered, once fired.
    #[must_use]
    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// A player touched the portal. Returns whether this fired it.
    pub fn on_contact(
        &mut self,
        player: EntityId,
        scene: &mut Scene,
        fx: &mut Effects<'_>,
    ) -> bool {
        if self.has_fired() {
            return false;
        }
        let portal = fx.source();
        self.player = Some(player);

        fx.play(self.config.sound.as_ref(), self.config.volume);
        fx.emit(Event::PortalActivated { player });
        debug!(entity = %portal, %player, "portal fired");

        if let Some(body) = scene.get_mut(player).and_then(|e| e.body.as_mut()) {
            body.suspend();
        }

        if self.config.move_player_to_portal {
            if let Some(target) = scene.position(portal) {
                if let Err(err) = scene.set_position(player, target) {
                    warn!(entity = %portal, %err, "could not move player into portal");
                }
            }
        }
        if self.config.parent_player_to_portal {
            if let Err(err) = scene.set_parent(player, Some(portal)) {
                warn!(entity = %portal, %err, "could not parent player to portal");
            }
        }

        let start = scene.scale(player).unwrap_or(Vec2::ONE);
        if self.config.shrink_duration > 0.0 {
            self.shrink.start(
                Tween::new(start, Vec2::ZERO, self.config.shrink_duration)
                    .with_easing(self.config.shrink_easing),
            );
            self.phase = PortalPhase::Shrinking;
        } else {
            self.finish_shrink(scene);
        }
        true
    }

    fn finish_shrink(&mut self, scene: &mut Scene) {
        if let Some(player) = self.player {
            // The player may already be gone; completion still goes ahead.
            let _ = scene.set_scale(player, Vec2::ZERO);
        }
        self.animation
            .start(Delay::new(self.config.animation_duration));
        self.phase = PortalPhase::Animating;
    }

    /// Advances the sequence: the shrink on unscaled time, the animation
    /// wait on scaled time.
    pub fn frame_update(&mut self, frame: FrameTime, scene: &mut Scene, fx: &mut Effects<'_>) {
        match self.phase {
            PortalPhase::Waiting | PortalPhase::Complete => {}
            PortalPhase::Shrinking => {
                let dt = frame.delta(ClockDomain::Real);
                let player = self.player;
                match self.shrink.advance(|tween| tween.tick(dt)) {
                    Some(step) if !step.is_finished() => {
                        if let Some(player) = player {
                            let _ = scene.set_scale(player, step.value());
                        }
                    }
                    _ => self.finish_shrink(scene),
                }
            }
            PortalPhase::Animating => {
                let dt = frame.delta(ClockDomain::Scaled);
                if self
                    .animation
                    .advance(|delay| wait(delay, dt))
                    .is_some_and(|step| step.is_finished())
                {
                    let delivered = fx.services().complete_level();
                    fx.emit(Event::LevelCompleted { delivered });
                    self.phase = PortalPhase::Complete;
                    debug!(entity = %fx.source(), delivered, "level complete");
                }
            }
        }
    }
}
