//! Kill volume below the level.

use lilt::FrameTime;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::collision::ContactKind;
use crate::config::DeathFloorConfig;
use crate::error::ConfigError;
use crate::events::Effects;
use crate::scene::Scene;

use super::{DeathCue, DeathSequence, HazardCore, HazardState, RearmPolicy, Victim};

/// A trigger volume that kills on entry and restarts the level.
///
/// A one-shot floor fires once per level load. Otherwise it fires again
/// once the previous death sequence has finished, never while one is
/// running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathFloor {
    config: DeathFloorConfig,
    core: HazardCore,
    death: Option<DeathSequence>,
}

impl DeathFloor {
    /// Creates the floor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a negative death delay.
    pub fn new(config: DeathFloorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rearm = if config.one_shot {
            RearmPolicy::Never
        } else {
            RearmPolicy::AfterSequence
        };
        Ok(Self {
            config,
            core: HazardCore::new(rearm),
            death: None,
        })
    }

    /// Trigger state.
    #[must_use]
    pub fn state(&self) -> HazardState {
        self.core.state()
    }

    /// A player entered the volume. Returns whether this started a kill.
    pub fn on_contact(
        &mut self,
        victim: Victim<'_>,
        kind: ContactKind,
        scene: &mut Scene,
        fx: &mut Effects<'_>,
    ) -> bool {
        if kind != ContactKind::Trigger {
            return false;
        }
        if !self.core.try_trigger() {
            trace!(entity = %fx.source(), victim = %victim.id, "death floor already fired");
            return false;
        }
        let cue = DeathCue {
            clip: self.config.clip.as_ref(),
            volume: self.config.volume,
            shrink: None,
            death_delay: self.config.death_delay,
        };
        self.death = Some(DeathSequence::begin(victim, &cue, scene, fx));
        true
    }

    /// Advances the death sequence on unscaled time.
    pub fn frame_update(&mut self, frame: FrameTime, scene: &mut Scene, fx: &mut Effects<'_>) {
        if let Some(death) = self.death.as_mut() {
            death.frame_update(frame, scene, fx);
            if death.is_finished() {
                self.death = None;
                self.core.finish();
            }
        }
    }
}
