//! Pop-up spikes.
//!
//! Spikes rise when a player enters their zone and, with auto-retract on,
//! lower again after a delay. Every [`Spikes::raise`] or [`Spikes::lower`]
//! replaces both the in-flight motion and the pending retract, so a second
//! raise restarts the retract delay from zero.
//!
//! Motion and the retract delay run on scaled frame time. Touching the
//! spikes kills whether they are up or down.

use glam::Vec2;
use lilt::{Delay, FrameTime, Slot, Tween};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::collision::ContactKind;
use crate::config::SpikesConfig;
use crate::error::ConfigError;
use crate::events::{Effects, Event};
use crate::scene::Scene;

use super::{wait, DeathCue, DeathSequence, HazardCore, HazardState, RearmPolicy, Victim};

/// A spike trap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spikes {
    config: SpikesConfig,
    lowered: Vec2,
    raised: Vec2,
    motion: Slot<Tween<Vec2>>,
    retract: Slot<Delay>,
    core: HazardCore,
    death: Option<DeathSequence>,
}

impl Spikes {
    /// Spikes resting (lowered) at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative durations.
    pub fn new(config: SpikesConfig, position: Vec2) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lowered: position,
            raised: position + Vec2::new(0.0, config.rise_distance),
            config,
            motion: Slot::empty(),
            retract: Slot::empty(),
            core: HazardCore::new(RearmPolicy::OnReset),
            death: None,
        })
    }

    /// Settings.
    #[must_use]
    pub fn config(&self) -> &SpikesConfig {
        &self.config
    }

    /// Trigger state.
    #[must_use]
    pub fn state(&self) -> HazardState {
        self.core.state()
    }

    /// Whether a rise or lower is in flight.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.motion.is_active()
    }

    /// Whether a retract is pending.
    #[must_use]
    pub fn retract_pending(&self) -> bool {
        self.retract.is_active()
    }

    /// Resting and raised positions.
    #[must_use]
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        (self.lowered, self.raised)
    }

    /// Kind of contact that damages.
    #[must_use]
    pub fn damaging_contact(&self) -> ContactKind {
        if self.config.damage_on_trigger {
            ContactKind::Trigger
        } else {
            ContactKind::Collision
        }
    }

    // =========================================================================
    // Motion
    // =========================================================================

    /// Starts rising, replacing any motion and pending retract.
    pub fn raise(&mut self, scene: &Scene, fx: &mut Effects<'_>) {
        self.cancel_sequences();
        let from = scene.position(fx.source()).unwrap_or(self.lowered);
        self.motion
            .start(Tween::new(from, self.raised, self.config.rise_duration));
        if self.config.auto_retract {
            self.retract.start(Delay::new(self.config.retract_delay));
        }
        self.core.arm();
        fx.emit(Event::SpikesRaised);
        debug!(entity = %fx.source(), "spikes raised");
    }

    /// Starts lowering, replacing any motion and pending retract.
    pub fn lower(&mut self, scene: &Scene, fx: &mut Effects<'_>) {
        self.cancel_sequences();
        let from = scene.position(fx.source()).unwrap_or(self.raised);
        self.motion
            .start(Tween::new(from, self.lowered, self.config.lower_duration));
        fx.emit(Event::SpikesLowered);
        debug!(entity = %fx.source(), "spikes lowered");
    }

    fn cancel_sequences(&mut self) {
        self.motion.cancel();
        self.retract.cancel();
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    /// A player entered the spike zone.
    pub fn on_zone_entered(&mut self, scene: &Scene, fx: &mut Effects<'_>) {
        self.raise(scene, fx);
    }

    /// A player touched the spikes. Returns whether this started a kill.
    pub fn on_contact(
        &mut self,
        victim: Victim<'_>,
        kind: ContactKind,
        scene: &mut Scene,
        fx: &mut Effects<'_>,
    ) -> bool {
        if kind != self.damaging_contact() {
            return false;
        }
        if !self.core.try_trigger() {
            trace!(entity = %fx.source(), victim = %victim.id, "spikes already fired");
            return false;
        }
        let cue = DeathCue {
            clip: self.config.clip.as_ref(),
            volume: self.config.volume,
            shrink: Some(self.config.shrink_duration),
            death_delay: self.config.death_delay,
        };
        self.death = Some(DeathSequence::begin(victim, &cue, scene, fx));
        true
    }

    /// Re-enables the kill after the spikes are re-activated.
    ///
    /// Ignored while a death sequence is running.
    pub fn reset(&mut self) -> bool {
        let reset = self.core.reset();
        if !reset {
            debug!(state = ?self.core.state(), "spike reset ignored");
        }
        reset
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advances motion and retract on scaled time, the death sequence on
    /// unscaled time.
    pub fn frame_update(&mut self, frame: FrameTime, scene: &mut Scene, fx: &mut Effects<'_>) {
        let dt = frame.scaled;

        if self
            .retract
            .advance(|delay| wait(delay, dt))
            .is_some_and(|step| step.is_finished())
        {
            self.lower(scene, fx);
        }

        if let Some(step) = self.motion.advance(|tween| tween.tick(dt)) {
            if let Err(err) = scene.set_position(fx.source(), step.value()) {
                warn!(entity = %fx.source(), %err, "spikes lost their entity");
                self.motion.cancel();
            }
        }

        if let Some(death) = self.death.as_mut() {
            death.frame_update(frame, scene, fx);
            if death.is_finished() {
                self.death = None;
                self.core.finish();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, EntityKind};
    use crate::events::EventLog;
    use crate::services::Services;

    const DT: f32 = 1.0 / 64.0;

    struct Rig {
        scene: Scene,
        id: EntityId,
        player: EntityId,
        spikes: Spikes,
        services: Services,
        log: EventLog,
    }

    impl Rig {
        fn new(config: SpikesConfig) -> Self {
            let mut scene = Scene::new();
            let id = scene.spawn(EntityKind::Hazard, Vec2::ZERO);
            let player = scene.spawn(EntityKind::Player, Vec2::new(0.0, 1.0));
            Self {
                spikes: Spikes::new(config, Vec2::ZERO).unwrap(),
                scene,
                id,
                player,
                services: Services::new(),
                log: EventLog::new(),
            }
        }

        fn raise(&mut self) {
            let mut fx = Effects::new(self.id, &self.services, &mut self.log);
            self.spikes.raise(&self.scene, &mut fx);
        }

        fn touch(&mut self, kind: ContactKind) -> bool {
            let mut fx = Effects::new(self.id, &self.services, &mut self.log);
            self.spikes
                .on_contact(Victim::bare(self.player), kind, &mut self.scene, &mut fx)
        }

        fn frames(&mut self, count: usize) {
            for _ in 0..count {
                let mut fx = Effects::new(self.id, &self.services, &mut self.log);
                self.spikes
                    .frame_update(FrameTime::uniform(DT), &mut self.scene, &mut fx);
            }
        }

        fn count(&self, event: &Event) -> usize {
            self.log.events().iter().filter(|e| &e.event == event).count()
        }
    }

    mod motion_tests {
        use super::*;

        #[test]
        fn rises_over_rise_duration() {
            let mut rig = Rig::new(SpikesConfig {
                rise_duration: 0.25,
                auto_retract: false,
                ..SpikesConfig::default()
            });
            rig.raise();
            rig.frames(8);
            let halfway = rig.scene.position(rig.id).unwrap();
            assert!((halfway.y - 0.5).abs() < 1e-5);
            rig.frames(8);
            assert_eq!(rig.scene.position(rig.id), Some(Vec2::new(0.0, 1.0)));
            assert!(!rig.spikes.is_moving());
        }

        #[test]
        fn second_raise_restarts_the_retract_delay() {
            let mut rig = Rig::new(SpikesConfig::default());
            rig.raise();
            rig.frames(32); // t = 0.5
            rig.raise();

            rig.frames(95); // t = 1.984
            assert_eq!(rig.count(&Event::SpikesLowered), 0);
            assert_eq!(rig.scene.position(rig.id), Some(Vec2::new(0.0, 1.0)));

            rig.frames(1); // t = 2.0
            assert_eq!(rig.count(&Event::SpikesLowered), 1);
        }

        #[test]
        fn lower_cancels_the_pending_retract() {
            let mut rig = Rig::new(SpikesConfig::default());
            rig.raise();
            rig.frames(4);
            let mut fx = Effects::new(rig.id, &rig.services, &mut rig.log);
            rig.spikes.lower(&rig.scene, &mut fx);
            assert!(!rig.spikes.retract_pending());

            rig.frames(200);
            assert_eq!(rig.count(&Event::SpikesLowered), 1);
            assert_eq!(rig.scene.position(rig.id), Some(Vec2::ZERO));
        }

        #[test]
        fn paused_frames_hold_motion() {
            let mut rig = Rig::new(SpikesConfig::default());
            rig.raise();
            for _ in 0..50 {
                let mut fx = Effects::new(rig.id, &rig.services, &mut rig.log);
                rig.spikes
                    .frame_update(FrameTime::new(DT, 0.0), &mut rig.scene, &mut fx);
            }
            assert_eq!(rig.scene.position(rig.id), Some(Vec2::ZERO));
            assert!(rig.spikes.retract_pending());
        }
    }

    mod kill_tests {
        use super::*;

        #[test]
        fn overlapping_contacts_kill_once() {
            let mut rig = Rig::new(SpikesConfig::default());
            assert!(rig.touch(ContactKind::Trigger));
            assert!(!rig.touch(ContactKind::Trigger));
            rig.frames(40);
            assert!(!rig.touch(ContactKind::Trigger));
            assert_eq!(rig.count(&Event::DeathCounted { count: 1 }), 1);
            assert_eq!(rig.spikes.state(), HazardState::Cooldown);
        }

        #[test]
        fn wrong_contact_kind_is_ignored() {
            let mut rig = Rig::new(SpikesConfig {
                damage_on_trigger: false,
                ..SpikesConfig::default()
            });
            assert!(!rig.touch(ContactKind::Trigger));
            assert!(rig.touch(ContactKind::Collision));
        }

        #[test]
        fn reset_rearms_after_the_sequence() {
            let mut rig = Rig::new(SpikesConfig::default());
            assert!(rig.touch(ContactKind::Trigger));
            assert!(!rig.spikes.reset());
            rig.frames(40);
            assert!(rig.spikes.reset());
            assert!(rig.touch(ContactKind::Trigger));
        }

        #[test]
        fn victim_shrinks_and_restart_follows() {
            let mut rig = Rig::new(SpikesConfig::default());
            rig.touch(ContactKind::Trigger);
            rig.frames(17); // 0.2656 s, past both shrink and death delay
            assert_eq!(rig.scene.scale(rig.player), Some(Vec2::ZERO));
            assert_eq!(
                rig.log
                    .events()
                    .iter()
                    .filter(|e| matches!(e.event, Event::RestartRequested { .. }))
                    .count(),
                1
            );
        }
    }
}
