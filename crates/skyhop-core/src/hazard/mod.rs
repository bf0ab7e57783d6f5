//! Hazards: one-shot kill sequences and the traps that start them.
//!
//! Every lethal hazard is built from the same two pieces:
//!
//! - [`HazardCore`]: the `Idle -> Armed -> Triggered -> Cooldown` state
//!   machine that guarantees a single kill per arm cycle
//! - [`DeathSequence`]: the effect pipeline run once per kill (effects,
//!   death count, optional shrink, delayed restart request)
//!
//! | Hazard | Arms on | Rearm policy |
//! |--------|---------|--------------|
//! | [`Spikes`] | zone entry (raise) or direct contact | [`RearmPolicy::OnReset`] |
//! | [`DeathFloor`] | trigger contact | [`RearmPolicy::Never`] when one-shot |
//! | [`MovingBox`] | not lethal; displaces itself on contact | n/a |
//!
//! Death sequences run on unscaled time, so a paused game still finishes a
//! death and restarts the level.

pub mod death_floor;
pub mod moving_box;
pub mod spikes;

pub use death_floor::DeathFloor;
pub use moving_box::{MovingBox, RetriggerPolicy};
pub use spikes::Spikes;

use glam::Vec2;
use lilt::{ClockDomain, Delay, FrameTime, Slot, Step, Tween};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::DeathEffectsConfig;
use crate::entity::EntityId;
use crate::events::{Effects, Event};
use crate::scene::Scene;
use crate::services::ClipId;

/// Ticks a [`Delay`] as a one-shot [`Step`], for use with [`Slot::advance`].
pub(crate) fn wait(delay: &mut Delay, dt: f32) -> Step<()> {
    if delay.tick(dt) {
        Step::Finished(())
    } else {
        Step::Running(())
    }
}

// =============================================================================
// State machine
// =============================================================================

/// Life-cycle state of a lethal hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardState {
    /// Not yet approached.
    #[default]
    Idle,
    /// A qualifying entity is near; contact will kill.
    Armed,
    /// A death sequence is in flight.
    Triggered,
    /// The sequence finished; waiting for a reset (or forever).
    Cooldown,
}

/// When a hazard may fire again after a kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RearmPolicy {
    /// Never again for this level load.
    Never,
    /// After an explicit [`HazardCore::reset`].
    OnReset,
    /// As soon as the previous death sequence has finished.
    AfterSequence,
}

/// One-shot trigger guard shared by all lethal hazards.
///
/// # Example
///
/// ```
/// use skyhop_core::hazard::{HazardCore, HazardState, RearmPolicy};
///
/// let mut core = HazardCore::new(RearmPolicy::OnReset);
/// assert!(core.try_trigger());
/// assert!(!core.try_trigger()); // overlapping contacts are ignored
///
/// core.finish();
/// assert_eq!(core.state(), HazardState::Cooldown);
/// assert!(core.reset());
/// assert!(core.try_trigger());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardCore {
    state: HazardState,
    rearm: RearmPolicy,
    triggers: u32,
}

impl HazardCore {
    /// An idle hazard.
    #[must_use]
    pub fn new(rearm: RearmPolicy) -> Self {
        Self {
            state: HazardState::Idle,
            rearm,
            triggers: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HazardState {
        self.state
    }

    /// Configured rearm policy.
    #[must_use]
    pub fn rearm_policy(&self) -> RearmPolicy {
        self.rearm
    }

    /// Kills so far.
    #[must_use]
    pub fn trigger_count(&self) -> u32 {
        self.triggers
    }

    /// `Idle -> Armed`. Any other state is left alone.
    pub fn arm(&mut self) -> bool {
        if self.state == HazardState::Idle {
            self.state = HazardState::Armed;
            true
        } else {
            false
        }
    }

    /// Enters `Triggered` from `Idle` or `Armed`. Returns false (and changes
    /// nothing) otherwise.
    pub fn try_trigger(&mut self) -> bool {
        match self.state {
            HazardState::Idle | HazardState::Armed => {
                self.state = HazardState::Triggered;
                self.triggers += 1;
                true
            }
            HazardState::Triggered | HazardState::Cooldown => false,
        }
    }

    /// Marks the in-flight sequence as done.
    pub fn finish(&mut self) {
        if self.state == HazardState::Triggered {
            self.state = match self.rearm {
                RearmPolicy::AfterSequence => HazardState::Armed,
                RearmPolicy::Never | RearmPolicy::OnReset => HazardState::Cooldown,
            };
        }
    }

    /// Returns a reusable hazard to `Idle`.
    ///
    /// Ignored while a sequence is in flight and for [`RearmPolicy::Never`].
    pub fn reset(&mut self) -> bool {
        if self.state == HazardState::Triggered || self.rearm == RearmPolicy::Never {
            return false;
        }
        self.state = HazardState::Idle;
        true
    }
}

// =============================================================================
// Death sequence
// =============================================================================

/// The entity a hazard is killing.
#[derive(Debug, Clone, Copy)]
pub struct Victim<'a> {
    /// The victim.
    pub id: EntityId,
    /// Death effects the victim carries, if any.
    pub death_effects: Option<&'a DeathEffectsConfig>,
}

impl Victim<'_> {
    /// A victim without death effects.
    #[must_use]
    pub fn bare(id: EntityId) -> Self {
        Self {
            id,
            death_effects: None,
        }
    }
}

/// Hazard-side parameters of a kill.
#[derive(Debug, Clone, Copy)]
pub struct DeathCue<'a> {
    /// Hazard sound, used when the victim has no death effects.
    pub clip: Option<&'a ClipId>,
    /// Hazard sound volume.
    pub volume: f32,
    /// Shrink the victim to zero over this many seconds.
    pub shrink: Option<f32>,
    /// Minimum delay before the restart request.
    pub death_delay: f32,
}

/// An in-flight kill: optional shrink, then a restart request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathSequence {
    victim: EntityId,
    shrink: Slot<Tween<Vec2>>,
    restart: Slot<Delay>,
}

impl DeathSequence {
    /// Runs the immediate part of a kill and returns the pending remainder.
    ///
    /// The victim's body is suspended for the rest of the sequence. Its
    /// scale is the only thing the sequence changes afterwards.
    pub fn begin(
        victim: Victim<'_>,
        cue: &DeathCue<'_>,
        scene: &mut Scene,
        fx: &mut Effects<'_>,
    ) -> Self {
        let id = victim.id;
        fx.emit(Event::HazardTriggered { victim: id });

        match victim.death_effects {
            Some(effects) => {
                if effects.particles {
                    let position = scene.position(id).unwrap_or_default();
                    fx.emit(Event::DeathEffectsSpawned {
                        victim: id,
                        position,
                    });
                }
                fx.play(effects.clip.as_ref(), effects.volume);
            }
            None => {
                fx.play(cue.clip, cue.volume);
            }
        }

        fx.services().add_death(1);
        fx.emit(Event::DeathCounted { count: 1 });

        if let Some(body) = scene.get_mut(id).and_then(|e| e.body.as_mut()) {
            body.suspend();
        }

        let mut shrink = Slot::empty();
        let shrink_duration = cue.shrink.map_or(0.0, |d| d.max(0.0));
        if cue.shrink.is_some() {
            if shrink_duration > 0.0 {
                let from = scene.scale(id).unwrap_or(Vec2::ONE);
                shrink.start(Tween::new(from, Vec2::ZERO, shrink_duration));
            } else if scene.set_scale(id, Vec2::ZERO).is_err() {
                trace!(entity = %id, "victim vanished before shrink");
            }
        }

        let mut restart = Slot::empty();
        restart.start(Delay::new(cue.death_delay.max(shrink_duration)));

        debug!(hazard = %fx.source(), victim = %id, "death sequence started");
        Self {
            victim: id,
            shrink,
            restart,
        }
    }

    /// The entity being killed.
    #[must_use]
    pub fn victim(&self) -> EntityId {
        self.victim
    }

    /// Whether the shrink and the restart request are both done.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.shrink.is_active() && !self.restart.is_active()
    }

    /// Advances on unscaled time. Returns true on the frame the restart is
    /// requested.
    pub fn frame_update(
        &mut self,
        frame: FrameTime,
        scene: &mut Scene,
        fx: &mut Effects<'_>,
    ) -> bool {
        let dt = frame.delta(ClockDomain::Real);

        if let Some(step) = self.shrink.advance(|tween| tween.tick(dt)) {
            if scene.set_scale(self.victim, step.value()).is_err() {
                trace!(entity = %self.victim, "victim vanished during shrink");
                self.shrink.cancel();
            }
        }

        let fired = self
            .restart
            .advance(|delay| wait(delay, dt))
            .is_some_and(|step| step.is_finished());
        if fired {
            let route = fx.services().restart_level();
            fx.emit(Event::RestartRequested { route });
            debug!(hazard = %fx.source(), ?route, "restart requested");
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Body, EntityKind};
    use crate::events::EventLog;
    use crate::services::{RestartRoute, Services};
    use proptest::prelude::*;

    mod core_tests {
        use super::*;

        #[test]
        fn arm_only_from_idle() {
            let mut core = HazardCore::new(RearmPolicy::OnReset);
            assert!(core.arm());
            assert!(!core.arm());
            assert!(core.try_trigger());
            assert!(!core.arm());
            assert_eq!(core.state(), HazardState::Triggered);
        }

        #[test]
        fn never_policy_stays_spent() {
            let mut core = HazardCore::new(RearmPolicy::Never);
            assert!(core.try_trigger());
            core.finish();
            assert!(!core.reset());
            assert!(!core.try_trigger());
            assert_eq!(core.trigger_count(), 1);
        }

        #[test]
        fn reset_is_ignored_mid_sequence() {
            let mut core = HazardCore::new(RearmPolicy::OnReset);
            core.try_trigger();
            assert!(!core.reset());
            assert_eq!(core.state(), HazardState::Triggered);
        }

        #[test]
        fn after_sequence_rearms_itself() {
            let mut core = HazardCore::new(RearmPolicy::AfterSequence);
            core.try_trigger();
            assert!(!core.try_trigger());
            core.finish();
            assert_eq!(core.state(), HazardState::Armed);
            assert!(core.try_trigger());
        }
    }

    mod sequence_tests {
        use super::*;

        fn kill(
            cue: &DeathCue<'_>,
            effects: Option<&DeathEffectsConfig>,
        ) -> (Scene, EntityId, DeathSequence, Vec<Event>) {
            let mut scene = Scene::new();
            let hazard = scene.spawn(EntityKind::Hazard, Vec2::ZERO);
            let victim = scene.spawn_with(EntityKind::Player, Vec2::new(1.0, 2.0), |e| {
                e.with_body(Body {
                    velocity: Vec2::new(3.0, -4.0),
                    ..Body::dynamic()
                })
            });
            let services = Services::new();
            let mut log = EventLog::new();
            let mut fx = Effects::new(hazard, &services, &mut log);
            let victim_ref = Victim {
                id: victim,
                death_effects: effects,
            };
            let sequence = DeathSequence::begin(victim_ref, cue, &mut scene, &mut fx);
            let events = log.take_events().into_iter().map(|e| e.event).collect();
            (scene, victim, sequence, events)
        }

        fn cue(shrink: Option<f32>, death_delay: f32) -> DeathCue<'static> {
            DeathCue {
                clip: None,
                volume: 1.0,
                shrink,
                death_delay,
            }
        }

        #[test]
        fn begin_reports_and_suspends() {
            let (scene, victim, _, events) = kill(&cue(Some(0.2), 0.25), None);
            assert_eq!(
                events,
                vec![
                    Event::HazardTriggered { victim },
                    Event::DeathCounted { count: 1 },
                ]
            );
            let body = scene.get(victim).unwrap().body.unwrap();
            assert!(!body.simulated);
            assert_eq!(body.velocity, Vec2::ZERO);
        }

        #[test]
        fn victim_effects_replace_hazard_sound() {
            let effects = DeathEffectsConfig::default();
            let (_, victim, _, events) = kill(&cue(None, 0.1), Some(&effects));
            assert!(events.contains(&Event::DeathEffectsSpawned {
                victim,
                position: Vec2::new(1.0, 2.0),
            }));
        }

        #[test]
        fn zero_shrink_zeroes_scale_at_once() {
            let (scene, victim, sequence, _) = kill(&cue(Some(0.0), 0.1), None);
            assert_eq!(scene.scale(victim), Some(Vec2::ZERO));
            assert!(!sequence.is_finished());
        }

        #[test]
        fn restart_waits_for_the_longer_of_delay_and_shrink() {
            let (mut scene, victim, mut sequence, _) = kill(&cue(Some(0.5), 0.25), None);
            let services = Services::new();
            let mut log = EventLog::new();
            let mut fx = Effects::new(EntityId::new(0), &services, &mut log);

            let frame = FrameTime::new(0.125, 0.0);
            for _ in 0..3 {
                assert!(!sequence.frame_update(frame, &mut scene, &mut fx));
            }
            let shrunk = scene.scale(victim).unwrap();
            assert!((shrunk.x - 0.25).abs() < 1e-5);

            assert!(sequence.frame_update(frame, &mut scene, &mut fx));
            assert_eq!(scene.scale(victim), Some(Vec2::ZERO));
            assert!(sequence.is_finished());
            assert_eq!(
                log.events().last().map(|e| &e.event),
                Some(&Event::RestartRequested {
                    route: RestartRoute::Unavailable
                })
            );
        }

        #[test]
        fn vanished_victim_does_not_stall_the_restart() {
            let (mut scene, victim, mut sequence, _) = kill(&cue(Some(1.0), 0.0), None);
            scene.despawn(victim);
            let services = Services::new();
            let mut log = EventLog::new();
            let mut fx = Effects::new(EntityId::new(0), &services, &mut log);
            let mut fired = 0;
            for _ in 0..20 {
                if sequence.frame_update(FrameTime::uniform(0.1), &mut scene, &mut fx) {
                    fired += 1;
                }
            }
            assert_eq!(fired, 1);
            assert!(sequence.is_finished());
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Contact,
        Finish,
        Reset,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => Just(Op::Contact),
            1 => Just(Op::Finish),
            1 => Just(Op::Reset),
        ]
    }

    proptest! {
        #[test]
        fn one_trigger_per_arm_cycle(ops in proptest::collection::vec(op(), 0..64)) {
            let mut core = HazardCore::new(RearmPolicy::OnReset);
            let mut cycles = 1u32;
            for op in ops {
                match op {
                    Op::Contact => {
                        core.try_trigger();
                    }
                    Op::Finish => core.finish(),
                    Op::Reset => {
                        if core.reset() {
                            cycles += 1;
                        }
                    }
                }
                prop_assert!(core.trigger_count() <= cycles);
            }
        }
    }
}
