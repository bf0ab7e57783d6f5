//! Constant-speed movement between two endpoints.
//!
//! A [`KinematicMover`] owns at most one [`MotionSegment`] and at most one
//! dwell wait at a time (each in a [`Slot`]). What happens at the end of a
//! leg is decided by its [`MoverPolicy`]:
//!
//! | Policy | After the dwell |
//! |--------|-----------------|
//! | `PingPong { looping }` | reverse; without looping, stop once back at the start |
//! | `Restart { looping }` | snap back to the start and go again; without looping, stop |
//! | `Alternate` | swap endpoints and go again, forever |
//! | `Triggered` | no dwell; swap endpoints and wait for [`KinematicMover::start_once`] |
//!
//! The mover only computes positions. Applying them (and carrying riders)
//! is the caller's job.

use glam::Vec2;
use lilt::{Delay, Slot, Step, Tween, ARRIVAL_EPSILON, MIN_SPEED};
use serde::{Deserialize, Serialize};

/// One straight leg at constant speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSegment {
    tween: Tween<Vec2>,
    speed: f32,
}

impl MotionSegment {
    /// A leg from `from` to `to` at `speed` units per second.
    #[must_use]
    pub fn new(from: Vec2, to: Vec2, speed: f32) -> Self {
        Self {
            tween: Tween::at_speed(from, to, speed),
            speed: speed.max(MIN_SPEED),
        }
    }

    /// Where the leg starts.
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        self.tween.origin()
    }

    /// Where the leg ends.
    #[must_use]
    pub fn target(&self) -> Vec2 {
        self.tween.target()
    }

    /// Travel speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Fraction of the leg covered, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.tween.progress()
    }

    /// Advances by `dt`. Finishes exactly on the target once within
    /// [`ARRIVAL_EPSILON`] of it.
    pub fn advance(&mut self, dt: f32) -> Step<Vec2> {
        match self.tween.tick(dt) {
            Step::Running(position) if position.distance(self.target()) < ARRIVAL_EPSILON => {
                Step::Finished(self.target())
            }
            step => step,
        }
    }
}

/// End-of-leg behavior of a [`KinematicMover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoverPolicy {
    /// Reverse at each end.
    PingPong {
        /// Keep going after one round trip.
        looping: bool,
    },
    /// Snap back to the start after reaching the end.
    Restart {
        /// Keep going after the first leg.
        looping: bool,
    },
    /// Swap endpoints at each end, forever.
    Alternate,
    /// Move one leg per [`KinematicMover::start_once`] call.
    Triggered,
}

/// What a mover did during one fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoverStep {
    /// No position change.
    Idle,
    /// Moved along the current leg.
    Moved {
        /// Position before the step.
        from: Vec2,
        /// Position after the step.
        to: Vec2,
        /// This step reached the end of the leg.
        arrived: bool,
    },
    /// Jumped back to the start point.
    Teleported {
        /// Position before the jump.
        from: Vec2,
        /// The start point.
        to: Vec2,
    },
}

impl MoverStep {
    /// Position change produced by this step.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        match *self {
            Self::Idle => Vec2::ZERO,
            Self::Moved { from, to, .. } | Self::Teleported { from, to } => to - from,
        }
    }
}

/// Moves between two endpoints according to a [`MoverPolicy`].
///
/// # Example
///
/// ```
/// use skyhop_core::motion::{KinematicMover, MoverPolicy, MoverStep};
/// use glam::Vec2;
///
/// let mut mover = KinematicMover::new(
///     Vec2::ZERO,
///     Vec2::new(1.0, 0.0),
///     2.0,
///     0.0,
///     MoverPolicy::Triggered,
///     false,
/// );
/// let mut position = mover.initial_position();
/// assert_eq!(mover.fixed_update(position, 0.1), MoverStep::Idle);
///
/// assert!(mover.start_once());
/// assert!(!mover.start_once()); // ignored while a leg is in flight
/// while let MoverStep::Moved { to, arrived, .. } = mover.fixed_update(position, 0.1) {
///     position = to;
///     if arrived {
///         break;
///     }
/// }
/// assert_eq!(position, Vec2::new(1.0, 0.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicMover {
    start: Vec2,
    end: Vec2,
    leg_from: Vec2,
    leg_to: Vec2,
    toward_end: bool,
    speed: f32,
    dwell: f32,
    policy: MoverPolicy,
    initial_position: Vec2,
    motion: Slot<MotionSegment>,
    wait: Slot<Delay>,
    stopped: bool,
}

impl KinematicMover {
    /// Creates a mover. Every policy except [`MoverPolicy::Triggered`] starts
    /// its first leg immediately.
    #[must_use]
    pub fn new(
        start: Vec2,
        end: Vec2,
        speed: f32,
        dwell: f32,
        policy: MoverPolicy,
        start_at_end: bool,
    ) -> Self {
        let (leg_from, leg_to) = if start_at_end { (end, start) } else { (start, end) };
        let mut mover = Self {
            start,
            end,
            leg_from,
            leg_to,
            toward_end: !start_at_end,
            speed,
            dwell: dwell.max(0.0),
            policy,
            initial_position: leg_from,
            motion: Slot::empty(),
            wait: Slot::empty(),
            stopped: false,
        };
        if policy != MoverPolicy::Triggered {
            mover.begin_leg();
        }
        mover
    }

    /// Where the owner should be placed before the first step.
    #[must_use]
    pub fn initial_position(&self) -> Vec2 {
        self.initial_position
    }

    /// The configured policy.
    #[must_use]
    pub fn policy(&self) -> MoverPolicy {
        self.policy
    }

    /// Current leg endpoints `(from, to)`.
    #[must_use]
    pub fn leg(&self) -> (Vec2, Vec2) {
        (self.leg_from, self.leg_to)
    }

    /// Whether a leg is in flight.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.motion.is_active()
    }

    /// Whether the mover is waiting at an endpoint.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.wait.is_active()
    }

    /// Whether the mover has stopped for good.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// The in-flight leg.
    #[must_use]
    pub fn segment(&self) -> Option<&MotionSegment> {
        self.motion.get()
    }

    /// Starts exactly one leg. Ignored (returns false) while a leg or dwell
    /// is in flight, or after the mover stopped.
    pub fn start_once(&mut self) -> bool {
        if self.stopped || self.motion.is_active() || self.wait.is_active() {
            return false;
        }
        self.begin_leg();
        true
    }

    /// Cancels any in-flight leg or dwell and stops permanently.
    pub fn stop(&mut self) {
        self.motion.cancel();
        self.wait.cancel();
        self.stopped = true;
    }

    /// Advances one fixed step from `position`.
    pub fn fixed_update(&mut self, position: Vec2, dt: f32) -> MoverStep {
        if self.stopped {
            return MoverStep::Idle;
        }

        if let Some(step) = self.wait.advance(|wait| {
            if wait.tick(dt) {
                Step::Finished(())
            } else {
                Step::Running(())
            }
        }) {
            return if step.is_finished() {
                self.end_of_dwell(position)
            } else {
                MoverStep::Idle
            };
        }

        match self.motion.advance(|segment| segment.advance(dt)) {
            None => MoverStep::Idle,
            Some(Step::Running(to)) => MoverStep::Moved {
                from: position,
                to,
                arrived: false,
            },
            Some(Step::Finished(to)) => {
                self.on_arrival();
                MoverStep::Moved {
                    from: position,
                    to,
                    arrived: true,
                }
            }
        }
    }

    fn begin_leg(&mut self) {
        self.motion
            .start(MotionSegment::new(self.leg_from, self.leg_to, self.speed));
    }

    fn swap_leg(&mut self) {
        std::mem::swap(&mut self.leg_from, &mut self.leg_to);
        self.toward_end = !self.toward_end;
    }

    fn on_arrival(&mut self) {
        if self.policy == MoverPolicy::Triggered {
            self.swap_leg();
        } else {
            self.wait.start(Delay::new(self.dwell));
        }
    }

    fn end_of_dwell(&mut self, position: Vec2) -> MoverStep {
        match self.policy {
            MoverPolicy::PingPong { looping } => {
                self.swap_leg();
                if self.toward_end && !looping {
                    self.stopped = true;
                } else {
                    self.begin_leg();
                }
                MoverStep::Idle
            }
            MoverPolicy::Restart { looping } => {
                if !looping {
                    self.stopped = true;
                    return MoverStep::Idle;
                }
                self.leg_from = self.start;
                self.leg_to = self.end;
                self.toward_end = true;
                self.begin_leg();
                MoverStep::Teleported {
                    from: position,
                    to: self.start,
                }
            }
            MoverPolicy::Alternate => {
                self.swap_leg();
                self.begin_leg();
                MoverStep::Idle
            }
            MoverPolicy::Triggered => MoverStep::Idle,
        }
    }
}
