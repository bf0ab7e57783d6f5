//! Countdown timers and one-shot delays.

use serde::{Deserialize, Serialize};

/// A timer that decays toward zero and stays there.
///
/// Used for grace windows such as coyote time and jump buffering: the window
/// is open while [`Countdown::is_running`] is true.
///
/// # Invariants
///
/// - `remaining() >= 0` at all times
/// - `remaining()` never increases except through [`Countdown::set`]
///
/// # Example
///
/// ```
/// use lilt::Countdown;
///
/// let mut coyote = Countdown::idle();
/// coyote.set(0.15);
/// assert!(!coyote.tick(0.1));
/// assert!(coyote.is_running());
/// assert!(coyote.tick(0.1)); // reached zero on this tick
/// assert_eq!(coyote.remaining(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    /// A countdown that is not running.
    #[must_use]
    pub const fn idle() -> Self {
        Self { remaining: 0.0 }
    }

    /// Restarts the countdown at `duration` seconds (negative clamps to zero).
    pub fn set(&mut self, duration: f32) {
        self.remaining = duration.max(0.0);
    }

    /// Stops the countdown immediately.
    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }

    /// Seconds left before the countdown reaches zero.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Returns true while time remains.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.remaining > 0.0
    }

    /// Decays the countdown by `dt`.
    ///
    /// Returns true only on the tick where the countdown reaches zero.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        self.remaining <= 0.0
    }
}

/// A one-shot wait that fires exactly once after its duration elapses.
///
/// A zero duration fires on the first tick, mirroring "wait zero seconds"
/// which still yields one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delay {
    duration: f32,
    elapsed: f32,
    fired: bool,
}

impl Delay {
    /// Creates a delay of `duration` seconds.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            elapsed: 0.0,
            fired: false,
        }
    }

    /// Advances the delay. Returns true on the single tick where it fires.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.fired {
            return false;
        }
        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.duration {
            self.fired = true;
            return true;
        }
        false
    }

    /// Configured duration in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Time accumulated so far.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds left before the delay fires (zero once fired).
    #[must_use]
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Whether the delay has fired.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.fired
    }
}
