//! Clock domains and per-frame time deltas.
//!
//! Games step two clocks: a fixed-interval physics clock and a variable
//! presentation clock. The presentation clock itself comes in two flavours,
//! scaled (stops while paused) and real (keeps running). [`FrameTime`]
//! carries both deltas so a sequence can pick the one it is specified
//! against via [`ClockDomain`].

use serde::{Deserialize, Serialize};

/// Which presentation clock advances a timed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockDomain {
    /// Scaled game time. Freezes while the time scale is zero.
    Scaled,
    /// Unscaled wall-clock time. Keeps running while paused.
    Real,
}

/// Elapsed time of one presentation frame on both clocks.
///
/// # Example
///
/// ```
/// use lilt::{ClockDomain, FrameTime};
///
/// let paused = FrameTime::new(0.016, 0.0);
/// assert_eq!(paused.delta(ClockDomain::Scaled), 0.0);
/// assert_eq!(paused.delta(ClockDomain::Real), 0.016);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameTime {
    /// Scaled delta in seconds.
    pub scaled: f32,
    /// Unscaled delta in seconds.
    pub real: f32,
}

impl FrameTime {
    /// Builds a frame from a wall-clock delta and the current time scale.
    ///
    /// Negative inputs are clamped to zero; time never runs backwards.
    #[must_use]
    pub fn new(real: f32, time_scale: f32) -> Self {
        let real = real.max(0.0);
        Self {
            scaled: real * time_scale.max(0.0),
            real,
        }
    }

    /// A frame where both clocks advance by the same amount.
    #[must_use]
    pub fn uniform(dt: f32) -> Self {
        Self::new(dt, 1.0)
    }

    /// Returns the delta for the given clock domain.
    #[must_use]
    pub fn delta(self, domain: ClockDomain) -> f32 {
        match domain {
            ClockDomain::Scaled => self.scaled,
            ClockDomain::Real => self.real,
        }
    }
}
