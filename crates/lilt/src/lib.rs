//! # Lilt
//!
//! Resumable timed sequences for fixed-step games.
//!
//! Gameplay code is full of "wait, then do something" and "animate this over
//! time" logic. Lilt models each of these as a small, explicit state object
//! that is advanced once per clock tick, instead of an opaque deferred
//! continuation. Cancelling a sequence is then just dropping (or replacing)
//! its state object.
//!
//! - [`Countdown`]: a decaying timer that floors at zero (coyote time, jump buffer)
//! - [`Delay`]: a one-shot wait that fires exactly once
//! - [`Tween`]: interpolation between two values over a duration, shaped by an [`Easing`]
//! - [`Slot`]: single-occupancy holder enforcing "at most one in-flight sequence"
//! - [`FrameTime`]: the scaled and unscaled deltas of one presentation frame
//!
//! ## Quick Start
//!
//! ```
//! use lilt::{Delay, Slot, Step, Tween};
//!
//! let mut motion: Slot<Tween<f32>> = Slot::empty();
//! motion.start(Tween::new(0.0, 10.0, 1.0));
//!
//! // Starting again replaces the in-flight tween.
//! let replaced = motion.start(Tween::new(5.0, 0.0, 0.5));
//! assert!(replaced.is_some());
//!
//! let step = motion.advance(|tween| tween.tick(0.5));
//! assert_eq!(step, Some(Step::Finished(0.0)));
//! assert!(!motion.is_active());
//!
//! let mut wait = Delay::new(0.25);
//! assert!(!wait.tick(0.1));
//! assert!(wait.tick(0.2));
//! assert!(!wait.tick(0.2)); // fires once
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod countdown;
pub mod easing;
pub mod slot;
pub mod tween;

// Re-exports for convenience
pub use clock::{ClockDomain, FrameTime};
pub use countdown::{Countdown, Delay};
pub use easing::Easing;
pub use slot::Slot;
pub use tween::{move_towards, Lerp, Step, Tween, MIN_SPEED};

/// Distance below which two positions are considered coincident.
pub const ARRIVAL_EPSILON: f32 = 1e-3;
