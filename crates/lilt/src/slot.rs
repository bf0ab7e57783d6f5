//! Single-occupancy holder for in-flight sequences.
//!
//! A [`Slot`] enforces the rule that an entity runs at most one sequence of a
//! given purpose at a time. Starting a new sequence replaces the old state
//! object outright, so a cancelled sequence can never write again.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::tween::Step;

/// Holds at most one in-flight sequence of type `S`.
///
/// # Example
///
/// ```
/// use lilt::{Delay, Slot, Step};
///
/// let mut retract: Slot<Delay> = Slot::empty();
/// retract.start(Delay::new(1.5));
/// retract.advance(|d| if d.tick(0.5) { Step::Finished(()) } else { Step::Running(()) });
///
/// // Re-arming restarts the wait from zero.
/// retract.start(Delay::new(1.5));
/// assert_eq!(retract.get().map(Delay::elapsed), Some(0.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot<S> {
    current: Option<S>,
    generation: u64,
}

impl<S> Default for Slot<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S> Slot<S> {
    /// An empty slot.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }

    /// Starts `sequence`, returning the sequence it replaced, if any.
    pub fn start(&mut self, sequence: S) -> Option<S> {
        let replaced = self.current.replace(sequence);
        self.generation += 1;
        if replaced.is_some() {
            trace!(generation = self.generation, "replaced in-flight sequence");
        }
        replaced
    }

    /// Cancels the in-flight sequence, returning it.
    pub fn cancel(&mut self) -> Option<S> {
        self.current.take()
    }

    /// Whether a sequence is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// The in-flight sequence.
    #[must_use]
    pub fn get(&self) -> Option<&S> {
        self.current.as_ref()
    }

    /// Mutable access to the in-flight sequence.
    pub fn get_mut(&mut self) -> Option<&mut S> {
        self.current.as_mut()
    }

    /// Number of sequences started in this slot so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advances the in-flight sequence with `step`.
    ///
    /// When `step` reports [`Step::Finished`] the slot is emptied. Returns
    /// `None` when the slot was empty.
    pub fn advance<T>(&mut self, step: impl FnOnce(&mut S) -> Step<T>) -> Option<Step<T>> {
        let sequence = self.current.as_mut()?;
        let result = step(sequence);
        if matches!(result, Step::Finished(_)) {
            self.current = None;
        }
        Some(result)
    }
}
