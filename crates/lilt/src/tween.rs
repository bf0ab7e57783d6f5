//! Interpolation sequences.
//!
//! A [`Tween`] moves a value from `from` to `to` over a fixed duration. It is
//! advanced explicitly with [`Tween::tick`] and always lands exactly on `to`
//! when it finishes, so repeated out-and-back motions never accumulate drift.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Lower bound applied to speeds before dividing by them.
pub const MIN_SPEED: f32 = 1e-4;

/// Values that can be linearly interpolated.
pub trait Lerp: Copy {
    /// Interpolates from `self` toward `to` by factor `t` (unclamped).
    #[must_use]
    fn lerp_to(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp_to(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Vec2 {
    fn lerp_to(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

impl Lerp for Vec3 {
    fn lerp_to(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

/// Result of advancing a sequence by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Step<T> {
    /// The sequence is still in flight; carries the current value.
    Running(T),
    /// The sequence completed on this tick; carries the final value.
    Finished(T),
}

impl<T: Copy> Step<T> {
    /// The value produced by this tick.
    #[must_use]
    pub fn value(&self) -> T {
        match self {
            Self::Running(value) | Self::Finished(value) => *value,
        }
    }

    /// Whether the sequence completed on this tick.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Interpolation of a value over a fixed duration.
///
/// # Example
///
/// ```
/// use lilt::{Step, Tween};
/// use glam::Vec2;
///
/// let mut tween = Tween::new(Vec2::ZERO, Vec2::new(4.0, 0.0), 1.0);
/// assert_eq!(tween.tick(0.25), Step::Running(Vec2::new(1.0, 0.0)));
/// assert_eq!(tween.tick(1.0), Step::Finished(Vec2::new(4.0, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween<T> {
    from: T,
    to: T,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl<T: Lerp> Tween<T> {
    /// Creates a linear tween. Non-positive durations finish on the first tick.
    #[must_use]
    pub fn new(from: T, to: T, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing: Easing::Linear,
        }
    }

    /// Replaces the easing curve.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Advances by `dt` seconds and returns the interpolated value.
    pub fn tick(&mut self, dt: f32) -> Step<T> {
        self.elapsed += dt.max(0.0);
        let progress = self.progress();
        if progress >= 1.0 {
            Step::Finished(self.to)
        } else {
            Step::Running(self.from.lerp_to(self.to, self.easing.apply(progress)))
        }
    }

    /// Normalized time in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Whether the tween has reached its end.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Start value.
    #[must_use]
    pub fn origin(&self) -> T {
        self.from
    }

    /// End value.
    #[must_use]
    pub fn target(&self) -> T {
        self.to
    }

    /// Total duration in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl Tween<Vec2> {
    /// A linear tween whose duration is `distance / speed`, i.e. constant speed.
    ///
    /// Speeds below [`MIN_SPEED`] are raised to it.
    #[must_use]
    pub fn at_speed(from: Vec2, to: Vec2, speed: f32) -> Self {
        let duration = from.distance(to) / speed.max(MIN_SPEED);
        Self::new(from, to, duration)
    }
}

/// Moves `current` toward `target` by at most `max_delta`, landing exactly on
/// `target` when it is within reach.
///
/// # Example
///
/// ```
/// use lilt::move_towards;
/// use glam::Vec2;
///
/// let next = move_towards(Vec2::ZERO, Vec2::new(10.0, 0.0), 3.0);
/// assert_eq!(next, Vec2::new(3.0, 0.0));
/// assert_eq!(move_towards(next, Vec2::new(4.0, 0.0), 3.0), Vec2::new(4.0, 0.0));
/// ```
#[must_use]
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let offset = target - current;
    let distance = offset.length();
    if distance <= max_delta.max(0.0) || distance == 0.0 {
        target
    } else {
        current + offset / distance * max_delta.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod tween_tests {
        use super::*;

        #[test]
        fn zero_duration_finishes_immediately() {
            let mut tween = Tween::new(1.0_f32, 5.0, 0.0);
            assert_eq!(tween.tick(0.0), Step::Finished(5.0));
        }

        #[test]
        fn lands_exactly_on_target() {
            let target = Vec2::new(0.3, -7.1);
            let mut tween = Tween::new(Vec2::new(1.7, 2.9), target, 0.37);
            let mut last = tween.tick(0.0);
            while !last.is_finished() {
                last = tween.tick(1.0 / 60.0);
            }
            assert_eq!(last.value(), target);
        }

        #[test]
        fn easing_shapes_intermediate_values() {
            let mut tween = Tween::new(0.0_f32, 1.0, 1.0).with_easing(Easing::EaseIn);
            let value = tween.tick(0.5).value();
            assert!((value - 0.25).abs() < 1e-6);
        }

        #[test]
        fn at_speed_uses_distance_over_speed() {
            let tween = Tween::at_speed(Vec2::ZERO, Vec2::new(6.0, 8.0), 5.0);
            assert!((tween.duration() - 2.0).abs() < 1e-6);
        }

        #[test]
        fn at_speed_guards_zero_speed() {
            let tween = Tween::at_speed(Vec2::ZERO, Vec2::X, 0.0);
            assert!(tween.duration().is_finite());
        }

        #[test]
        fn vec3_tweens_interpolate_componentwise() {
            let mut tween = Tween::new(Vec3::ONE, Vec3::ZERO, 1.0);
            assert_eq!(tween.tick(0.5).value(), Vec3::splat(0.5));
        }
    }

    mod move_towards_tests {
        use super::*;

        #[test]
        fn never_overshoots() {
            let target = Vec2::new(1.0, 1.0);
            let next = move_towards(Vec2::ZERO, target, 100.0);
            assert_eq!(next, target);
        }

        #[test]
        fn moves_at_constant_rate() {
            let mut position = Vec2::ZERO;
            let target = Vec2::new(0.0, 10.0);
            for _ in 0..4 {
                let next = move_towards(position, target, 2.0);
                assert!((next.distance(position) - 2.0).abs() < 1e-5);
                position = next;
            }
        }

        #[test]
        fn zero_delta_stays_put() {
            let start = Vec2::new(3.0, 4.0);
            assert_eq!(move_towards(start, Vec2::ZERO, 0.0), start);
        }
    }
}
