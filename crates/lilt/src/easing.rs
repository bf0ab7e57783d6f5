//! Easing curves mapping normalized time to normalized progress.

use serde::{Deserialize, Serialize};

/// Shape of an interpolation over normalized time `t` in `[0, 1]`.
///
/// Every built-in curve maps 0 to 0 and 1 to 1. A [`Easing::Custom`] curve is
/// any plain function; it is not serializable and is skipped by serde.
///
/// # Example
///
/// ```
/// use lilt::Easing;
///
/// assert_eq!(Easing::Linear.apply(0.25), 0.25);
/// assert_eq!(Easing::EaseInOut.apply(0.5), 0.5);
/// assert!(Easing::EaseInOut.apply(0.1) < 0.1);
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant rate.
    #[default]
    Linear,
    /// Cubic Hermite with flat tangents at both ends (`3t² - 2t³`).
    EaseInOut,
    /// Quadratic acceleration from rest.
    EaseIn,
    /// Quadratic deceleration to rest.
    EaseOut,
    /// A caller-supplied curve.
    #[serde(skip)]
    Custom(fn(f32) -> f32),
}

impl Easing {
    /// Evaluates the curve at `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseInOut => t * t * (3.0 - 2.0 * t),
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::Custom(curve) => curve(t),
        }
    }
}

impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Linear, Self::Linear)
            | (Self::EaseInOut, Self::EaseInOut)
            | (Self::EaseIn, Self::EaseIn)
            | (Self::EaseOut, Self::EaseOut) => true,
            (Self::Custom(a), Self::Custom(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILT_IN: [Easing; 4] = [
        Easing::Linear,
        Easing::EaseInOut,
        Easing::EaseIn,
        Easing::EaseOut,
    ];

    #[test]
    fn built_in_curves_hit_endpoints() {
        for easing in BUILT_IN {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn built_in_curves_are_monotone() {
        for easing in BUILT_IN {
            let mut previous = 0.0;
            for i in 0..=100 {
                #[allow(clippy::cast_precision_loss)]
                let value = easing.apply(i as f32 / 100.0);
                assert!(value >= previous - 1e-6, "{easing:?} decreased at step {i}");
                previous = value;
            }
        }
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-2.0), 0.0);
        assert_eq!(Easing::Linear.apply(3.0), 1.0);
    }

    #[test]
    fn custom_curve_is_used() {
        fn step(t: f32) -> f32 {
            if t < 0.5 {
                0.0
            } else {
                1.0
            }
        }
        let easing = Easing::Custom(step);
        assert_eq!(easing.apply(0.4), 0.0);
        assert_eq!(easing.apply(0.6), 1.0);
        assert_eq!(easing, Easing::Custom(step));
        assert_ne!(easing, Easing::Linear);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&Easing::EaseInOut).unwrap();
        assert_eq!(json, "\"ease_in_out\"");
        let parsed: Easing = serde_json::from_str("\"ease_out\"").unwrap();
        assert_eq!(parsed, Easing::EaseOut);
    }
}
