//! Physics components attached to scene entities.
//!
//! Only one component lives here today: the [`Body`]. Colliders are defined
//! with the rest of the collision code in [`crate::collision`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// How a body's position is driven.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Integrated from velocity and gravity each fixed step.
    #[default]
    Dynamic,
    /// Positioned directly by a mover; ignores gravity.
    Kinematic,
}

/// Physics body state.
///
/// `simulated` is cleared while a scripted sequence (death, level exit) owns
/// the entity; integration and player control skip the body until it is set
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Linear velocity in units per second.
    pub velocity: Vec2,
    /// Dynamic or kinematic.
    pub kind: BodyKind,
    /// Whether physics integration currently applies to this body.
    pub simulated: bool,
}

impl Body {
    /// A dynamic body at rest.
    #[must_use]
    pub const fn dynamic() -> Self {
        Self {
            velocity: Vec2::ZERO,
            kind: BodyKind::Dynamic,
            simulated: true,
        }
    }

    /// A kinematic body at rest.
    #[must_use]
    pub const fn kinematic() -> Self {
        Self {
            velocity: Vec2::ZERO,
            kind: BodyKind::Kinematic,
            simulated: true,
        }
    }

    /// Stops integration and zeroes velocity.
    pub fn suspend(&mut self) {
        self.simulated = false;
        self.velocity = Vec2::ZERO;
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::dynamic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspend_zeroes_velocity() {
        let mut body = Body::dynamic();
        body.velocity = Vec2::new(3.0, -2.0);
        body.suspend();
        assert!(!body.simulated);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn constructors_set_kind() {
        assert_eq!(Body::dynamic().kind, BodyKind::Dynamic);
        assert_eq!(Body::kinematic().kind, BodyKind::Kinematic);
        assert_eq!(Body::default(), Body::dynamic());
    }
}
