//! Ground detection from a downward circle sweep.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::{Layers, ShapeCast};
use crate::config::GroundProbeConfig;
use crate::entity::EntityId;

/// Minimum sweep distance; shorter probes are lengthened to this.
pub const MIN_PROBE_DISTANCE: f32 = 0.01;

/// Surfaces whose normal has a smaller vertical component are walls, not
/// ground (roughly 60 degrees from up).
pub const MIN_GROUND_NORMAL_Y: f32 = 0.5;

/// A circle swept straight down from an anchor below the owner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundProbe {
    /// Anchor relative to the owner position.
    pub offset: Vec2,
    /// Circle radius.
    pub radius: f32,
    /// Sweep distance.
    pub distance: f32,
    /// Layers that count as ground.
    pub mask: Layers,
}

impl From<GroundProbeConfig> for GroundProbe {
    fn from(config: GroundProbeConfig) -> Self {
        Self {
            offset: config.offset,
            radius: config.radius,
            distance: config.distance,
            mask: config.mask,
        }
    }
}

/// Result of one ground check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroundSample {
    /// Standing on walkable ground this step.
    pub grounded: bool,
    /// Airborne last step, grounded this step.
    pub landed: bool,
    /// The entity being stood on.
    pub surface: Option<EntityId>,
}

/// Per-step grounded/airborne classifier.
///
/// A sensor without a probe always reports airborne.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundSensor {
    probe: Option<GroundProbe>,
    grounded: bool,
}

impl GroundSensor {
    /// Creates a sensor. `None` disables ground checks entirely.
    #[must_use]
    pub fn new(probe: Option<GroundProbe>) -> Self {
        Self {
            probe,
            grounded: false,
        }
    }

    /// Whether a probe is configured.
    #[must_use]
    pub fn has_probe(&self) -> bool {
        self.probe.is_some()
    }

    /// Grounded state from the last [`sense`](Self::sense).
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Casts the probe from `position` and updates the grounded state.
    pub fn sense<W: ShapeCast + ?Sized>(
        &mut self,
        world: &W,
        position: Vec2,
        owner: EntityId,
    ) -> GroundSample {
        let Some(probe) = self.probe else {
            return GroundSample::default();
        };
        let hit = world
            .circle_cast_down(
                position + probe.offset,
                probe.radius,
                probe.distance.max(MIN_PROBE_DISTANCE),
                probe.mask,
                Some(owner),
            )
            .filter(|hit| hit.normal.y > MIN_GROUND_NORMAL_Y);

        let was_grounded = self.grounded;
        self.grounded = hit.is_some();
        GroundSample {
            grounded: self.grounded,
            landed: self.grounded && !was_grounded,
            surface: hit.map(|hit| hit.entity),
        }
    }
}
