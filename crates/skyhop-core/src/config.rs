//! Per-component configuration.
//!
//! Every struct deserializes with `#[serde(default)]`, so a level file only
//! lists the settings it changes. Defaults match the tuned values the levels
//! were authored against. Each config has a `validate` method that rejects
//! negative durations and speeds; endpoints are checked when a mover is
//! built, because a missing endpoint disables the component instead of
//! failing the level.

use glam::Vec2;
use lilt::Easing;
use serde::{Deserialize, Serialize};

use crate::collision::Layers;
use crate::error::ConfigError;
use crate::hazard::RetriggerPolicy;
use crate::motion::CarryMode;
use crate::services::ClipId;

/// Fixed physics timestep (60 Hz).
pub const FIXED_DT: f32 = 1.0 / 60.0;

// =============================================================================
// Simulation
// =============================================================================

/// Global stepping settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed physics timestep in seconds.
    pub fixed_dt: f32,
    /// Gravity applied to dynamic bodies.
    pub gravity: Vec2,
    /// Maximum fixed steps run per presentation frame; further backlog is
    /// dropped.
    pub max_substeps: u32,
    /// Inflation applied to colliders when detecting contacts, so resting
    /// contact counts as touching.
    pub contact_skin: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_dt: FIXED_DT,
            gravity: Vec2::new(0.0, -30.0),
            max_substeps: 8,
            contact_skin: 0.02,
        }
    }
}

impl SimulationConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a non-positive timestep, zero
    /// substeps or a negative skin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(ConfigError::InvalidValue {
                component: "simulation",
                field: "fixed_dt",
                expected: "a positive duration",
                value: self.fixed_dt,
            });
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::InvalidValue {
                component: "simulation",
                field: "max_substeps",
                expected: "at least 1",
                value: 0.0,
            });
        }
        ConfigError::check_non_negative("simulation", "contact_skin", self.contact_skin)
    }
}

// =============================================================================
// Player
// =============================================================================

/// Downward ground probe attached to the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundProbeConfig {
    /// Probe anchor relative to the player position.
    pub offset: Vec2,
    /// Circle radius.
    pub radius: f32,
    /// Sweep distance.
    pub distance: f32,
    /// Layers that count as ground.
    pub mask: Layers,
}

impl Default for GroundProbeConfig {
    fn default() -> Self {
        Self {
            offset: Vec2::new(0.0, -0.5),
            radius: 0.2,
            distance: 0.15,
            mask: Layers::walkable(),
        }
    }
}

/// Particles and sound used when the player dies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathEffectsConfig {
    /// Death sound.
    pub clip: Option<ClipId>,
    /// Death sound volume.
    pub volume: f32,
    /// Whether a particle burst is spawned.
    pub particles: bool,
}

impl Default for DeathEffectsConfig {
    fn default() -> Self {
        Self {
            clip: None,
            volume: 1.0,
            particles: true,
        }
    }
}

/// Player movement, jump and audio settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Horizontal speed at full input.
    pub move_speed: f32,
    /// Vertical velocity set by a jump.
    pub jump_force: f32,
    /// Grace window after leaving the ground.
    pub coyote_time: f32,
    /// How long a jump press is remembered.
    pub jump_buffer_time: f32,
    /// Ground probe; `None` leaves the player permanently airborne.
    pub probe: Option<GroundProbeConfig>,
    /// Speed above which the player counts as running.
    pub footstep_threshold: f32,
    /// Half extents of the player collider.
    pub half_extents: Vec2,
    /// Jump sound.
    pub jump_clip: Option<ClipId>,
    /// Jump sound volume.
    pub jump_volume: f32,
    /// Landing sound.
    pub land_clip: Option<ClipId>,
    /// Landing sound volume.
    pub land_volume: f32,
    /// Effects used instead of a hazard's own sound when this player dies.
    pub death_effects: Option<DeathEffectsConfig>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            jump_force: 14.0,
            coyote_time: 0.15,
            jump_buffer_time: 0.1,
            probe: Some(GroundProbeConfig::default()),
            footstep_threshold: 0.1,
            half_extents: Vec2::new(0.4, 0.5),
            jump_clip: None,
            jump_volume: 0.9,
            land_clip: None,
            land_volume: 0.8,
            death_effects: None,
        }
    }
}

impl PlayerConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative speeds or durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("player", "move_speed", self.move_speed)?;
        ConfigError::check_duration("player", "coyote_time", self.coyote_time)?;
        ConfigError::check_duration("player", "jump_buffer_time", self.jump_buffer_time)?;
        ConfigError::check_non_negative("player", "footstep_threshold", self.footstep_threshold)?;
        if let Some(probe) = &self.probe {
            ConfigError::check_non_negative("player", "probe.radius", probe.radius)?;
            ConfigError::check_non_negative("player", "probe.distance", probe.distance)?;
        }
        Ok(())
    }
}

// =============================================================================
// Platforms
// =============================================================================

/// Continuously moving platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingPlatformConfig {
    /// Start point.
    pub start: Option<Vec2>,
    /// End point.
    pub end: Option<Vec2>,
    /// Speed in units per second.
    pub speed: f32,
    /// Keep moving after the first cycle.
    pub looping: bool,
    /// Reverse at each end instead of snapping back to the start.
    pub ping_pong: bool,
    /// Wait at each end in seconds.
    pub dwell: f32,
    /// How riders are carried.
    pub carry: CarryMode,
}

impl Default for MovingPlatformConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            speed: 3.0,
            looping: true,
            ping_pong: true,
            dwell: 0.1,
            carry: CarryMode::DeltaPropagation,
        }
    }
}

impl MovingPlatformConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a negative speed or dwell.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("moving platform", "speed", self.speed)?;
        ConfigError::check_duration("moving platform", "dwell", self.dwell)
    }
}

/// Platform that alternates between two points, or moves one leg on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformTrapConfig {
    /// Start point.
    pub start: Option<Vec2>,
    /// End point.
    pub end: Option<Vec2>,
    /// Speed in units per second.
    pub speed: f32,
    /// Loop from the start; otherwise move only when triggered.
    pub always_moving: bool,
    /// Wait at each end in seconds.
    pub dwell: f32,
    /// Begin at the end point and travel toward the start.
    pub start_at_end: bool,
    /// How riders are carried.
    pub carry: CarryMode,
}

impl Default for PlatformTrapConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            speed: 2.0,
            always_moving: true,
            dwell: 0.2,
            start_at_end: false,
            carry: CarryMode::Reparent,
        }
    }
}

impl PlatformTrapConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a negative speed or dwell.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("platform trap", "speed", self.speed)?;
        ConfigError::check_duration("platform trap", "dwell", self.dwell)
    }
}

// =============================================================================
// Hazards
// =============================================================================

/// Pop-up spikes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikesConfig {
    /// How far the spikes rise.
    pub rise_distance: f32,
    /// Rise duration.
    pub rise_duration: f32,
    /// Lower duration.
    pub lower_duration: f32,
    /// Lower automatically after `retract_delay`.
    pub auto_retract: bool,
    /// Delay before retracting.
    pub retract_delay: f32,
    /// Victim shrink duration.
    pub shrink_duration: f32,
    /// Kill on trigger contacts; otherwise on solid collisions.
    pub damage_on_trigger: bool,
    /// Minimum delay before the restart request.
    pub death_delay: f32,
    /// Hazard death sound.
    pub clip: Option<ClipId>,
    /// Hazard death sound volume.
    pub volume: f32,
}

impl Default for SpikesConfig {
    fn default() -> Self {
        Self {
            rise_distance: 1.0,
            rise_duration: 0.15,
            lower_duration: 0.4,
            auto_retract: true,
            retract_delay: 1.5,
            shrink_duration: 0.2,
            damage_on_trigger: true,
            death_delay: 0.25,
            clip: None,
            volume: 1.0,
        }
    }
}

impl SpikesConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_duration("spikes", "rise_duration", self.rise_duration)?;
        ConfigError::check_duration("spikes", "lower_duration", self.lower_duration)?;
        ConfigError::check_duration("spikes", "retract_delay", self.retract_delay)?;
        ConfigError::check_duration("spikes", "shrink_duration", self.shrink_duration)?;
        ConfigError::check_duration("spikes", "death_delay", self.death_delay)
    }
}

/// Kill volume below the level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathFloorConfig {
    /// Fire at most once per level load.
    pub one_shot: bool,
    /// Delay before the restart request.
    pub death_delay: f32,
    /// Hazard death sound.
    pub clip: Option<ClipId>,
    /// Hazard death sound volume.
    pub volume: f32,
}

impl Default for DeathFloorConfig {
    fn default() -> Self {
        Self {
            one_shot: true,
            death_delay: 0.15,
            clip: None,
            volume: 1.0,
        }
    }
}

impl DeathFloorConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a negative delay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_duration("death floor", "death_delay", self.death_delay)
    }
}

/// Box that jumps away and changes scale when touched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingBoxConfig {
    /// Displacement applied on contact (before the multiplier).
    pub offset: Vec2,
    /// Multiplier applied to `offset`.
    pub offset_multiplier: f32,
    /// Travel speed in units per second.
    pub units_per_second: f32,
    /// What a contact does while a move is in flight.
    pub retrigger: RetriggerPolicy,
    /// Per-axis multiplier applied to the box scale on contact.
    pub scale_multiplier: Vec2,
    /// React to each entity only once.
    pub affect_once_per_object: bool,
    /// Return to the original position and scale after `return_delay`.
    pub auto_return: bool,
    /// Delay before returning.
    pub return_delay: f32,
    /// Speed multiplier for the return trip.
    pub return_speed_multiplier: f32,
}

impl Default for MovingBoxConfig {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            offset_multiplier: 1.0,
            units_per_second: 15.0,
            retrigger: RetriggerPolicy::IgnoreWhileMoving,
            scale_multiplier: Vec2::ONE,
            affect_once_per_object: true,
            auto_return: false,
            return_delay: 1.0,
            return_speed_multiplier: 1.0,
        }
    }
}

impl MovingBoxConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative speeds or delays.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("moving box", "units_per_second", self.units_per_second)?;
        ConfigError::check_non_negative(
            "moving box",
            "return_speed_multiplier",
            self.return_speed_multiplier,
        )?;
        ConfigError::check_duration("moving box", "return_delay", self.return_delay)
    }
}

// =============================================================================
// Portal
// =============================================================================

/// End-of-level portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Snap the player to the portal center.
    pub move_player_to_portal: bool,
    /// Parent the player to the portal.
    pub parent_player_to_portal: bool,
    /// Player shrink duration (unscaled time).
    pub shrink_duration: f32,
    /// Shrink curve.
    pub shrink_easing: Easing,
    /// Wait after the shrink before completing the level (scaled time).
    pub animation_duration: f32,
    /// Activation sound.
    pub sound: Option<ClipId>,
    /// Activation sound volume.
    pub volume: f32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            move_player_to_portal: true,
            parent_player_to_portal: true,
            shrink_duration: 0.2,
            shrink_easing: Easing::EaseInOut,
            animation_duration: 1.0,
            sound: None,
            volume: 1.0,
        }
    }
}

impl PortalConfig {
    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_duration("portal", "shrink_duration", self.shrink_duration)?;
        ConfigError::check_duration("portal", "animation_duration", self.animation_duration)
    }
}
