//! Level descriptions.
//!
//! A level is a JSON document listing simulation settings and named
//! entities. Each entity carries a `type` tag selecting its behavior plus
//! that behavior's config, which takes defaults for anything left out:
//!
//! ```
//! use skyhop_core::level::{Archetype, LevelSpec};
//!
//! let level = LevelSpec::from_json(r#"{
//!     "entities": [
//!         { "name": "floor", "position": [0.0, 0.0], "type": "solid",
//!           "half_extents": [10.0, 0.5] },
//!         { "name": "hero", "position": [0.0, 1.0], "type": "player" },
//!         { "name": "spikes", "position": [4.0, 0.5], "type": "spikes",
//!           "config": { "retract_delay": 2.0 } },
//!         { "name": "spike trigger", "position": [3.0, 1.0], "type": "spike_zone",
//!           "spikes": "spikes" }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(level.entities.len(), 4);
//! assert!(matches!(level.entities[2].archetype, Archetype::Spikes { .. }));
//! ```
//!
//! Names must be unique, and every name a spike zone refers to must belong
//! to a spikes entity. Platform endpoints are not checked here: a platform
//! without both endpoints is built disabled instead of failing the level.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::Layers;
use crate::config::{
    DeathFloorConfig, MovingBoxConfig, MovingPlatformConfig, PlatformTrapConfig, PlayerConfig,
    PortalConfig, SimulationConfig, SpikesConfig,
};
use crate::error::ConfigError;

fn unit_box() -> Vec2 {
    Vec2::splat(0.5)
}

fn ground_layer() -> Layers {
    Layers::GROUND
}

/// What a level entity is, with its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Archetype {
    /// The player character. Its collider size comes from the config.
    Player {
        /// Controller settings.
        #[serde(default)]
        config: PlayerConfig,
    },
    /// Static geometry.
    Solid {
        /// Collider half extents.
        #[serde(default = "unit_box")]
        half_extents: Vec2,
        /// Collision layer.
        #[serde(default = "ground_layer")]
        layer: Layers,
    },
    /// A continuously moving platform.
    MovingPlatform {
        /// Mover settings.
        #[serde(default)]
        config: MovingPlatformConfig,
        /// Collider half extents.
        #[serde(default = "unit_box")]
        half_extents: Vec2,
    },
    /// A platform that alternates or moves on demand.
    PlatformTrap {
        /// Mover settings.
        #[serde(default)]
        config: PlatformTrapConfig,
        /// Collider half extents.
        #[serde(default = "unit_box")]
        half_extents: Vec2,
    },
    /// Pop-up spikes.
    Spikes {
        /// Spike settings.
        #[serde(default)]
        config: SpikesConfig,
        /// Collider half extents.
        #[serde(default = "unit_box")]
        half_extents: Vec2,
    },
    /// Trigger volume that raises the named spikes.
    SpikeZone {
        /// Name of the spikes entity.
        spikes: String,
        /// Collider half extents.
        #[serde(default = "unit_box")]
        half_extents: Vec2,
    },
    /// Kill volume.
    DeathFloor {
        /// Floor settings.
        #[serde(default)]
        config: DeathFloorConfig,
        /// Collider half extents.
        #[serde(default = "unit_box")]
        half_extents: Vec2,
    },
    /// Box that jumps away when touched.
    MovingBox {
        /// Box settings.
        #[serde(default)]
        config: MovingBoxConfig,
        /// Collider half extents.
        #[serde(default = "unit_box")]
        half_extents: Vec2,
    },
    /// Level exit.
    Portal {
        /// Portal settings.
        #[serde(default)]
        config: PortalConfig,
        /// Collider half extents.
        #[serde(default = "unit_box")]
        half_extents: Vec2,
    },
}

impl Archetype {
    /// Short label used in error messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Player { .. } => "player",
            Self::Solid { .. } => "solid",
            Self::MovingPlatform { .. } => "moving platform",
            Self::PlatformTrap { .. } => "platform trap",
            Self::Spikes { .. } => "spikes",
            Self::SpikeZone { .. } => "spike zone",
            Self::DeathFloor { .. } => "death floor",
            Self::MovingBox { .. } => "moving box",
            Self::Portal { .. } => "portal",
        }
    }
}

/// One named entity in a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Unique name.
    pub name: String,
    /// Spawn position. Platforms with both endpoints start at their first
    /// endpoint instead.
    #[serde(default)]
    pub position: Vec2,
    /// Behavior and settings.
    #[serde(flatten)]
    pub archetype: Archetype,
}

/// A whole level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSpec {
    /// Stepping settings.
    pub simulation: SimulationConfig,
    /// Entities, spawned in order.
    pub entities: Vec<EntitySpec>,
}

impl LevelSpec {
    /// Parses and validates a level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed input, otherwise whatever
    /// [`validate`](Self::validate) reports.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Serializes the level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks names, references and every component config.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DuplicateName`] if two entities share a name
    /// - [`ConfigError::UnknownReference`] if a spike zone names something
    ///   that is not a spikes entity
    /// - [`ConfigError::InvalidValue`] for out-of-range settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;

        let mut by_name: BTreeMap<&str, &Archetype> = BTreeMap::new();
        for entity in &self.entities {
            if by_name
                .insert(entity.name.as_str(), &entity.archetype)
                .is_some()
            {
                return Err(ConfigError::DuplicateName(entity.name.clone()));
            }
        }

        for entity in &self.entities {
            match &entity.archetype {
                Archetype::Player { config } => config.validate()?,
                Archetype::Solid { .. } => {}
                Archetype::MovingPlatform { config, .. } => config.validate()?,
                Archetype::PlatformTrap { config, .. } => config.validate()?,
                Archetype::Spikes { config, .. } => config.validate()?,
                Archetype::SpikeZone { spikes, .. } => {
                    if !matches!(by_name.get(spikes.as_str()), Some(Archetype::Spikes { .. })) {
                        return Err(ConfigError::UnknownReference {
                            from: entity.name.clone(),
                            to: spikes.clone(),
                        });
                    }
                }
                Archetype::DeathFloor { config, .. } => config.validate()?,
                Archetype::MovingBox { config, .. } => config.validate()?,
                Archetype::Portal { config, .. } => config.validate()?,
            }
        }
        Ok(())
    }
}
