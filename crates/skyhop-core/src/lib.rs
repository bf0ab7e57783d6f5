//! # Skyhop Core
//!
//! Gameplay physics for Skyhop, a 2D platformer.
//!
//! This crate holds the simulation side of the game: the player controller,
//! moving platforms and their riders, hazards and the level exit. Rendering,
//! audio playback, input devices and scene loading live outside and are
//! reached through the traits in [`services`] and the [`events`] log.
//!
//! ## Architecture
//!
//! - **Scene**: entities with transforms, bodies and colliders ([`scene`], [`entity`])
//! - **Behaviors**: per-entity gameplay logic ([`player`], [`motion`], [`hazard`], [`portal`])
//! - **Simulation**: fixed-step physics plus per-frame sequences ([`simulation`])
//!
//! Timed sequences (rises, shrinks, dwells, delays) are explicit state
//! objects from [`lilt`], advanced once per tick on the clock they belong to.
//!
//! ## Usage
//!
//! ```
//! use skyhop_core::level::LevelSpec;
//! use skyhop_core::services::Services;
//! use skyhop_core::simulation::Simulation;
//!
//! let level = LevelSpec::from_json(r#"{
//!     "entities": [
//!         { "name": "floor", "position": [0.0, 0.0], "type": "solid",
//!           "half_extents": [10.0, 0.5] },
//!         { "name": "hero", "position": [0.0, 1.0], "type": "player" }
//!     ]
//! }"#).unwrap();
//!
//! let mut sim = Simulation::from_level(&level, Services::new()).unwrap();
//! sim.advance(1.0 / 60.0);
//! assert_eq!(sim.tick(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export lilt for sequence types in public signatures
pub use lilt;

pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod hazard;
pub mod input;
pub mod level;
pub mod motion;
pub mod player;
pub mod portal;
pub mod scene;
pub mod services;
pub mod simulation;

pub use error::{ConfigError, SceneError};
pub use level::LevelSpec;
pub use simulation::Simulation;

#[cfg(test)]
mod tests;
