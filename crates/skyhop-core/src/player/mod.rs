//! The player character: ground sensing and the movement controller.
//!
//! - [`GroundSensor`]: grounded/airborne classification from a circle sweep
//! - [`PlayerController`]: coyote time, jump buffering, horizontal motion,
//!   facing and running state
//!
//! The controller never touches the scene directly. The simulation hands it
//! a copy of the player's [`Body`](crate::entity::Body), the current
//! position and a [`ShapeCast`](crate::collision::ShapeCast) view of the
//! world, then writes the body back.

pub mod controller;
pub mod ground;

pub use controller::{Facing, GroundState, JumpRequest, PlayerController};
pub use ground::{GroundProbe, GroundSample, GroundSensor};
