//! Kinematic motion: endpoint movers, moving platforms and their riders.
//!
//! - [`KinematicMover`]: constant-speed A to B movement with dwell and
//!   end-of-leg policies
//! - [`PassengerTable`]: which platform carries which rider
//! - [`Platform`]: a mover wired to the passenger table
//!
//! Platforms run every fixed step. Dwell times are measured on the fixed
//! clock, so platforms freeze while the simulation is paused.

pub mod carrier;
pub mod mover;
pub mod platform;

pub use carrier::{CarryMode, PassengerTable, Ride};
pub use mover::{KinematicMover, MotionSegment, MoverPolicy, MoverStep};
pub use platform::Platform;
