//! Crate-level scenario and determinism tests.
//!
//! Unit tests live next to the code they cover. The tests here drive a whole
//! [`Simulation`](crate::simulation::Simulation) frame by frame:
//!
//! - `integration.rs`: end-to-end scenarios (coyote time, spikes, death
//!   floors, platforms, the portal, pause)
//! - `determinism.rs`: identical runs from identical seeded input scripts
//! - `helpers.rs`: recording collaborators and scenario factories

mod helpers;

// Re-export for convenience
pub use helpers::*;
