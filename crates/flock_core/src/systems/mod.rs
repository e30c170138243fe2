//! Population dynamics applied after the per-agent phase.
//!
//! Everything here runs single threaded over the id-sorted back buffer, so
//! kill order and birth ids are reproducible.

pub mod mortality;
pub mod population;
pub mod predation;
pub mod reproduction;

pub use population::{apply, PopulationContext, PopulationOutcome};
