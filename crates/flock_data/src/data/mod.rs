//! Core data structures for the flock simulation.

pub mod agent;
pub mod group;
