//! Host-side glue for the flock engine: the headless runner used by the
//! `flock` binary and the integration tests.

pub mod runner;

pub use flock_core;
pub use flock_data;
