//! # Flock Core
//!
//! The flocking simulation engine: a deterministic, data-parallel boids
//! simulation with several interacting groups.
//!
//! This crate contains:
//! - Spatial hashing for sub-linear neighbor queries (Euclidean or toroidal)
//! - Neighborhood queries filtered by group relevance
//! - The steering model (separation, alignment, cohesion, flee, chase, avoid)
//! - Motion integration with wrap / bounce / avoid boundaries
//! - Population dynamics (predation, starvation, aging, reproduction)
//! - The tick controller publishing immutable snapshots
//!
//! ## Architecture
//!
//! Agents live in an id-sorted arena. Each tick the controller rebuilds the
//! spatial hash, computes every agent's next state in parallel with Rayon
//! (each worker writes only its own output slot), then applies population
//! dynamics single-threaded before swapping buffers and publishing.
//!
//! ## Example
//!
//! ```
//! use flock_core::config::SimulationParameters;
//! use flock_core::simulation::{PopulationSeed, Simulation};
//! use flock_data::GroupTable;
//!
//! let mut sim = Simulation::new(SimulationParameters::default()).unwrap();
//! sim.seed(PopulationSeed::Random {
//!     counts: GroupTable { boid: 50, chaser: 2 },
//! })
//! .unwrap();
//! let snapshot = sim.advance(1.0 / 60.0).unwrap();
//! assert_eq!(snapshot.tick, 1);
//! ```

/// Simulation parameters, validation and the compiled interaction matrix
pub mod config;
/// Error taxonomy of the engine
pub mod error;
/// Motion integration and boundary handling
pub mod integrator;
/// Agent creation and per-tick metabolism
pub mod lifecycle;
/// Tick metrics and structured logging setup
pub mod metrics;
/// Group-aware neighbor lookup over the spatial hash
pub mod neighborhood;
/// The tick controller
pub mod simulation;
/// Immutable world snapshots for renderers
pub mod snapshot;
/// Uniform-grid spatial hash with toroidal support
pub mod spatial_hash;
/// Flocking steering rules
pub mod steering;
/// Population dynamics (predation, mortality, reproduction)
pub mod systems;

pub use config::{BoundaryMode, CompiledParameters, SimulationParameters};
pub use error::{ConfigError, SimError};
pub use metrics::{init_logging, Metrics};
pub use simulation::{AgentSeed, ParameterHandle, PopulationSeed, Simulation};
pub use snapshot::{AgentSnapshot, TickStats, WorldSnapshot};
