//! Error types for the flock engine.
//!
//! Configuration problems are rejected before they can touch simulation
//! state. Invariant violations abort a tick without publishing it.

use flock_data::{AgentId, Group};
use thiserror::Error;

/// Rejected parameters or seeds. The previously active configuration stays
/// in effect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A single field failed validation
    #[error("invalid parameter `{field}`: {reason}")]
    Invalid { field: String, reason: String },

    /// The interaction matrix lists the same predator/prey pair twice
    #[error("duplicate predation rule {predator} -> {prey}")]
    DuplicateInteraction { predator: Group, prey: Group },

    /// A seed asks for more agents than the population cap allows
    #[error("seed requests {requested} agents but max_population is {max}")]
    SeedExceedsCapacity { requested: usize, max: usize },

    /// A seeded agent is unusable
    #[error("seed agent {index}: {reason}")]
    InvalidSeed { index: usize, reason: String },

    /// TOML could not be parsed into parameters
    #[error("failed to parse parameters: {0}")]
    Parse(String),
}

impl ConfigError {
    #[must_use]
    pub fn invalid<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// What went wrong when a tick failed its post-step validation.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum InvariantKind {
    #[error("duplicate agent id {0}")]
    DuplicateId(AgentId),
    #[error("agent ids out of order at {0}")]
    UnorderedIds(AgentId),
    #[error("non-finite state on agent {0}")]
    NonFinite(AgentId),
    #[error("agent {id} exceeds its speed limit ({speed} > {max_speed})")]
    SpeedLimit {
        id: AgentId,
        speed: f64,
        max_speed: f64,
    },
}

/// Failures surfaced by [`crate::simulation::Simulation::advance`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `dt` must be finite and non-negative
    #[error("invalid time step: {0}")]
    InvalidTimeStep(f64),

    /// The tick produced a corrupted population and was discarded
    #[error("invariant violated at tick {tick}: {kind}")]
    InvariantViolation { tick: u64, kind: InvariantKind },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
