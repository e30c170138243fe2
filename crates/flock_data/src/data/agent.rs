use super::group::Group;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an agent.
///
/// Ids are handed out in increasing order and never reused within one
/// simulation lifetime, so sorting by id gives a reproducible slot order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single simulated boid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub group: Group,
    pub position: DVec2,
    pub velocity: DVec2,
    /// Orientation in radians, cached for rendering.
    pub heading: f64,
    pub energy: f64,
    /// Seconds since birth.
    pub age: f64,
    pub generation: u32,
    #[serde(default)]
    pub parent: Option<AgentId>,
    /// Seconds left before the agent may reproduce again.
    #[serde(default)]
    pub reproduction_cooldown: f64,
}

impl Agent {
    pub fn new(id: AgentId, group: Group, position: DVec2, velocity: DVec2, energy: f64) -> Self {
        Self {
            id,
            group,
            position,
            velocity,
            heading: heading_of(velocity, 0.0),
            energy,
            age: 0.0,
            generation: 0,
            parent: None,
            reproduction_cooldown: 0.0,
        }
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// True when every numeric field holds a finite value.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.heading.is_finite()
            && self.energy.is_finite()
            && self.age.is_finite()
            && self.reproduction_cooldown.is_finite()
    }
}

/// Heading of `velocity`, or `fallback` when the agent is at rest.
#[inline]
pub fn heading_of(velocity: DVec2, fallback: f64) -> f64 {
    if velocity == DVec2::ZERO {
        fallback
    } else {
        velocity.y.atan2(velocity.x)
    }
}
