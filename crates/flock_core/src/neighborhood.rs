//! Group-aware neighbor lookup.
//!
//! A pure read over the spatial hash and the population buffer it was built
//! from. Results come back sorted by slot, and slots are sorted by agent id,
//! so every consumer accumulates neighbors in the same order on every run.

use crate::config::CompiledParameters;
use crate::spatial_hash::SpatialHash;
use flock_data::{Agent, DVec2};

/// Another agent as seen from the querying agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub slot: usize,
    /// Shortest displacement from the querying agent to this neighbor.
    pub offset: DVec2,
    pub distance: f64,
}

/// Fills `out` with the agents that influence `agents[slot]`.
///
/// Keeps agents within the querying group's perception radius (under the
/// index metric) that either share its group or take part in a predation
/// rule with it. The agent itself is never included. `scratch` is reused
/// between calls to avoid allocation.
pub fn neighbors_into(
    index: &SpatialHash,
    agents: &[Agent],
    slot: usize,
    params: &CompiledParameters,
    scratch: &mut Vec<usize>,
    out: &mut Vec<Neighbor>,
) {
    out.clear();
    let agent = &agents[slot];
    let radius = params.group(agent.group).perception_radius;
    let metric = index.metric();

    index.query_into(agent.position, radius, scratch);
    for &other_slot in scratch.iter() {
        if other_slot == slot {
            continue;
        }
        let other = &agents[other_slot];
        if !params.matrix.is_relevant(agent.group, other.group) {
            continue;
        }
        let offset = metric.offset(agent.position, other.position);
        out.push(Neighbor {
            slot: other_slot,
            offset,
            distance: offset.length(),
        });
    }
}

/// Allocating convenience wrapper around [`neighbors_into`].
pub fn neighbors(
    index: &SpatialHash,
    agents: &[Agent],
    slot: usize,
    params: &CompiledParameters,
) -> Vec<Neighbor> {
    let mut scratch = Vec::new();
    let mut out = Vec::new();
    neighbors_into(index, agents, slot, params, &mut scratch, &mut out);
    out
}
