use flock_data::{Agent, AgentId, DVec2, Group, GroupTable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Render-facing view of one agent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub group: Group,
    pub position: DVec2,
    pub velocity: DVec2,
    pub heading: f64,
    pub energy: f64,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            group: agent.group,
            position: agent.position,
            velocity: agent.velocity,
            heading: agent.heading,
            energy: agent.energy,
        }
    }
}

/// Events of the tick that produced a snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub births: usize,
    pub deaths_predation: usize,
    pub deaths_starvation: usize,
    pub deaths_age: usize,
    pub capacity_rejections: usize,
    pub dropped_non_finite: usize,
}

/// Immutable state published after a committed tick.
///
/// Snapshots are handed out as `Arc<WorldSnapshot>`; a renderer may keep one
/// for as long as it likes while the simulation moves on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    /// Simulated seconds since the population was seeded.
    pub time: f64,
    pub agents: Arc<[AgentSnapshot]>,
    pub stats: TickStats,
    pub group_counts: GroupTable<usize>,
    pub width: f64,
    pub height: f64,
    /// Fingerprint of the parameters the tick ran with.
    pub fingerprint: String,
}

impl WorldSnapshot {
    pub fn capture(
        tick: u64,
        time: f64,
        agents: &[Agent],
        stats: TickStats,
        width: f64,
        height: f64,
        fingerprint: &str,
    ) -> Self {
        let mut group_counts = GroupTable::<usize>::default();
        for agent in agents {
            group_counts[agent.group] += 1;
        }
        Self {
            tick,
            time,
            agents: agents.iter().map(AgentSnapshot::from).collect(),
            stats,
            group_counts,
            width,
            height,
            fingerprint: fingerprint.to_string(),
        }
    }

    pub fn population(&self) -> usize {
        self.agents.len()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
