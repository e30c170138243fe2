use crate::config::CompiledParameters;
use crate::lifecycle;
use flock_data::Agent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Starvation,
    Age,
}

/// Natural death check for one agent. Starvation takes precedence when both
/// apply.
pub fn cause_of_death(agent: &Agent, params: &CompiledParameters) -> Option<DeathCause> {
    let cfg = params.lifecycle(agent.group);
    if lifecycle::is_starving(agent, cfg) {
        Some(DeathCause::Starvation)
    } else if lifecycle::is_expired(agent, cfg) {
        Some(DeathCause::Age)
    } else {
        None
    }
}

/// Tallies of a mortality sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MortalityCount {
    pub starved: usize,
    pub aged: usize,
}

/// Marks agents that starved or reached their maximum age as dead.
pub fn sweep(agents: &[Agent], alive: &mut [bool], params: &CompiledParameters) -> MortalityCount {
    let mut count = MortalityCount::default();
    for (agent, alive) in agents.iter().zip(alive.iter_mut()) {
        if !*alive {
            continue;
        }
        match cause_of_death(agent, params) {
            Some(DeathCause::Starvation) => {
                *alive = false;
                count.starved += 1;
            }
            Some(DeathCause::Age) => {
                *alive = false;
                count.aged += 1;
            }
            None => {}
        }
    }
    count
}
