use crate::config::CompiledParameters;
use crate::integrator::confine;
use crate::lifecycle::{self, random_direction};
use flock_data::{Agent, AgentId};
use rand::Rng;

/// Births produced by one reproduction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Offspring {
    pub births: usize,
    /// Eligible parents turned away because the population was full.
    pub capacity_rejections: usize,
}

/// Lets every eligible parent spawn one child.
///
/// `agents` must hold only survivors, sorted by id. Parents are visited in
/// that order; children receive fresh ids from `next_id`, which are larger
/// than any existing id, so appending them keeps the buffer sorted. Children
/// are not eligible as parents in the pass that created them. A parent
/// waits `reproduction_cooldown` seconds before its next birth. Once the
/// population reaches `max_population` further births are skipped and the
/// parent keeps its energy.
pub fn reproduce<R: Rng>(
    agents: &mut Vec<Agent>,
    params: &CompiledParameters,
    next_id: &mut u64,
    rng: &mut R,
) -> Offspring {
    let mut outcome = Offspring::default();
    let max_population = params.world().max_population;
    let parents = agents.len();

    for slot in 0..parents {
        let group = agents[slot].group;
        let cfg = params.lifecycle(group);
        if !lifecycle::can_reproduce(&agents[slot], cfg) {
            continue;
        }
        if agents.len() >= max_population {
            outcome.capacity_rejections += 1;
            continue;
        }

        let parent = &mut agents[slot];
        parent.energy = cfg.initial_energy;
        parent.reproduction_cooldown = cfg.reproduction_cooldown;
        let parent_id = parent.id;
        let generation = parent.generation + 1;
        // sqrt keeps the spawn points uniform over the disc.
        let distance = cfg.spawn_radius * rng.gen::<f64>().sqrt();
        let position = confine(parent.position + random_direction(rng) * distance, params.world());

        let id = AgentId(*next_id);
        *next_id += 1;
        let mut child = lifecycle::create_agent_with_rng(id, group, position, params, rng);
        child.generation = generation;
        child.parent = Some(parent_id);
        agents.push(child);
        outcome.births += 1;
    }
    outcome
}
