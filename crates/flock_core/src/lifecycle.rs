use crate::config::{CompiledParameters, LifecycleConfig};
use flock_data::{Agent, AgentId, DVec2, Group};
use rand::Rng;
use std::f64::consts::TAU;

/// Uniformly distributed unit vector.
pub fn random_direction<R: Rng>(rng: &mut R) -> DVec2 {
    let angle = rng.gen_range(0.0..TAU);
    DVec2::new(angle.cos(), angle.sin())
}

/// Creates an agent of `group` at `position` moving in a random direction at
/// the group's `initial_speed`, with the group's starting energy.
pub fn create_agent_with_rng<R: Rng>(
    id: AgentId,
    group: Group,
    position: DVec2,
    params: &CompiledParameters,
    rng: &mut R,
) -> Agent {
    let velocity = random_direction(rng) * params.group(group).initial_speed;
    Agent::new(id, group, position, velocity, params.lifecycle(group).initial_energy)
}

/// Creates an agent at a uniformly random position inside the world.
pub fn spawn_random_with_rng<R: Rng>(
    id: AgentId,
    group: Group,
    params: &CompiledParameters,
    rng: &mut R,
) -> Agent {
    let world = params.world();
    let position = DVec2::new(rng.gen_range(0.0..world.width), rng.gen_range(0.0..world.height));
    create_agent_with_rng(id, group, position, params, rng)
}

/// Ages the agent, applies its group's energy rate and runs down the
/// reproduction cooldown.
#[inline]
pub fn metabolize(agent: &mut Agent, dt: f64, cfg: &LifecycleConfig) {
    agent.age += dt;
    agent.energy += cfg.energy_rate * dt;
    agent.reproduction_cooldown = (agent.reproduction_cooldown - dt).max(0.0);
}

pub fn is_starving(agent: &Agent, cfg: &LifecycleConfig) -> bool {
    cfg.starvation_enabled && agent.energy <= cfg.starvation_threshold
}

pub fn is_expired(agent: &Agent, cfg: &LifecycleConfig) -> bool {
    cfg.max_age.is_some_and(|max| agent.age >= max)
}

pub fn can_reproduce(agent: &Agent, cfg: &LifecycleConfig) -> bool {
    cfg.reproduction_enabled
        && agent.energy >= cfg.reproduction_threshold
        && agent.reproduction_cooldown <= 0.0
}
