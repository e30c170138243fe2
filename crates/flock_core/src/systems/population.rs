use super::{mortality, predation, reproduction};
use crate::config::CompiledParameters;
use crate::spatial_hash::SpatialHash;
use flock_data::{Agent, DVec2};
use rand::Rng;

/// Mutable state the population pass borrows from the controller.
pub struct PopulationContext<'a, R: Rng> {
    /// Reused grid for kill-range lookups.
    pub kill_index: &'a mut SpatialHash,
    pub scratch: &'a mut Vec<usize>,
    pub next_id: &'a mut u64,
    pub rng: &'a mut R,
}

/// What the population pass did this tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationOutcome {
    pub kills: usize,
    pub starved: usize,
    pub aged: usize,
    pub births: usize,
    pub capacity_rejections: usize,
}

impl PopulationOutcome {
    pub fn deaths(&self) -> usize {
        self.kills + self.starved + self.aged
    }
}

/// Applies predation, natural death and reproduction to the
/// post-integration buffer, in that order.
///
/// `agents` must be sorted by id and stays sorted.
pub fn apply<R: Rng>(
    agents: &mut Vec<Agent>,
    params: &CompiledParameters,
    ctx: PopulationContext<'_, R>,
) -> PopulationOutcome {
    let mut outcome = PopulationOutcome::default();
    let mut alive = vec![true; agents.len()];

    if !params.matrix.is_empty() && !agents.is_empty() {
        let world = params.world();
        ctx.kill_index
            .configure(max_kill_radius(params), world.width, world.height, world.metric());
        let positions: Vec<DVec2> = agents.iter().map(|a| a.position).collect();
        ctx.kill_index.build_parallel(&positions);
        let kills = predation::resolve(agents, &mut alive, ctx.kill_index, &params.matrix, ctx.scratch);
        outcome.kills = kills.len();
    }

    let natural = mortality::sweep(agents, &mut alive, params);
    outcome.starved = natural.starved;
    outcome.aged = natural.aged;

    if outcome.deaths() > 0 {
        let mut flags = alive.iter();
        agents.retain(|_| flags.next().copied().unwrap_or(true));
    }

    let offspring = reproduction::reproduce(agents, params, ctx.next_id, ctx.rng);
    outcome.births = offspring.births;
    outcome.capacity_rejections = offspring.capacity_rejections;
    outcome
}

/// Largest kill radius of any rule, used as the kill grid's cell size.
fn max_kill_radius(params: &CompiledParameters) -> f64 {
    params
        .params
        .interactions
        .iter()
        .map(|r| r.kill_radius)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationParameters;
    use flock_data::{AgentId, Group};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn run(agents: &mut Vec<Agent>, params: &CompiledParameters, next_id: &mut u64) -> PopulationOutcome {
        let mut kill_index = SpatialHash::new_empty();
        let mut scratch = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        apply(
            agents,
            params,
            PopulationContext {
                kill_index: &mut kill_index,
                scratch: &mut scratch,
                next_id,
                rng: &mut rng,
            },
        )
    }

    #[test]
    fn test_phases_run_in_order() {
        let params = CompiledParameters::new(SimulationParameters::default()).unwrap();
        let at = |id: u64, group: Group, x: f64, energy: f64| {
            Agent::new(AgentId(id), group, DVec2::new(x, 100.0), DVec2::ZERO, energy)
        };
        let mut agents = vec![
            // Eaten before it could reproduce.
            at(1, Group::Boid, 100.0, 150.0),
            at(2, Group::Chaser, 102.0, 170.0),
            // Starves.
            at(3, Group::Chaser, 800.0, -1.0),
            at(4, Group::Boid, 1500.0, 10.0),
        ];
        let mut next_id = 5;
        let out = run(&mut agents, &params, &mut next_id);

        assert_eq!(out.kills, 1);
        assert_eq!(out.starved, 1);
        assert_eq!(out.aged, 0);
        // The chaser reached 210 energy from the kill and reproduces.
        assert_eq!(out.births, 1);
        let ids: Vec<u64> = agents.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![2, 4, 5]);
        assert_eq!(agents[2].parent, Some(AgentId(2)));
        assert_eq!(next_id, 6);
    }

    #[test]
    fn test_no_rules_no_deaths() {
        let mut raw = SimulationParameters::default();
        raw.interactions.clear();
        raw.lifecycle.chaser.starvation_enabled = false;
        let params = CompiledParameters::new(raw).unwrap();
        let mut agents = vec![
            Agent::new(AgentId(1), Group::Boid, DVec2::new(10.0, 10.0), DVec2::ZERO, 1.0),
            Agent::new(AgentId(2), Group::Chaser, DVec2::new(10.0, 10.0), DVec2::ZERO, -3.0),
        ];
        let mut next_id = 3;
        let out = run(&mut agents, &params, &mut next_id);
        assert_eq!(out, PopulationOutcome::default());
        assert_eq!(agents.len(), 2);
    }
}
