pub mod macros;

use flock_core::config::{BoundaryMode, SimulationParameters};
use flock_core::simulation::{AgentSeed, PopulationSeed, Simulation};
use flock_data::{DVec2, Group, GroupTable};

#[allow(dead_code)]
pub struct SimulationBuilder {
    params: SimulationParameters,
    agents: Vec<AgentSeed>,
    random: Option<GroupTable<usize>>,
}

#[allow(dead_code)]
impl SimulationBuilder {
    pub fn new() -> Self {
        Self {
            params: SimulationParameters::default(),
            agents: Vec::new(),
            random: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.world.seed = seed;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimulationParameters),
    {
        modifier(&mut self.params);
        self
    }

    pub fn with_boundary(mut self, mode: BoundaryMode) -> Self {
        self.params.world.boundary_mode = mode;
        self
    }

    pub fn with_world(mut self, width: f64, height: f64) -> Self {
        self.params.world.width = width;
        self.params.world.height = height;
        self
    }

    /// No predation, reproduction, starvation or aging: the population is
    /// fixed.
    pub fn closed_population(mut self) -> Self {
        self.params.interactions.clear();
        for group in Group::ALL {
            let l = &mut self.params.lifecycle[group];
            l.reproduction_enabled = false;
            l.starvation_enabled = false;
            l.max_age = None;
        }
        self
    }

    /// All flocking weights set to zero.
    pub fn without_flocking(mut self) -> Self {
        for group in Group::ALL {
            let g = &mut self.params.groups[group];
            g.separation_weight = 0.0;
            g.collision_weight = 0.0;
            g.alignment_weight = 0.0;
            g.cohesion_weight = 0.0;
            g.flee_weight = 0.0;
            g.chase_weight = 0.0;
        }
        self
    }

    pub fn with_agent(mut self, group: Group, position: (f64, f64), velocity: (f64, f64)) -> Self {
        self.agents.push(AgentSeed {
            group,
            position: DVec2::new(position.0, position.1),
            velocity: DVec2::new(velocity.0, velocity.1),
            energy: None,
        });
        self
    }

    pub fn with_agent_energy(
        mut self,
        group: Group,
        position: (f64, f64),
        velocity: (f64, f64),
        energy: f64,
    ) -> Self {
        self.agents.push(AgentSeed {
            group,
            position: DVec2::new(position.0, position.1),
            velocity: DVec2::new(velocity.0, velocity.1),
            energy: Some(energy),
        });
        self
    }

    pub fn with_random(mut self, boids: usize, chasers: usize) -> Self {
        self.random = Some(GroupTable {
            boid: boids,
            chaser: chasers,
        });
        self
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn build(self) -> Simulation {
        let mut sim = Simulation::new(self.params).expect("valid test parameters");
        let seed = match self.random {
            Some(counts) => PopulationSeed::Random { counts },
            None => PopulationSeed::Explicit(self.agents),
        };
        sim.seed(seed).expect("valid test seed");
        sim
    }
}
