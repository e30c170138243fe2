//! The tick controller.
//!
//! A [`Simulation`] owns the population and advances it one tick at a time.
//! Each tick runs in three phases:
//!
//! 1. Rebuild the spatial hash from the front buffer.
//! 2. Compute every agent's next state (neighbors, steering, integration,
//!    metabolism) into the back buffer, on the Rayon pool once the
//!    population reaches `parallel_threshold`. Each worker writes only its
//!    own output slot.
//! 3. Apply population dynamics to the back buffer, validate it, then swap
//!    buffers and publish a snapshot.
//!
//! Nothing becomes visible before the final step, so a failed tick leaves the
//! previous population and snapshot untouched.

use crate::config::{CompiledParameters, SimulationParameters};
use crate::error::{ConfigError, InvariantKind, SimError};
use crate::integrator::{confine, integrate};
use crate::lifecycle;
use crate::metrics::{self, Metrics};
use crate::neighborhood::{neighbors_into, Neighbor};
use crate::snapshot::{TickStats, WorldSnapshot};
use crate::spatial_hash::SpatialHash;
use crate::steering::steer;
use crate::systems::{self, PopulationContext};
use flock_data::{Agent, AgentId, DVec2, Group, GroupTable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Relative slack allowed on the speed bound for floating-point rounding.
const SPEED_TOLERANCE: f64 = 1e-9;

/// One explicitly placed agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSeed {
    pub group: Group,
    pub position: DVec2,
    pub velocity: DVec2,
    /// Starting energy; the group's `initial_energy` when unset.
    #[serde(default)]
    pub energy: Option<f64>,
}

/// Initial population handed to [`Simulation::seed`].
#[derive(Debug, Clone, PartialEq)]
pub enum PopulationSeed {
    /// Uniformly scattered agents per group, drawn from the world seed.
    Random { counts: GroupTable<usize> },
    /// Agents placed exactly as given, ids assigned in list order.
    Explicit(Vec<AgentSeed>),
}

/// Cloneable submission point for parameter updates.
///
/// Parameters are validated on submission; the latest accepted set is
/// swapped in at the start of the next tick. A rejected submission leaves
/// both the active and any pending parameters untouched.
#[derive(Debug, Clone, Default)]
pub struct ParameterHandle {
    pending: Arc<Mutex<Option<Arc<CompiledParameters>>>>,
}

impl ParameterHandle {
    pub fn submit(&self, params: SimulationParameters) -> Result<(), ConfigError> {
        let compiled = CompiledParameters::new(params)?;
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        *pending = Some(Arc::new(compiled));
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn take(&self) -> Option<Arc<CompiledParameters>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Per-worker buffers for the per-agent phase.
#[derive(Default)]
struct StepScratch {
    candidates: Vec<usize>,
    neighbors: Vec<Neighbor>,
}

/// Next state of `front[slot]`. Reads only the front buffer and the index.
fn step_agent(
    front: &[Agent],
    slot: usize,
    index: &SpatialHash,
    params: &CompiledParameters,
    dt: f64,
    scratch: &mut StepScratch,
) -> Agent {
    let agent = &front[slot];
    neighbors_into(
        index,
        front,
        slot,
        params,
        &mut scratch.candidates,
        &mut scratch.neighbors,
    );
    let steering = steer(agent, &scratch.neighbors, front, params);
    let mut next = integrate(agent, steering.acceleration, dt, params);
    let group = next.group;
    lifecycle::metabolize(&mut next, dt, params.lifecycle(group));
    next
}

fn check_invariants(agents: &[Agent], params: &CompiledParameters) -> Result<(), InvariantKind> {
    for (i, agent) in agents.iter().enumerate() {
        if i > 0 {
            let prev = agents[i - 1].id;
            if agent.id == prev {
                return Err(InvariantKind::DuplicateId(agent.id));
            }
            if agent.id < prev {
                return Err(InvariantKind::UnorderedIds(agent.id));
            }
        }
        if !agent.is_finite() {
            return Err(InvariantKind::NonFinite(agent.id));
        }
        let max_speed = params.group(agent.group).max_speed;
        let speed = agent.speed();
        if speed > max_speed * (1.0 + SPEED_TOLERANCE) {
            return Err(InvariantKind::SpeedLimit {
                id: agent.id,
                speed,
                max_speed,
            });
        }
    }
    Ok(())
}

/// Validates the area targeted by [`Simulation::spawn_at`] and
/// [`Simulation::despawn_within`].
fn check_brush(center: DVec2, radius: f64) -> Result<(), ConfigError> {
    if !center.is_finite() {
        return Err(ConfigError::invalid("brush.center", "must be finite"));
    }
    if !(radius.is_finite() && radius >= 0.0) {
        return Err(ConfigError::invalid("brush.radius", "must be finite and non-negative"));
    }
    Ok(())
}

fn empty_snapshot(params: &CompiledParameters) -> Arc<WorldSnapshot> {
    let world = params.world();
    Arc::new(WorldSnapshot::capture(
        0,
        0.0,
        &[],
        TickStats::default(),
        world.width,
        world.height,
        &params.fingerprint,
    ))
}

/// The flocking simulation.
pub struct Simulation {
    params: Arc<CompiledParameters>,
    handle: ParameterHandle,
    front: Vec<Agent>,
    back: Vec<Agent>,
    index: SpatialHash,
    kill_index: SpatialHash,
    scratch: Vec<usize>,
    next_id: u64,
    tick: u64,
    time: f64,
    snapshot: Arc<WorldSnapshot>,
    metrics: Arc<Metrics>,
}

impl Simulation {
    /// Creates an empty simulation with validated parameters.
    pub fn new(params: SimulationParameters) -> Result<Self, ConfigError> {
        let params = Arc::new(CompiledParameters::new(params)?);
        let snapshot = empty_snapshot(&params);
        Ok(Self {
            params,
            handle: ParameterHandle::default(),
            front: Vec::new(),
            back: Vec::new(),
            index: SpatialHash::new_empty(),
            kill_index: SpatialHash::new_empty(),
            scratch: Vec::new(),
            next_id: 1,
            tick: 0,
            time: 0.0,
            snapshot,
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// Replaces the population and restarts the tick counter.
    ///
    /// The whole seed is checked before anything changes: it may not exceed
    /// `max_population`, and explicit agents need finite state and a speed
    /// within their group's `max_speed`. Explicit positions are brought into
    /// the world according to the boundary mode.
    pub fn seed(&mut self, seed: PopulationSeed) -> Result<(), ConfigError> {
        let params = Arc::clone(&self.params);
        let world = params.world();
        let max = world.max_population;

        let agents = match seed {
            PopulationSeed::Random { counts } => {
                let requested = counts.boid + counts.chaser;
                if requested > max {
                    return Err(ConfigError::SeedExceedsCapacity { requested, max });
                }
                let mut rng = ChaCha8Rng::seed_from_u64(world.seed);
                let mut agents = Vec::with_capacity(requested);
                for (group, &count) in counts.iter() {
                    for _ in 0..count {
                        let id = AgentId(agents.len() as u64 + 1);
                        agents.push(lifecycle::spawn_random_with_rng(id, group, &params, &mut rng));
                    }
                }
                agents
            }
            PopulationSeed::Explicit(seeds) => {
                if seeds.len() > max {
                    return Err(ConfigError::SeedExceedsCapacity {
                        requested: seeds.len(),
                        max,
                    });
                }
                let mut agents = Vec::with_capacity(seeds.len());
                for (index, s) in seeds.into_iter().enumerate() {
                    let invalid = |reason: &str| ConfigError::InvalidSeed {
                        index,
                        reason: reason.to_string(),
                    };
                    if !s.position.is_finite() {
                        return Err(invalid("position must be finite"));
                    }
                    if !s.velocity.is_finite() {
                        return Err(invalid("velocity must be finite"));
                    }
                    let max_speed = params.group(s.group).max_speed;
                    if s.velocity.length() > max_speed * (1.0 + SPEED_TOLERANCE) {
                        return Err(invalid("speed exceeds the group's max_speed"));
                    }
                    let energy = s
                        .energy
                        .unwrap_or(params.lifecycle(s.group).initial_energy);
                    if !energy.is_finite() {
                        return Err(invalid("energy must be finite"));
                    }
                    let id = AgentId(index as u64 + 1);
                    let position = confine(s.position, world);
                    agents.push(Agent::new(id, s.group, position, s.velocity, energy));
                }
                agents
            }
        };

        self.next_id = agents.len() as u64 + 1;
        self.front = agents;
        self.back.clear();
        self.tick = 0;
        self.time = 0.0;
        self.snapshot = Arc::new(WorldSnapshot::capture(
            0,
            0.0,
            &self.front,
            TickStats::default(),
            world.width,
            world.height,
            &params.fingerprint,
        ));
        tracing::info!(
            agents = self.front.len(),
            boids = self.snapshot.group_counts.boid,
            chasers = self.snapshot.group_counts.chaser,
            "Population seeded"
        );
        Ok(())
    }

    /// Advances the world by `dt` seconds and publishes the result.
    ///
    /// Pending parameters are applied first. On error nothing is committed:
    /// the population, tick counter and last snapshot stay as they were.
    pub fn advance(&mut self, dt: f64) -> Result<Arc<WorldSnapshot>, SimError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimError::InvalidTimeStep(dt));
        }
        let started = Instant::now();

        if let Some(pending) = self.handle.take() {
            tracing::info!(fingerprint = %pending.fingerprint, "Applying new parameters");
            self.params = pending;
        }
        let params = Arc::clone(&self.params);
        let world = params.world();
        let tick = self.tick + 1;

        let cell_size = world
            .cell_size
            .unwrap_or_else(|| params.params.max_perception_radius());
        self.index
            .configure(cell_size, world.width, world.height, world.metric());
        let positions: Vec<DVec2> = self.front.iter().map(|a| a.position).collect();
        self.index.build_parallel(&positions);

        let front = &self.front;
        let index = &self.index;
        let step = |scratch: &mut StepScratch, slot: usize| {
            step_agent(front, slot, index, &params, dt, scratch)
        };
        if front.len() >= world.parallel_threshold {
            front
                .par_iter()
                .enumerate()
                .map_init(StepScratch::default, |scratch, (slot, _)| step(scratch, slot))
                .collect_into_vec(&mut self.back);
        } else {
            let mut scratch = StepScratch::default();
            self.back.clear();
            self.back
                .extend((0..front.len()).map(|slot| step(&mut scratch, slot)));
        }

        let mut dropped = 0usize;
        self.back.retain(|agent| {
            if agent.is_finite() {
                true
            } else {
                tracing::warn!(tick, id = %agent.id, group = %agent.group, "Dropping agent with non-finite state");
                dropped += 1;
                false
            }
        });

        let mut next_id = self.next_id;
        let mut rng = ChaCha8Rng::seed_from_u64(world.seed.wrapping_add(tick).wrapping_add(0x5EED));
        let outcome = systems::apply(
            &mut self.back,
            &params,
            PopulationContext {
                kill_index: &mut self.kill_index,
                scratch: &mut self.scratch,
                next_id: &mut next_id,
                rng: &mut rng,
            },
        );

        if let Err(kind) = check_invariants(&self.back, &params) {
            self.metrics.increment_counter(metrics::INVARIANT_VIOLATIONS);
            tracing::error!(tick, %kind, "Tick discarded");
            self.back.clear();
            return Err(SimError::InvariantViolation { tick, kind });
        }

        std::mem::swap(&mut self.front, &mut self.back);
        self.next_id = next_id;
        self.tick = tick;
        self.time += dt;

        let stats = TickStats {
            births: outcome.births,
            deaths_predation: outcome.kills,
            deaths_starvation: outcome.starved,
            deaths_age: outcome.aged,
            capacity_rejections: outcome.capacity_rejections,
            dropped_non_finite: dropped,
        };
        self.metrics.add_counter(metrics::BIRTHS, stats.births as u64);
        self.metrics
            .add_counter(metrics::DEATHS_PREDATION, stats.deaths_predation as u64);
        self.metrics
            .add_counter(metrics::DEATHS_STARVATION, stats.deaths_starvation as u64);
        self.metrics.add_counter(metrics::DEATHS_AGE, stats.deaths_age as u64);
        self.metrics
            .add_counter(metrics::CAPACITY_EXCEEDED, stats.capacity_rejections as u64);
        self.metrics
            .add_counter(metrics::DROPPED_NON_FINITE, stats.dropped_non_finite as u64);

        tracing::debug!(
            tick,
            agents = self.front.len(),
            births = stats.births,
            deaths = outcome.deaths(),
            "Tick committed"
        );
        self.snapshot = Arc::new(WorldSnapshot::capture(
            tick,
            self.time,
            &self.front,
            stats,
            world.width,
            world.height,
            &params.fingerprint,
        ));
        self.metrics.record_tick(started.elapsed(), self.front.len());
        Ok(Arc::clone(&self.snapshot))
    }

    /// Adds up to `amount` agents of `group` scattered uniformly within
    /// `radius` of `center`, between ticks. Stops at `max_population` and
    /// returns how many were added.
    pub fn spawn_at(
        &mut self,
        group: Group,
        center: DVec2,
        radius: f64,
        amount: usize,
    ) -> Result<usize, ConfigError> {
        check_brush(center, radius)?;
        let params = Arc::clone(&self.params);
        let world = params.world();
        let room = world.max_population.saturating_sub(self.front.len());
        let amount = amount.min(room);
        let mut rng = ChaCha8Rng::seed_from_u64(world.seed ^ self.next_id.rotate_left(17));
        for _ in 0..amount {
            let offset = lifecycle::random_direction(&mut rng) * radius * rng.gen::<f64>().sqrt();
            let id = AgentId(self.next_id);
            self.next_id += 1;
            let position = confine(center + offset, world);
            self.front
                .push(lifecycle::create_agent_with_rng(id, group, position, &params, &mut rng));
        }
        if amount > 0 {
            self.republish();
        }
        Ok(amount)
    }

    /// Removes agents within `radius` of `center`, optionally only those of
    /// one group, between ticks. Returns how many were removed.
    pub fn despawn_within(
        &mut self,
        group: Option<Group>,
        center: DVec2,
        radius: f64,
    ) -> Result<usize, ConfigError> {
        check_brush(center, radius)?;
        let metric = self.params.world().metric();
        let before = self.front.len();
        self.front.retain(|a| {
            let selected = group.map_or(true, |g| a.group == g);
            !(selected && metric.distance(a.position, center) <= radius)
        });
        let removed = before - self.front.len();
        if removed > 0 {
            self.republish();
        }
        Ok(removed)
    }

    /// Replaces the current snapshot after a between-tick edit, keeping the
    /// tick number and time.
    fn republish(&mut self) {
        let world = self.params.world();
        self.snapshot = Arc::new(WorldSnapshot::capture(
            self.tick,
            self.time,
            &self.front,
            TickStats::default(),
            world.width,
            world.height,
            &self.params.fingerprint,
        ));
    }

    /// Validates `params` now and applies them at the start of the next tick.
    pub fn set_parameters(&self, params: SimulationParameters) -> Result<(), ConfigError> {
        self.handle.submit(params)
    }

    /// Handle through which other threads can submit parameters.
    pub fn parameter_handle(&self) -> ParameterHandle {
        self.handle.clone()
    }

    /// Drops every agent and starts a new simulation lifetime. Parameters
    /// and any pending update are kept.
    pub fn reset(&mut self) {
        self.front.clear();
        self.back.clear();
        self.next_id = 1;
        self.tick = 0;
        self.time = 0.0;
        self.metrics.reset();
        self.snapshot = empty_snapshot(&self.params);
        tracing::info!("Simulation reset");
    }

    /// The last published snapshot.
    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Current population, sorted by id.
    pub fn population(&self) -> &[Agent] {
        &self.front
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds since seeding.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Parameters the next tick will run with, unless an update is pending.
    pub fn parameters(&self) -> Arc<CompiledParameters> {
        Arc::clone(&self.params)
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }
}
