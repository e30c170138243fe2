//! Configuration management for simulation parameters.
//!
//! This module provides strongly-typed configuration structures that map to
//! a `config.toml` file. Every field has a default, so a file only needs to
//! list the values it overrides.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. `config.toml` file (overrides defaults)
//!
//! ## Example `config.toml`
//!
//! ```toml
//! tick_rate = 60
//!
//! [world]
//! width = 800.0
//! height = 600.0
//! boundary_mode = "bounce"
//! max_population = 1500
//!
//! [groups.boid]
//! perception_radius = 25.0
//! cohesion_weight = 1.2
//!
//! [[interactions]]
//! predator = "chaser"
//! prey = "boid"
//! kill_radius = 4.0
//! energy_gain = 40.0
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::spatial_hash::Metric;
use flock_data::{Group, GroupTable};
use serde::{Deserialize, Serialize};

/// How agents interact with the edges of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Toroidal world: leaving one edge re-enters at the opposite one.
    #[default]
    Wrap,
    /// Reflect the velocity component that crossed the wall.
    Bounce,
    /// Steer away from walls before reaching them.
    Avoid,
    /// Unbounded plane.
    None,
}

/// World-level simulation configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    pub boundary_mode: BoundaryMode,
    /// Distance from a wall at which the avoid rule starts pushing.
    pub avoid_margin: f64,
    pub avoid_weight: f64,
    pub max_population: usize,
    pub seed: u64,
    /// Population size from which the per-agent phase runs on the thread pool.
    pub parallel_threshold: usize,
    /// Spatial hash cell size; the largest perception radius when unset.
    pub cell_size: Option<f64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            boundary_mode: BoundaryMode::Wrap,
            avoid_margin: 40.0,
            avoid_weight: 2.0,
            max_population: 2000,
            seed: 42,
            parallel_threshold: 256,
            cell_size: None,
        }
    }
}

impl WorldConfig {
    /// Distance function implied by the boundary mode.
    pub fn metric(&self) -> Metric {
        match self.boundary_mode {
            BoundaryMode::Wrap => Metric::Toroidal {
                width: self.width,
                height: self.height,
            },
            _ => Metric::Euclidean,
        }
    }
}

/// Flocking factors of one group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub max_speed: f64,
    pub max_steering_force: f64,
    pub perception_radius: f64,
    /// Separation range as a fraction of `perception_radius`.
    pub separation_radius: f64,
    pub separation_weight: f64,
    /// Neighbors closer than this get an extra unit push away, on top of
    /// separation. Only neighbors within `perception_radius` are seen.
    pub collision_radius: f64,
    pub collision_weight: f64,
    pub alignment_weight: f64,
    pub cohesion_weight: f64,
    /// Weight of steering away from visible predators.
    pub flee_weight: f64,
    /// Weight of steering towards the nearest visible prey.
    pub chase_weight: f64,
    /// Speed given to randomly seeded and newborn agents.
    pub initial_speed: f64,
}

impl GroupConfig {
    pub fn boid() -> Self {
        Self {
            max_speed: 75.0,
            max_steering_force: 150.0,
            perception_radius: 30.0,
            separation_radius: 0.5,
            separation_weight: 1.5,
            collision_radius: 4.0,
            collision_weight: 3.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            flee_weight: 3.0,
            chase_weight: 0.0,
            initial_speed: 50.0,
        }
    }

    pub fn chaser() -> Self {
        Self {
            max_speed: 70.0,
            max_steering_force: 120.0,
            perception_radius: 50.0,
            separation_radius: 0.5,
            separation_weight: 1.5,
            collision_radius: 8.0,
            collision_weight: 2.0,
            alignment_weight: 0.5,
            cohesion_weight: 0.5,
            flee_weight: 0.0,
            chase_weight: 2.0,
            initial_speed: 45.0,
        }
    }
}

/// Energy, aging and reproduction rules of one group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    pub initial_energy: f64,
    /// Signed energy change per second of simulated time.
    pub energy_rate: f64,
    pub reproduction_enabled: bool,
    pub reproduction_threshold: f64,
    /// Minimum seconds between two births by the same parent.
    pub reproduction_cooldown: f64,
    /// Children appear within this distance of their parent.
    pub spawn_radius: f64,
    pub starvation_enabled: bool,
    pub starvation_threshold: f64,
    /// Seconds after which an agent dies of old age.
    pub max_age: Option<f64>,
}

impl LifecycleConfig {
    pub fn boid() -> Self {
        Self {
            initial_energy: 50.0,
            energy_rate: 2.0,
            reproduction_enabled: true,
            reproduction_threshold: 100.0,
            reproduction_cooldown: 5.0,
            spawn_radius: 10.0,
            starvation_enabled: false,
            starvation_threshold: 0.0,
            max_age: Some(300.0),
        }
    }

    pub fn chaser() -> Self {
        Self {
            initial_energy: 100.0,
            energy_rate: -2.0,
            reproduction_enabled: true,
            reproduction_threshold: 200.0,
            reproduction_cooldown: 10.0,
            spawn_radius: 15.0,
            starvation_enabled: true,
            starvation_threshold: 0.0,
            max_age: None,
        }
    }
}

fn default_groups() -> GroupTable<GroupConfig> {
    GroupTable {
        boid: GroupConfig::boid(),
        chaser: GroupConfig::chaser(),
    }
}

fn default_lifecycle() -> GroupTable<LifecycleConfig> {
    GroupTable {
        boid: LifecycleConfig::boid(),
        chaser: LifecycleConfig::chaser(),
    }
}

/// One entry of the group interaction matrix: `predator` removes `prey`
/// agents that come within `kill_radius`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PredationRule {
    pub predator: Group,
    pub prey: Group,
    pub kill_radius: f64,
    #[serde(default)]
    pub energy_gain: f64,
}

/// Complete set of tunables. Immutable during a tick; replaced between
/// ticks through [`crate::simulation::Simulation::set_parameters`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SimulationParameters {
    pub world: WorldConfig,
    pub groups: GroupTable<GroupConfig>,
    pub lifecycle: GroupTable<LifecycleConfig>,
    pub interactions: Vec<PredationRule>,
    /// Host frame rate; the runner advances by `1 / tick_rate` seconds.
    pub tick_rate: u32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            groups: default_groups(),
            lifecycle: default_lifecycle(),
            interactions: vec![PredationRule {
                predator: Group::Chaser,
                prey: Group::Boid,
                kill_radius: 4.0,
                energy_gain: 40.0,
            }],
            tick_rate: 60,
        }
    }
}

fn ensure(cond: bool, field: impl FnOnce() -> String, reason: &str) -> ConfigResult<()> {
    if cond {
        Ok(())
    } else {
        Err(ConfigError::invalid(field(), reason))
    }
}

fn finite_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn finite_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl SimulationParameters {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if every parameter is usable, or the first failure.
    ///
    /// # Validation Rules
    /// - World bounds and speeds must be finite and positive
    /// - Radii, weights and forces must be finite and non-negative
    /// - `separation_radius` is a fraction in `(0, 1]`
    /// - Each predator/prey pair may appear at most once
    pub fn validate(&self) -> ConfigResult<()> {
        let w = &self.world;
        ensure(finite_positive(w.width), || "world.width".into(), "must be finite and positive")?;
        ensure(finite_positive(w.height), || "world.height".into(), "must be finite and positive")?;
        ensure(
            finite_non_negative(w.avoid_margin),
            || "world.avoid_margin".into(),
            "must be finite and non-negative",
        )?;
        ensure(
            finite_non_negative(w.avoid_weight),
            || "world.avoid_weight".into(),
            "must be finite and non-negative",
        )?;
        ensure(w.max_population > 0, || "world.max_population".into(), "must be positive")?;
        if let Some(cell) = w.cell_size {
            ensure(finite_positive(cell), || "world.cell_size".into(), "must be finite and positive")?;
        }

        for (group, g) in self.groups.iter() {
            let field = |name: &str| format!("groups.{group}.{name}");
            ensure(finite_positive(g.max_speed), || field("max_speed"), "must be finite and positive")?;
            ensure(
                finite_non_negative(g.max_steering_force),
                || field("max_steering_force"),
                "must be finite and non-negative",
            )?;
            ensure(
                finite_non_negative(g.perception_radius),
                || field("perception_radius"),
                "must be finite and non-negative",
            )?;
            ensure(
                g.separation_radius > 0.0 && g.separation_radius <= 1.0,
                || field("separation_radius"),
                "must be a fraction in (0, 1]",
            )?;
            for (name, weight) in [
                ("separation_weight", g.separation_weight),
                ("collision_radius", g.collision_radius),
                ("collision_weight", g.collision_weight),
                ("alignment_weight", g.alignment_weight),
                ("cohesion_weight", g.cohesion_weight),
                ("flee_weight", g.flee_weight),
                ("chase_weight", g.chase_weight),
            ] {
                ensure(finite_non_negative(weight), || field(name), "must be finite and non-negative")?;
            }
            ensure(
                finite_non_negative(g.initial_speed) && g.initial_speed <= g.max_speed,
                || field("initial_speed"),
                "must lie in [0, max_speed]",
            )?;
        }

        for (group, l) in self.lifecycle.iter() {
            let field = |name: &str| format!("lifecycle.{group}.{name}");
            ensure(
                finite_non_negative(l.initial_energy),
                || field("initial_energy"),
                "must be finite and non-negative",
            )?;
            ensure(l.energy_rate.is_finite(), || field("energy_rate"), "must be finite")?;
            ensure(
                finite_positive(l.reproduction_threshold),
                || field("reproduction_threshold"),
                "must be finite and positive",
            )?;
            ensure(
                finite_non_negative(l.reproduction_cooldown),
                || field("reproduction_cooldown"),
                "must be finite and non-negative",
            )?;
            ensure(
                finite_non_negative(l.spawn_radius),
                || field("spawn_radius"),
                "must be finite and non-negative",
            )?;
            ensure(
                l.starvation_threshold.is_finite(),
                || field("starvation_threshold"),
                "must be finite",
            )?;
            if let Some(age) = l.max_age {
                ensure(finite_positive(age), || field("max_age"), "must be finite and positive")?;
            }
        }

        InteractionMatrix::from_rules(&self.interactions)?;

        ensure(self.tick_rate > 0, || "tick_rate".into(), "must be positive")?;
        ensure(self.tick_rate <= 240, || "tick_rate".into(), "too high (max 240)")?;

        Ok(())
    }

    /// Parses and validates parameters from TOML text.
    ///
    /// The text is layered over [`SimulationParameters::default`]: tables are
    /// merged key by key, arrays (such as `interactions`) replace the default
    /// wholesale.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let parse = |e: &dyn std::fmt::Display| ConfigError::Parse(e.to_string());
        let overlay: toml::Value = toml::from_str(content).map_err(|e| parse(&e))?;
        let mut merged = toml::Value::try_from(Self::default()).map_err(|e| parse(&e))?;
        merge_toml(&mut merged, overlay);
        let params: Self = merged.try_into().map_err(|e| parse(&e))?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Largest perception radius over all groups.
    pub fn max_perception_radius(&self) -> f64 {
        self.groups
            .iter()
            .map(|(_, g)| g.perception_radius)
            .fold(0.0, f64::max)
    }

    /// Stable hash of the behavioral parameters, stamped on snapshots so
    /// recorded runs can be matched to the configuration that produced them.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world).as_bytes());
        hasher.update(format!("{:?}", self.groups).as_bytes());
        hasher.update(format!("{:?}", self.lifecycle).as_bytes());
        hasher.update(format!("{:?}", self.interactions).as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_toml(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Kill radius and reward of a predator/prey pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predation {
    pub kill_radius: f64,
    pub energy_gain: f64,
}

/// `Group × Group` lookup table built from the predation rules, indexed
/// `[predator][prey]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionMatrix {
    cells: [[Option<Predation>; Group::COUNT]; Group::COUNT],
}

impl InteractionMatrix {
    pub fn from_rules(rules: &[PredationRule]) -> ConfigResult<Self> {
        let mut cells = [[None; Group::COUNT]; Group::COUNT];
        for (i, rule) in rules.iter().enumerate() {
            ensure(
                finite_non_negative(rule.kill_radius),
                || format!("interactions[{i}].kill_radius"),
                "must be finite and non-negative",
            )?;
            ensure(
                rule.energy_gain.is_finite(),
                || format!("interactions[{i}].energy_gain"),
                "must be finite",
            )?;
            let cell = &mut cells[rule.predator.index()][rule.prey.index()];
            if cell.is_some() {
                return Err(ConfigError::DuplicateInteraction {
                    predator: rule.predator,
                    prey: rule.prey,
                });
            }
            *cell = Some(Predation {
                kill_radius: rule.kill_radius,
                energy_gain: rule.energy_gain,
            });
        }
        Ok(Self { cells })
    }

    #[inline]
    pub fn predation(&self, predator: Group, prey: Group) -> Option<&Predation> {
        self.cells[predator.index()][prey.index()].as_ref()
    }

    #[inline]
    pub fn preys_on(&self, predator: Group, prey: Group) -> bool {
        self.predation(predator, prey).is_some()
    }

    /// Whether `other` influences the steering of an agent in `group`.
    #[inline]
    pub fn is_relevant(&self, group: Group, other: Group) -> bool {
        group == other || self.preys_on(group, other) || self.preys_on(other, group)
    }

    /// Largest kill radius of any predator hunting `prey`, if any hunts it.
    pub fn max_kill_radius_for(&self, prey: Group) -> Option<f64> {
        Group::ALL
            .iter()
            .filter_map(|&predator| self.predation(predator, prey))
            .map(|p| p.kill_radius)
            .reduce(f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_none)
    }
}

/// Validated parameters together with the tables derived from them.
///
/// This is the value the controller swaps in between ticks.
#[derive(Debug, Clone)]
pub struct CompiledParameters {
    pub params: SimulationParameters,
    pub matrix: InteractionMatrix,
    pub fingerprint: String,
}

impl CompiledParameters {
    pub fn new(params: SimulationParameters) -> ConfigResult<Self> {
        params.validate()?;
        let matrix = InteractionMatrix::from_rules(&params.interactions)?;
        let fingerprint = params.fingerprint();
        Ok(Self {
            params,
            matrix,
            fingerprint,
        })
    }

    #[inline]
    pub fn group(&self, group: Group) -> &GroupConfig {
        &self.params.groups[group]
    }

    #[inline]
    pub fn lifecycle(&self, group: Group) -> &LifecycleConfig {
        &self.params.lifecycle[group]
    }

    #[inline]
    pub fn world(&self) -> &WorldConfig {
        &self.params.world
    }
}
