//! Headless host loop: load parameters, seed, advance, report.

use anyhow::{Context, Result};
use flock_core::config::SimulationParameters;
use flock_core::metrics;
use flock_core::simulation::{PopulationSeed, Simulation};
use flock_core::snapshot::WorldSnapshot;
use flock_data::GroupTable;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_BOIDS: usize = 1000;
pub const DEFAULT_CHASERS: usize = DEFAULT_BOIDS / 100;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Parameter file; built-in defaults are used when it is `None`.
    pub config: Option<PathBuf>,
    pub ticks: u64,
    pub boids: usize,
    pub chasers: usize,
    /// Writes the final snapshot as JSON when set.
    pub snapshot_out: Option<PathBuf>,
    /// Emit a progress line every this many ticks; `0` disables it.
    pub report_every: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: None,
            ticks: 600,
            boids: DEFAULT_BOIDS,
            chasers: DEFAULT_CHASERS,
            snapshot_out: None,
            report_every: 60,
        }
    }
}

/// Outcome of a headless run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ticks: u64,
    pub simulated_seconds: f64,
    pub population: usize,
    pub group_counts: GroupTable<usize>,
    pub births: u64,
    pub deaths: u64,
    pub capacity_exceeded: u64,
    pub fingerprint: String,
    pub elapsed: Duration,
}

/// Reads parameters from `path`, or returns the defaults when no path is
/// given.
pub fn load_parameters(path: Option<&Path>) -> Result<SimulationParameters> {
    let Some(path) = path else {
        return Ok(SimulationParameters::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    SimulationParameters::from_toml(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

pub fn write_snapshot(snapshot: &WorldSnapshot, path: &Path) -> Result<()> {
    let data = snapshot
        .to_json()
        .context("Failed to serialize snapshot")?;
    fs::write(path, data)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
    Ok(())
}

/// Runs a seeded simulation for `options.ticks` ticks at `1 / tick_rate`
/// seconds per tick.
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let params = load_parameters(options.config.as_deref())?;
    let dt = 1.0 / f64::from(params.tick_rate);
    let mut sim = Simulation::new(params).context("Failed to create simulation")?;
    sim.seed(PopulationSeed::Random {
        counts: GroupTable {
            boid: options.boids,
            chaser: options.chasers,
        },
    })
    .context("Failed to seed population")?;

    let started = Instant::now();
    let mut snapshot: Arc<WorldSnapshot> = sim.snapshot();
    for _ in 0..options.ticks {
        snapshot = sim
            .advance(dt)
            .with_context(|| format!("Tick {} failed", sim.tick() + 1))?;
        if options.report_every > 0 && snapshot.tick % options.report_every == 0 {
            tracing::info!(
                tick = snapshot.tick,
                boids = snapshot.group_counts.boid,
                chasers = snapshot.group_counts.chaser,
                births = snapshot.stats.births,
                "Progress"
            );
        }
        if snapshot.agents.is_empty() {
            tracing::warn!(tick = snapshot.tick, "Population died out");
            break;
        }
    }

    if let Some(path) = &options.snapshot_out {
        write_snapshot(&snapshot, path)?;
        tracing::info!(path = %path.display(), "Snapshot written");
    }

    let m = sim.metrics();
    Ok(RunSummary {
        ticks: snapshot.tick,
        simulated_seconds: snapshot.time,
        population: snapshot.population(),
        group_counts: snapshot.group_counts,
        births: m.counter(metrics::BIRTHS),
        deaths: m.counter(metrics::DEATHS_PREDATION)
            + m.counter(metrics::DEATHS_STARVATION)
            + m.counter(metrics::DEATHS_AGE),
        capacity_exceeded: m.counter(metrics::CAPACITY_EXCEEDED),
        fingerprint: snapshot.fingerprint.clone(),
        elapsed: started.elapsed(),
    })
}
