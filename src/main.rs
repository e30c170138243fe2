use anyhow::Result;
use clap::Parser;
use flock_lib::flock_core::init_logging;
use flock_lib::runner::{self, RunOptions, DEFAULT_BOIDS, DEFAULT_CHASERS};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless multi-species boids simulation", long_about = None)]
struct Args {
    /// Parameter file (TOML). Defaults are used when it does not exist.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    #[arg(long, default_value_t = DEFAULT_BOIDS)]
    boids: usize,

    #[arg(long, default_value_t = DEFAULT_CHASERS)]
    chasers: usize,

    /// Write the final snapshot as JSON to this path
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Progress log interval in ticks (0 disables)
    #[arg(long, default_value_t = 60)]
    report_every: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = if args.config.exists() {
        Some(args.config)
    } else {
        tracing::warn!(path = %args.config.display(), "Config file not found, using defaults");
        None
    };

    let summary = runner::run(&RunOptions {
        config,
        ticks: args.ticks,
        boids: args.boids,
        chasers: args.chasers,
        snapshot_out: args.snapshot_out,
        report_every: args.report_every,
    })?;

    println!(
        "Simulated {} ticks ({:.1}s) in {:.2?}",
        summary.ticks, summary.simulated_seconds, summary.elapsed
    );
    println!(
        "Population: {} ({} boids, {} chasers)",
        summary.population, summary.group_counts.boid, summary.group_counts.chaser
    );
    println!(
        "Births: {}  Deaths: {}  Capacity rejections: {}",
        summary.births, summary.deaths, summary.capacity_exceeded
    );
    println!("Parameters: {}", summary.fingerprint);
    Ok(())
}
