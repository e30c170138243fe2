use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flock_core::config::SimulationParameters;
use flock_core::simulation::{PopulationSeed, Simulation};
use flock_data::GroupTable;

fn seeded(boids: usize, parallel_threshold: usize) -> Simulation {
    let mut params = SimulationParameters::default();
    params.world.max_population = boids * 2;
    params.world.parallel_threshold = parallel_threshold;
    params.lifecycle.boid.reproduction_enabled = false;
    params.lifecycle.chaser.reproduction_enabled = false;
    let mut sim = Simulation::new(params).expect("valid parameters");
    sim.seed(PopulationSeed::Random {
        counts: GroupTable {
            boid: boids,
            chaser: boids / 100,
        },
    })
    .expect("seed fits");
    sim
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for &boids in &[500usize, 2000, 5000] {
        group.bench_with_input(BenchmarkId::new("parallel", boids), &boids, |b, &n| {
            let mut sim = seeded(n, 0);
            b.iter(|| black_box(sim.advance(1.0 / 60.0).expect("tick")))
        });
        group.bench_with_input(BenchmarkId::new("sequential", boids), &boids, |b, &n| {
            let mut sim = seeded(n, usize::MAX);
            b.iter(|| black_box(sim.advance(1.0 / 60.0).expect("tick")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
