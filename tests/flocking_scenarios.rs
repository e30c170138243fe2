mod common;

use common::SimulationBuilder;
use flock_core::config::{BoundaryMode, CompiledParameters, SimulationParameters};
use flock_core::neighborhood::neighbors;
use flock_core::spatial_hash::SpatialHash;
use flock_core::steering::steer;
use flock_data::{Agent, AgentId, DVec2, Group};

fn total_pairwise_distance(agents: &[Agent]) -> f64 {
    let mut total = 0.0;
    for (i, a) in agents.iter().enumerate() {
        for b in &agents[i + 1..] {
            total += a.position.distance(b.position);
        }
    }
    total
}

#[test]
fn test_lone_agent_moves_in_straight_line() {
    let mut sim = SimulationBuilder::new()
        .with_boundary(BoundaryMode::None)
        .closed_population()
        .with_agent(Group::Boid, (100.0, 200.0), (30.0, -40.0))
        .build();

    let dt = 0.1;
    for _ in 0..50 {
        sim.advance(dt).unwrap();
    }
    let agent = &sim.population()[0];
    assert_eq!(agent.velocity, DVec2::new(30.0, -40.0));
    let expected = DVec2::new(100.0 + 30.0 * 5.0, 200.0 - 40.0 * 5.0);
    assert!(
        agent.position.distance(expected) < 1e-9,
        "drifted to {:?}",
        agent.position
    );
    assert!((agent.heading - (-40.0f64).atan2(30.0)).abs() < 1e-12);
}

#[test]
fn test_separation_points_away_from_centroid() {
    let mut raw = SimulationParameters::default();
    raw.groups.boid.alignment_weight = 0.0;
    raw.groups.boid.cohesion_weight = 0.0;
    let params = CompiledParameters::new(raw).unwrap();

    let agents = vec![
        Agent::new(AgentId(1), Group::Boid, DVec2::new(100.0, 100.0), DVec2::ZERO, 10.0),
        Agent::new(AgentId(2), Group::Boid, DVec2::new(103.0, 100.0), DVec2::ZERO, 10.0),
        Agent::new(AgentId(3), Group::Boid, DVec2::new(100.0, 103.0), DVec2::ZERO, 10.0),
    ];
    let centroid = agents.iter().map(|a| a.position).sum::<DVec2>() / 3.0;
    let positions: Vec<DVec2> = agents.iter().map(|a| a.position).collect();
    let mut index = SpatialHash::new(30.0, 1920.0, 1080.0, params.world().metric());
    index.build_parallel(&positions);

    for slot in 0..agents.len() {
        let found = neighbors(&index, &agents, slot, &params);
        assert_eq!(found.len(), 2);
        let s = steer(&agents[slot], &found, &agents, &params);
        let outward = agents[slot].position - centroid;
        assert!(
            s.separation.dot(outward) > 0.0,
            "agent {} separation {:?} does not point away from {:?}",
            slot,
            s.separation,
            centroid
        );
    }
}

#[test]
fn test_three_close_boids_move_apart() {
    let start = [DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0)];
    let mut builder = SimulationBuilder::new()
        .with_boundary(BoundaryMode::None)
        .closed_population()
        .with_config(|p| p.groups.boid.perception_radius = 5.0);
    for p in start {
        builder = builder.with_agent(Group::Boid, (p.x, p.y), (0.0, 0.0));
    }
    let mut sim = builder.build();

    sim.advance(1.0).unwrap();
    for (i, agent) in sim.population().iter().enumerate() {
        let others: DVec2 = start
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, p)| *p)
            .sum::<DVec2>()
            / 2.0;
        let outward = start[i] - others;
        assert!(
            agent.velocity.dot(outward) > 0.0,
            "agent {} velocity {:?} points towards {:?}",
            agent.id,
            agent.velocity,
            others
        );
    }
}

#[test]
fn test_separation_spreads_a_tight_group() {
    let mut sim = SimulationBuilder::new()
        .closed_population()
        .with_config(|p| {
            p.groups.boid.alignment_weight = 0.0;
            p.groups.boid.cohesion_weight = 0.0;
        })
        .with_agent(Group::Boid, (100.0, 100.0), (0.0, 0.0))
        .with_agent(Group::Boid, (103.0, 100.0), (0.0, 0.0))
        .with_agent(Group::Boid, (100.0, 103.0), (0.0, 0.0))
        .build();

    let before = total_pairwise_distance(sim.population());
    for _ in 0..10 {
        sim.advance(1.0 / 60.0).unwrap();
    }
    assert!(total_pairwise_distance(sim.population()) > before);
}

#[test]
fn test_wrap_boundary_reenters_opposite_edge() {
    let params = SimulationParameters::default();
    let width = params.world.width;
    let mut sim = SimulationBuilder::new()
        .with_boundary(BoundaryMode::Wrap)
        .closed_population()
        .with_agent(Group::Boid, (width - 0.1, 0.0), (60.0, 0.0))
        .build();

    sim.advance(1.0 / 60.0).unwrap();
    let agent = &sim.population()[0];
    assert!((agent.position.x - 0.9).abs() < 1e-9, "x = {}", agent.position.x);
    assert_eq!(agent.position.y, 0.0);
}

#[test]
fn test_avoid_turns_before_wall() {
    let mut sim = SimulationBuilder::new()
        .with_boundary(BoundaryMode::Avoid)
        .closed_population()
        .with_agent(Group::Boid, (1900.0, 540.0), (50.0, 0.0))
        .build();

    let mut max_x: f64 = 0.0;
    for _ in 0..180 {
        sim.advance(1.0 / 60.0).unwrap();
        max_x = max_x.max(sim.population()[0].position.x);
    }
    assert!(max_x < 1920.0, "reached the wall at {max_x}");
    assert!(sim.population()[0].velocity.x < 0.0);
}

#[test]
fn test_bounce_reflects_off_wall() {
    let mut sim = SimulationBuilder::new()
        .with_boundary(BoundaryMode::Bounce)
        .closed_population()
        .with_agent(Group::Boid, (5.0, 540.0), (-60.0, 0.0))
        .build();

    for _ in 0..30 {
        sim.advance(1.0 / 60.0).unwrap();
    }
    let agent = &sim.population()[0];
    assert!(agent.velocity.x > 0.0);
    assert!(agent.position.x >= 0.0);
}

#[test]
fn test_prey_flees_and_predator_chases() {
    let mut sim = SimulationBuilder::new()
        .closed_population()
        .with_config(|p| {
            // Relationship kept for steering, kill range out of reach.
            p.interactions = SimulationParameters::default().interactions;
            p.interactions[0].kill_radius = 0.0;
        })
        .with_agent(Group::Boid, (500.0, 500.0), (0.0, 0.0))
        .with_agent(Group::Chaser, (520.0, 500.0), (0.0, 0.0))
        .build();

    for _ in 0..10 {
        sim.advance(1.0 / 60.0).unwrap();
    }
    let boid = &sim.population()[0];
    let chaser = &sim.population()[1];
    assert!(boid.position.x < 500.0);
    assert!(chaser.position.x < 520.0);
}
