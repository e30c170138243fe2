//! Motion integration and boundary handling.

use crate::config::{BoundaryMode, CompiledParameters, WorldConfig};
use flock_data::{heading_of, Agent, DVec2};

/// Maps `value` into `[0, bound)`.
///
/// `rem_euclid` can round up to exactly `bound` for tiny negative inputs,
/// which is folded back onto `0`.
#[inline]
pub fn wrap_coordinate(value: f64, bound: f64) -> f64 {
    let wrapped = value.rem_euclid(bound);
    if wrapped >= bound {
        0.0
    } else {
        wrapped
    }
}

/// Brings a freshly placed position inside the world without touching any
/// velocity: wrapped on a torus, clamped against walls, untouched when the
/// world is unbounded.
pub fn confine(position: DVec2, world: &WorldConfig) -> DVec2 {
    match world.boundary_mode {
        BoundaryMode::Wrap => DVec2::new(
            wrap_coordinate(position.x, world.width),
            wrap_coordinate(position.y, world.height),
        ),
        BoundaryMode::Bounce | BoundaryMode::Avoid => DVec2::new(
            position.x.clamp(0.0, world.width),
            position.y.clamp(0.0, world.height),
        ),
        BoundaryMode::None => position,
    }
}

/// Clamps one axis into `[0, bound]` and reports which wall was crossed:
/// `-1` for the low wall, `1` for the high wall, `0` otherwise.
#[inline]
fn clamp_axis(value: f64, bound: f64) -> (f64, i8) {
    if value < 0.0 {
        (0.0, -1)
    } else if value > bound {
        (bound, 1)
    } else {
        (value, 0)
    }
}

/// Advances one agent by `dt` seconds under `acceleration`.
///
/// The new velocity is clamped to the group's `max_speed` before the
/// position update, so the speed bound holds regardless of the boundary
/// mode. Zero acceleration moves the agent along a straight line.
pub fn integrate(agent: &Agent, acceleration: DVec2, dt: f64, params: &CompiledParameters) -> Agent {
    let cfg = params.group(agent.group);
    let world = params.world();

    let mut velocity = (agent.velocity + acceleration * dt).clamp_length_max(cfg.max_speed);
    let mut position = agent.position + velocity * dt;

    match world.boundary_mode {
        BoundaryMode::Wrap => {
            position.x = wrap_coordinate(position.x, world.width);
            position.y = wrap_coordinate(position.y, world.height);
        }
        BoundaryMode::Bounce => {
            let (x, hit_x) = clamp_axis(position.x, world.width);
            let (y, hit_y) = clamp_axis(position.y, world.height);
            position = DVec2::new(x, y);
            // Only reflect a component still heading out of the world.
            if (hit_x < 0 && velocity.x < 0.0) || (hit_x > 0 && velocity.x > 0.0) {
                velocity.x = -velocity.x;
            }
            if (hit_y < 0 && velocity.y < 0.0) || (hit_y > 0 && velocity.y > 0.0) {
                velocity.y = -velocity.y;
            }
        }
        BoundaryMode::Avoid => {
            let (x, hit_x) = clamp_axis(position.x, world.width);
            let (y, hit_y) = clamp_axis(position.y, world.height);
            position = DVec2::new(x, y);
            if (hit_x < 0 && velocity.x < 0.0) || (hit_x > 0 && velocity.x > 0.0) {
                velocity.x = 0.0;
            }
            if (hit_y < 0 && velocity.y < 0.0) || (hit_y > 0 && velocity.y > 0.0) {
                velocity.y = 0.0;
            }
        }
        BoundaryMode::None => {}
    }

    Agent {
        position,
        velocity,
        heading: heading_of(velocity, agent.heading),
        ..agent.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationParameters;
    use flock_data::{AgentId, Group};

    fn params(mode: BoundaryMode) -> CompiledParameters {
        let mut raw = SimulationParameters::default();
        raw.world.width = 100.0;
        raw.world.height = 100.0;
        raw.world.boundary_mode = mode;
        CompiledParameters::new(raw).unwrap()
    }

    fn moving(x: f64, y: f64, vx: f64, vy: f64) -> Agent {
        Agent::new(AgentId(1), Group::Boid, DVec2::new(x, y), DVec2::new(vx, vy), 10.0)
    }

    #[test]
    fn test_speed_clamped() {
        let p = params(BoundaryMode::None);
        let a = moving(50.0, 50.0, 70.0, 0.0);
        let next = integrate(&a, DVec2::new(1000.0, 1000.0), 0.1, &p);
        assert!(next.speed() <= p.group(Group::Boid).max_speed + 1e-9);
    }

    #[test]
    fn test_zero_acceleration_is_straight_line() {
        let p = params(BoundaryMode::None);
        let a = moving(10.0, 20.0, 3.0, 4.0);
        let next = integrate(&a, DVec2::ZERO, 0.5, &p);
        assert_eq!(next.velocity, a.velocity);
        assert_eq!(next.position, DVec2::new(11.5, 22.0));
        assert_eq!(next.heading, a.heading);
    }

    #[test]
    fn test_wrap_crosses_edge() {
        let p = params(BoundaryMode::Wrap);
        let a = moving(99.9, 0.05, 10.0, -10.0);
        let next = integrate(&a, DVec2::ZERO, 0.1, &p);
        assert!((next.position.x - 0.9).abs() < 1e-9);
        assert!((next.position.y - 99.05).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_coordinate_stays_below_bound() {
        assert_eq!(wrap_coordinate(-1e-18, 100.0), 0.0);
        assert_eq!(wrap_coordinate(100.0, 100.0), 0.0);
        assert!((wrap_coordinate(-0.5, 100.0) - 99.5).abs() < 1e-12);
    }

    #[test]
    fn test_bounce_reflects_velocity() {
        let p = params(BoundaryMode::Bounce);
        let a = moving(99.0, 50.0, 20.0, 5.0);
        let next = integrate(&a, DVec2::ZERO, 0.1, &p);
        assert_eq!(next.position.x, 100.0);
        assert_eq!(next.velocity, DVec2::new(-20.0, 5.0));
    }

    #[test]
    fn test_avoid_hard_stop() {
        let p = params(BoundaryMode::Avoid);
        let a = moving(0.5, 50.0, -20.0, 5.0);
        let next = integrate(&a, DVec2::ZERO, 0.1, &p);
        assert_eq!(next.position.x, 0.0);
        assert_eq!(next.velocity, DVec2::new(0.0, 5.0));
    }

    #[test]
    fn test_confine_per_mode() {
        let outside = DVec2::new(-5.0, 130.0);
        assert_eq!(confine(outside, params(BoundaryMode::Wrap).world()), DVec2::new(95.0, 30.0));
        assert_eq!(confine(outside, params(BoundaryMode::Bounce).world()), DVec2::new(0.0, 100.0));
        assert_eq!(confine(outside, params(BoundaryMode::None).world()), outside);
    }

    #[test]
    fn test_heading_kept_when_stopped() {
        let p = params(BoundaryMode::None);
        let mut a = moving(50.0, 50.0, 0.0, 0.0);
        a.heading = 1.25;
        let next = integrate(&a, DVec2::ZERO, 0.1, &p);
        assert_eq!(next.heading, 1.25);
    }
}
