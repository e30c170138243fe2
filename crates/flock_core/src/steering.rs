//! Flocking steering rules.
//!
//! Every rule produces a steering vector in velocity units per second. The
//! rules are summed and the total is clamped to the group's
//! `max_steering_force`. A rule with nothing to react to contributes zero.

use crate::config::{BoundaryMode, CompiledParameters, WorldConfig};
use crate::neighborhood::Neighbor;
use flock_data::{Agent, AgentId, DVec2};
use std::f64::consts::TAU;

/// Distances below this are treated as coincident positions.
pub const MIN_SEPARATION_DISTANCE: f64 = 1e-9;

/// Individual rule contributions, already weighted, and their clamped sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Steering {
    pub separation: DVec2,
    pub collision: DVec2,
    pub alignment: DVec2,
    pub cohesion: DVec2,
    pub flee: DVec2,
    pub chase: DVec2,
    pub avoid: DVec2,
    pub acceleration: DVec2,
}

/// Deterministic unit vector for two agents sharing a position.
///
/// Both agents derive the same axis from their id pair and take opposite
/// signs, so they separate instead of drifting together.
pub fn coincident_direction(own: AgentId, other: AgentId) -> DVec2 {
    let (lo, hi) = if own < other { (own.0, other.0) } else { (other.0, own.0) };
    let mut h = lo ^ hi.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15;
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    let angle = (h >> 11) as f64 / (1u64 << 53) as f64 * TAU;
    let axis = DVec2::new(angle.cos(), angle.sin());
    if own < other {
        axis
    } else {
        -axis
    }
}

/// Unit vector pointing from `neighbor` towards `agent`, with the distance
/// floored for coincident pairs.
#[inline]
fn away_from(agent: &Agent, other: &Agent, n: &Neighbor) -> (DVec2, f64) {
    if n.distance < MIN_SEPARATION_DISTANCE {
        (coincident_direction(agent.id, other.id), MIN_SEPARATION_DISTANCE)
    } else {
        (-n.offset / n.distance, n.distance)
    }
}

/// Reynolds seek: the change that turns `velocity` into full speed along
/// `desired`. A degenerate direction yields no steering.
#[inline]
fn seek(desired: DVec2, velocity: DVec2, max_speed: f64) -> DVec2 {
    let dir = desired.normalize_or_zero();
    if dir == DVec2::ZERO {
        DVec2::ZERO
    } else {
        dir * max_speed - velocity
    }
}

/// Inward push near the walls, each component in `[-1, 1]`.
pub fn wall_push(position: DVec2, world: &WorldConfig) -> DVec2 {
    let margin = world.avoid_margin;
    if margin <= 0.0 {
        return DVec2::ZERO;
    }
    let axis = |p: f64, extent: f64| -> f64 {
        let mut push = 0.0;
        if p < margin {
            push += ((margin - p) / margin).min(1.0);
        }
        if p > extent - margin {
            push -= ((p - (extent - margin)) / margin).min(1.0);
        }
        push
    };
    DVec2::new(axis(position.x, world.width), axis(position.y, world.height))
}

/// Computes the steering acceleration of `agent` from its neighborhood.
///
/// `neighbors` must come from [`crate::neighborhood::neighbors_into`] over
/// the same `agents` buffer.
pub fn steer(
    agent: &Agent,
    neighbors: &[Neighbor],
    agents: &[Agent],
    params: &CompiledParameters,
) -> Steering {
    let cfg = params.group(agent.group);
    let separation_range = cfg.separation_radius * cfg.perception_radius;

    let mut away_sum = DVec2::ZERO;
    let mut away_count = 0usize;
    let mut collision_sum = DVec2::ZERO;
    let mut velocity_sum = DVec2::ZERO;
    let mut offset_sum = DVec2::ZERO;
    let mut flock_count = 0usize;
    let mut flee_sum = DVec2::ZERO;
    let mut flee_count = 0usize;
    let mut nearest_prey: Option<(f64, DVec2)> = None;

    for n in neighbors {
        let other = &agents[n.slot];
        if n.distance < cfg.collision_radius {
            collision_sum += away_from(agent, other, n).0;
        }
        if other.group == agent.group {
            flock_count += 1;
            velocity_sum += other.velocity;
            offset_sum += n.offset;
            if n.distance <= separation_range {
                let (away, distance) = away_from(agent, other, n);
                away_sum += away / distance;
                away_count += 1;
            }
        }
        if params.matrix.preys_on(other.group, agent.group) {
            let (away, _) = away_from(agent, other, n);
            flee_sum += away;
            flee_count += 1;
        }
        if params.matrix.preys_on(agent.group, other.group) {
            // Ascending slot order makes the first of equally distant prey win.
            let closer = nearest_prey.map_or(true, |(d, _)| n.distance < d);
            if closer {
                nearest_prey = Some((n.distance, n.offset));
            }
        }
    }

    let mut steering = Steering::default();
    if away_count > 0 {
        // A lone neighbor at the edge of the range pushes with `max_speed`;
        // closer neighbors push proportionally harder.
        let average = away_sum / away_count as f64;
        steering.separation = cfg.separation_weight * cfg.max_speed * separation_range * average;
    }
    steering.collision = cfg.collision_weight * cfg.max_speed * collision_sum;
    if flock_count > 0 {
        let count = flock_count as f64;
        steering.alignment = cfg.alignment_weight * (velocity_sum / count - agent.velocity);
        // Offsets are metric-aware, so the centroid is correct across wrapped edges.
        let to_centroid = offset_sum / count;
        steering.cohesion = cfg.cohesion_weight * seek(to_centroid, agent.velocity, cfg.max_speed);
    }
    if flee_count > 0 {
        steering.flee = cfg.flee_weight * seek(flee_sum, agent.velocity, cfg.max_speed);
    }
    if let Some((_, offset)) = nearest_prey {
        steering.chase = cfg.chase_weight * seek(offset, agent.velocity, cfg.max_speed);
    }
    let world = params.world();
    if world.boundary_mode == BoundaryMode::Avoid {
        steering.avoid = world.avoid_weight * cfg.max_speed * wall_push(agent.position, world);
    }

    let total = steering.separation
        + steering.collision
        + steering.alignment
        + steering.cohesion
        + steering.flee
        + steering.chase
        + steering.avoid;
    steering.acceleration = total.clamp_length_max(cfg.max_steering_force);
    steering
}
