use crate::config::InteractionMatrix;
use crate::spatial_hash::SpatialHash;
use flock_data::Agent;

/// A resolved kill, by slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kill {
    pub predator: usize,
    pub prey: usize,
}

/// Resolves predation over `agents`, marking victims in `alive`.
///
/// Prey are visited in ascending slot (and therefore id) order. Each prey is
/// taken by the closest living predator whose rule covers the distance,
/// equal distances going to the lower slot. A killed agent can neither be
/// killed again nor kill later in the same pass. The predator collects the
/// rule's `energy_gain`.
///
/// `index` must have been built from the current positions of `agents`.
pub fn resolve(
    agents: &mut [Agent],
    alive: &mut [bool],
    index: &SpatialHash,
    matrix: &InteractionMatrix,
    scratch: &mut Vec<usize>,
) -> Vec<Kill> {
    let mut kills = Vec::new();
    if matrix.is_empty() {
        return kills;
    }
    let metric = index.metric();

    for prey in 0..agents.len() {
        if !alive[prey] {
            continue;
        }
        let prey_group = agents[prey].group;
        let Some(reach) = matrix.max_kill_radius_for(prey_group) else {
            continue;
        };
        let prey_pos = agents[prey].position;

        index.query_into(prey_pos, reach, scratch);
        let mut best: Option<(f64, usize, f64)> = None;
        for &candidate in scratch.iter() {
            if candidate == prey || !alive[candidate] {
                continue;
            }
            let Some(rule) = matrix.predation(agents[candidate].group, prey_group) else {
                continue;
            };
            let distance = metric.distance(agents[candidate].position, prey_pos);
            if distance > rule.kill_radius {
                continue;
            }
            // Candidates arrive in ascending slot order; strict `<` keeps the lowest on ties.
            if best.map_or(true, |(d, _, _)| distance < d) {
                best = Some((distance, candidate, rule.energy_gain));
            }
        }

        if let Some((_, predator, gain)) = best {
            alive[prey] = false;
            agents[predator].energy += gain;
            kills.push(Kill { predator, prey });
        }
    }
    kills
}
