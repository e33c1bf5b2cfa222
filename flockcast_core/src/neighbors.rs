//! Neighbour query against a tick snapshot.

use crate::agent::Agent;
use crate::environment::Snapshot;

/// All agents other than `agent` strictly closer than `radius`.
///
/// Scans the arena in id order, so the result is sorted by id. That order
/// is what makes rank minimisation and the eviction flood reproducible.
pub fn neighbors<'a>(agent: &Agent, snapshot: &Snapshot<'a>, radius: f64) -> Vec<&'a Agent> {
    snapshot
        .agents
        .iter()
        .filter(|other| other.id != agent.id && agent.distance_to(&other.position) < radius)
        .collect()
}
