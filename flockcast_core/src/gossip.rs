//! Target discovery, ranking and retirement over the proximity graph.
//!
//! Each tick an agent rebuilds its target book from the snapshot in four
//! passes:
//!
//! 1. **Union**: adopt every target a neighbour knows that we don't, at the
//!    lowest rank any neighbour gives it (`max_rank` if none does better).
//!    Targets we already know drop to that rank if it beats ours. A target
//!    that we or a neighbour retired last tick is never adopted.
//! 2. **Observe**: POIs inside perception range get rank 0.
//! 3. **Quorum**: a target with `quorum` witnesses (self plus neighbours
//!    inside the completion radius) is retired locally.
//! 4. **Flood**: targets a neighbour retired last tick are retired too.
//!
//! Retired targets go into the agent's `removed_targets` for exactly one
//! tick, which is how a retirement spreads one hop per tick.

use crate::agent::{Agent, Poi, PoiRef, TargetBook};
use crate::config::SwarmConfig;
use flockcast_env::PoiId;

/// Next-tick target state for one agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GossipOutcome {
    pub targets: TargetBook,
    pub removed_targets: Vec<PoiRef>,

    /// Targets retired by a local quorum this tick
    pub quorum_evictions: usize,

    /// Targets retired because a neighbour had retired them
    pub flood_evictions: usize,
}

/// Lowest rank any neighbour assigns to `target`, capped at `max_rank`.
pub fn rank_from_neighbors(neighbors: &[&Agent], target: PoiId, max_rank: u32) -> u32 {
    neighbors
        .iter()
        .filter_map(|n| n.targets.rank_of(target))
        .fold(max_rank, u32::min)
}

/// Agents (self first) inside the completion radius of `target`.
///
/// Zero unless `agent` itself is a witness: only witnesses may retire.
pub fn witness_count(
    agent: &Agent,
    neighbors: &[&Agent],
    target: &PoiRef,
    radius: f64,
) -> usize {
    if agent.distance_to(&target.position) > radius {
        return 0;
    }
    1 + neighbors
        .iter()
        .filter(|n| n.distance_to(&target.position) <= radius)
        .count()
}

/// Computes the agent's next target book. Pure over the snapshot.
pub fn exchange(
    agent: &Agent,
    neighbors: &[&Agent],
    pois: &[Poi],
    config: &SwarmConfig,
) -> GossipOutcome {
    let mut book = agent.targets.clone();
    let mut removed = Vec::new();

    let retired = |id: PoiId| {
        agent.removed_targets.iter().any(|t| t.id == id)
            || neighbors
                .iter()
                .any(|n| n.removed_targets.iter().any(|t| t.id == id))
    };

    for neighbor in neighbors {
        for entry in neighbor.targets.iter() {
            let id = entry.poi.id;
            if book.contains(id) || retired(id) {
                continue;
            }
            book.insert(entry.poi, rank_from_neighbors(neighbors, id, config.max_rank));
        }
    }

    // Known targets follow the best rank in the neighbourhood
    for id in agent.targets.target_ids() {
        book.lower_rank(id, rank_from_neighbors(neighbors, id, config.max_rank));
    }

    for poi in pois {
        if agent.distance_to(&poi.position) < config.perception_radius {
            book.observe(poi.handle());
        }
    }

    let completed: Vec<PoiRef> = book
        .targets()
        .filter(|t| witness_count(agent, neighbors, t, config.poi_radius) >= config.quorum)
        .copied()
        .collect();
    let quorum_evictions = completed.len();
    for target in completed {
        book.remove(target.id);
        removed.push(target);
    }

    let mut flood_evictions = 0;
    for neighbor in neighbors {
        for target in &neighbor.removed_targets {
            if let Some(entry) = book.remove(target.id) {
                removed.push(entry.poi);
                flood_evictions += 1;
            }
        }
    }

    GossipOutcome {
        targets: book,
        removed_targets: removed,
        quorum_evictions,
        flood_evictions,
    }
}
