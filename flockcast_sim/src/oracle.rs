//! Global POI retirement.
//!
//! Agents retire targets locally through gossip; the canonical POI list is
//! trimmed separately, from the post-apply state, by this oracle. It sees
//! every agent at once, which no agent ever does.

use flockcast_core::{Agent, Environment, Poi};
use tracing::info;

/// Number of agents strictly inside `radius` of `poi`.
pub fn witness_count(agents: &[Agent], poi: &Poi, radius: f64) -> usize {
    agents
        .iter()
        .filter(|a| a.distance_to(&poi.position) < radius)
        .count()
}

/// Removes POIs that enough agents have reached.
#[derive(Debug, Clone, Copy)]
pub struct PoiOracle {
    radius: f64,
    quorum: usize,
}

impl PoiOracle {
    pub fn new(radius: f64, quorum: usize) -> Self {
        Self { radius, quorum }
    }

    /// Uses the environment's completion radius and quorum.
    pub fn for_environment(env: &Environment) -> Self {
        Self::new(env.config().poi_radius, env.config().quorum)
    }

    /// Refreshes every POI's witness count and retires those at quorum.
    /// Returns the retired POIs in list order.
    pub fn retire(&self, env: &mut Environment) -> Vec<Poi> {
        let counts: Vec<_> = env
            .pois()
            .iter()
            .map(|poi| (poi.id, witness_count(env.agents(), poi, self.radius)))
            .collect();

        let mut retired = Vec::new();
        for (id, count) in counts {
            env.set_witness_count(id, count);
            if count >= self.quorum {
                if let Some(poi) = env.remove_poi(id) {
                    info!("POI {} completed by {} agents at tick {}", id, count, env.tick());
                    retired.push(poi);
                }
            }
        }
        retired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flockcast_core::{Placement, SwarmConfig, Vec2};

    fn env_with(positions: &[(f64, f64)]) -> Environment {
        let placements = positions
            .iter()
            .map(|&(x, y)| Placement {
                position: Vec2::new(x, y),
                velocity: Vec2::zeros(),
            })
            .collect();
        Environment::new(SwarmConfig::default(), placements).unwrap()
    }

    #[test]
    fn test_retires_at_quorum() {
        let mut env = env_with(&[(590.0, 350.0), (610.0, 350.0), (600.0, 360.0)]);
        let id = env.add_poi(Vec2::new(600.0, 350.0));
        let oracle = PoiOracle::for_environment(&env);

        let retired = oracle.retire(&mut env);
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].id, id);
        assert_eq!(retired[0].witness_count, 3);
        assert!(env.pois().is_empty());
    }

    #[test]
    fn test_boundary_agent_is_not_a_witness() {
        // Third agent sits exactly on the completion radius
        let mut env = env_with(&[(590.0, 350.0), (610.0, 350.0), (600.0, 370.0)]);
        let id = env.add_poi(Vec2::new(600.0, 350.0));
        let oracle = PoiOracle::for_environment(&env);

        assert!(oracle.retire(&mut env).is_empty());
        assert_eq!(env.poi(id).map(|p| p.witness_count), Some(2));
    }

    #[test]
    fn test_only_reached_pois_retire() {
        let mut env = env_with(&[(300.0, 300.0), (305.0, 300.0), (300.0, 305.0)]);
        let near = env.add_poi(Vec2::new(302.0, 302.0));
        let far = env.add_poi(Vec2::new(900.0, 500.0));
        let retired = PoiOracle::new(20.0, 3).retire(&mut env);

        assert_eq!(retired.iter().map(|p| p.id).collect::<Vec<_>>(), vec![near]);
        assert_eq!(env.pois().iter().map(|p| p.id).collect::<Vec<_>>(), vec![far]);
    }
}
