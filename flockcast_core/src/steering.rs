//! The steering engine: per-agent behaviour blend.
//!
//! Every behaviour produces a raw desired acceleration. Each one is capped
//! individually (see [`crate::kinematics::cap`]) before the weighted blend,
//! so no single behaviour can spend more than the force budget:
//!
//! ```text
//! accel = Σ wᵢ · cap(componentᵢ) / Σ wᵢ        (target term only when selected)
//! ```
//!
//! Swarming agents then get the minimum-step floor so a flock whose
//! behaviours cancel out never stalls.

use crate::agent::{Agent, Mode, PoiRef};
use crate::config::SwarmConfig;
use crate::kinematics::{bound_to_min_step, cap, position_correction};
use crate::vector::{scale_to_length, Vec2};

/// Capped per-behaviour accelerations, kept for inspection and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringComponents {
    pub align: Vec2,
    pub cohesion: Vec2,
    pub separation: Vec2,
    pub edge: Vec2,
    pub target: Option<Vec2>,
}

/// Result of one agent's steering computation.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringOutcome {
    /// Blended acceleration (not yet given the final apply-time cap)
    pub acceleration: Vec2,

    /// The agent's velocity after any wall bounce
    pub velocity: Vec2,

    /// Mode derived from target selection
    pub mode: Mode,

    /// Target pursued this tick
    pub selected: Option<PoiRef>,

    pub components: SteeringComponents,
}

/// Steering behaviours for a given configuration.
pub struct SteeringEngine<'c> {
    config: &'c SwarmConfig,
}

impl<'c> SteeringEngine<'c> {
    pub fn new(config: &'c SwarmConfig) -> Self {
        Self { config }
    }

    /// Steers toward the neighbourhood's average velocity.
    pub fn align(&self, velocity: &Vec2, neighbors: &[&Agent]) -> Vec2 {
        if neighbors.is_empty() {
            return Vec2::zeros();
        }
        let sum: Vec2 = neighbors.iter().map(|n| n.velocity).sum();
        let average = sum / neighbors.len() as f64;
        (average - velocity) / self.config.dt
    }

    /// Steers toward the centroid of the neighbourhood.
    pub fn cohesion(&self, agent: &Agent, velocity: &Vec2, neighbors: &[&Agent]) -> Vec2 {
        if neighbors.is_empty() {
            return Vec2::zeros();
        }
        let sum: Vec2 = neighbors.iter().map(|n| n.position).sum();
        let centroid = sum / neighbors.len() as f64;
        position_correction(&(centroid - agent.position), velocity, self.config.dt)
    }

    /// Steers toward the average of "safe" goal positions, one per
    /// neighbour closer than `safe_distance`, each placed `safe_distance`
    /// from that neighbour on the far side of the agent.
    pub fn separation(&self, agent: &Agent, velocity: &Vec2, neighbors: &[&Agent]) -> Vec2 {
        let safe = self.config.safe_distance;
        let mut goal_sum = Vec2::zeros();
        let mut count = 0usize;

        for neighbor in neighbors {
            if agent.distance_to(&neighbor.position) >= safe {
                continue;
            }
            let away = scale_to_length(&(agent.position - neighbor.position), safe)
                .unwrap_or_else(|| {
                    // Coincident agents: split along x by id so the pair diverges
                    if agent.id < neighbor.id {
                        Vec2::new(-safe, 0.0)
                    } else {
                        Vec2::new(safe, 0.0)
                    }
                });
            goal_sum += neighbor.position + away;
            count += 1;
        }

        if count == 0 {
            return Vec2::zeros();
        }
        let goal = goal_sum / count as f64;
        position_correction(&(goal - agent.position), velocity, self.config.dt)
    }

    /// Wall response. Returns the steering term and the agent's velocity
    /// after bouncing off any wall it has crossed.
    ///
    /// Within `perception_radius` of a wall the agent wants to travel at
    /// full speed away from it. A crossed wall flips the outward velocity
    /// component to point back inside.
    pub fn avoid_edges(&self, agent: &Agent) -> (Vec2, Vec2) {
        let cfg = self.config;
        let buffer = cfg.perception_radius;
        let p = agent.position;
        let mut velocity = agent.velocity;
        let mut push = Vec2::zeros();

        if p.x < buffer {
            push.x += 1.0;
            if p.x <= 0.0 {
                velocity.x = velocity.x.abs();
            }
        } else if p.x > cfg.width - buffer {
            push.x -= 1.0;
            if p.x >= cfg.width {
                velocity.x = -velocity.x.abs();
            }
        }

        if p.y < buffer {
            push.y += 1.0;
            if p.y <= 0.0 {
                velocity.y = velocity.y.abs();
            }
        } else if p.y > cfg.height - buffer {
            push.y -= 1.0;
            if p.y >= cfg.height {
                velocity.y = -velocity.y.abs();
            }
        }

        let steer = match scale_to_length(&push, cfg.max_speed) {
            Some(desired) => (desired - velocity) / cfg.dt,
            None => Vec2::zeros(),
        };
        (steer, velocity)
    }

    /// Steers onto `target`. The flag is true once the agent is within the
    /// completion radius.
    pub fn follow_target(&self, agent: &Agent, velocity: &Vec2, target: &PoiRef) -> (Vec2, bool) {
        let delta = target.position - agent.position;
        let arrived = delta.norm() <= self.config.poi_radius;
        (position_correction(&delta, velocity, self.config.dt), arrived)
    }

    /// Nearest known target within perception range; ties go to the
    /// earlier entry in the agent's list.
    pub fn select_target(&self, agent: &Agent) -> Option<PoiRef> {
        let mut best: Option<(f64, PoiRef)> = None;
        for target in agent.targets.targets() {
            let distance = agent.distance_to(&target.position);
            if distance > self.config.perception_radius {
                continue;
            }
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, *target));
            }
        }
        best.map(|(_, target)| target)
    }

    /// Runs the full blend for one agent.
    pub fn steer(&self, agent: &Agent, neighbors: &[&Agent]) -> SteeringOutcome {
        let cfg = self.config;
        let w = &cfg.weights;

        let (edge_raw, velocity) = self.avoid_edges(agent);
        let align = cap(&self.align(&velocity, neighbors), &velocity, cfg);
        let cohesion = cap(&self.cohesion(agent, &velocity, neighbors), &velocity, cfg);
        let separation = cap(&self.separation(agent, &velocity, neighbors), &velocity, cfg);
        let edge = cap(&edge_raw, &velocity, cfg);

        let mut acceleration =
            w.align * align + w.cohesion * cohesion + w.separation * separation + w.edge * edge;

        let selected = self.select_target(agent);
        let (mode, target) = match &selected {
            Some(poi) => {
                let (raw, arrived) = self.follow_target(agent, &velocity, poi);
                let target = cap(&raw, &velocity, cfg);
                acceleration += w.target * target;
                acceleration /= w.flocking_sum() + w.target;
                let mode = if arrived { Mode::Arrived } else { Mode::Approaching };
                (mode, Some(target))
            }
            None => {
                acceleration /= w.flocking_sum();
                (Mode::Swarming, None)
            }
        };

        if mode == Mode::Swarming {
            acceleration = bound_to_min_step(&acceleration, &velocity, agent.facing, cfg);
        }

        SteeringOutcome {
            acceleration,
            velocity,
            mode,
            selected,
            components: SteeringComponents {
                align,
                cohesion,
                separation,
                edge,
                target,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::PoiRef;
    use approx::assert_relative_eq;
    use flockcast_env::{AgentId, PoiId};

    fn agent(id: u32, x: f64, y: f64, vx: f64, vy: f64) -> Agent {
        Agent::new(AgentId(id), Vec2::new(x, y), Vec2::new(vx, vy))
    }

    fn poi(id: u32, x: f64, y: f64) -> PoiRef {
        PoiRef {
            id: PoiId(id),
            position: Vec2::new(x, y),
        }
    }

    #[test]
    fn test_align_matches_average_velocity() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        let a = agent(1, 500.0, 300.0, 0.0, 0.0);
        let n1 = agent(2, 510.0, 300.0, 2.0, 0.0);
        let n2 = agent(3, 490.0, 300.0, 0.0, 2.0);
        let steer = engine.align(&a.velocity, &[&n1, &n2]);
        assert_relative_eq!(steer.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(steer.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_neighbors_means_no_flocking() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        let a = agent(0, 500.0, 300.0, 1.0, 0.0);
        assert_eq!(engine.align(&a.velocity, &[]), Vec2::zeros());
        assert_eq!(engine.cohesion(&a, &a.velocity, &[]), Vec2::zeros());
        assert_eq!(engine.separation(&a, &a.velocity, &[]), Vec2::zeros());
    }

    #[test]
    fn test_cohesion_points_at_centroid() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        let a = agent(0, 500.0, 300.0, 0.0, 0.0);
        let n1 = agent(1, 600.0, 300.0, 0.0, 0.0);
        let n2 = agent(2, 600.0, 400.0, 0.0, 0.0);
        let steer = engine.cohesion(&a, &a.velocity, &[&n1, &n2]);
        // Δp = (100, 50), dt = 1, v = 0 -> 2·Δp
        assert_relative_eq!(steer.x, 200.0, epsilon = 1e-9);
        assert_relative_eq!(steer.y, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_separation_pushes_apart_head_on_pair() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        let a = agent(0, 600.0, 350.0, 4.0, 0.0);
        let b = agent(1, 610.0, 350.0, -4.0, 0.0);

        let outcome_a = engine.steer(&a, &[&b]);
        let outcome_b = engine.steer(&b, &[&a]);

        let to_b = b.position - a.position;
        assert!(outcome_a.components.separation.dot(&to_b) < 0.0);
        assert!(outcome_b.components.separation.dot(&-to_b) < 0.0);
    }

    #[test]
    fn test_separation_ignores_agents_beyond_safe_distance() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        let a = agent(0, 500.0, 300.0, 0.0, 0.0);
        let far = agent(1, 660.0, 300.0, 0.0, 0.0);
        assert_eq!(engine.separation(&a, &a.velocity, &[&far]), Vec2::zeros());
    }

    #[test]
    fn test_separation_splits_coincident_agents() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        let a = agent(0, 500.0, 300.0, 0.0, 0.0);
        let b = agent(1, 500.0, 300.0, 0.0, 0.0);
        let sa = engine.separation(&a, &a.velocity, &[&b]);
        let sb = engine.separation(&b, &b.velocity, &[&a]);
        assert!(sa.x < 0.0);
        assert!(sb.x > 0.0);
    }

    #[test]
    fn test_avoid_edges_pushes_inward_and_bounces() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);

        let near_left = agent(0, 50.0, 350.0, 0.0, 0.0);
        let (steer, velocity) = engine.avoid_edges(&near_left);
        assert!(steer.x > 0.0);
        assert_relative_eq!(steer.y, 0.0, epsilon = 1e-12);
        assert_eq!(velocity, near_left.velocity);

        let crossed = agent(1, -1.0, 350.0, -3.0, 1.0);
        let (_, velocity) = engine.avoid_edges(&crossed);
        assert_eq!(velocity, Vec2::new(3.0, 1.0));

        let corner = agent(2, 1201.0, 701.0, 2.0, 2.0);
        let (steer, velocity) = engine.avoid_edges(&corner);
        assert_eq!(velocity, Vec2::new(-2.0, -2.0));
        assert!(steer.x < 0.0 && steer.y < 0.0);
    }

    #[test]
    fn test_avoid_edges_quiet_in_the_middle() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        let mid = agent(0, 600.0, 350.0, 1.0, 1.0);
        let (steer, velocity) = engine.avoid_edges(&mid);
        assert_eq!(steer, Vec2::zeros());
        assert_eq!(velocity, mid.velocity);
    }

    #[test]
    fn test_select_target_nearest_in_range() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        let mut a = agent(0, 500.0, 300.0, 0.0, 0.0);
        a.targets.insert(poi(0, 800.0, 300.0), 0); // out of range
        a.targets.insert(poi(1, 600.0, 300.0), 2);
        a.targets.insert(poi(2, 550.0, 300.0), 5);
        assert_eq!(engine.select_target(&a).map(|p| p.id), Some(PoiId(2)));
    }

    #[test]
    fn test_select_target_tie_goes_to_first_entry() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        let mut a = agent(0, 500.0, 300.0, 0.0, 0.0);
        a.targets.insert(poi(4, 550.0, 300.0), 1);
        a.targets.insert(poi(3, 450.0, 300.0), 0);
        assert_eq!(engine.select_target(&a).map(|p| p.id), Some(PoiId(4)));
    }

    #[test]
    fn test_steer_modes() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);

        let lone = agent(0, 600.0, 350.0, 1.0, 0.0);
        let outcome = engine.steer(&lone, &[]);
        assert_eq!(outcome.mode, Mode::Swarming);
        assert!(outcome.selected.is_none());
        assert!(outcome.components.target.is_none());

        let mut approaching = agent(1, 600.0, 350.0, 0.0, 0.0);
        approaching.targets.insert(poi(0, 700.0, 350.0), 0);
        let outcome = engine.steer(&approaching, &[]);
        assert_eq!(outcome.mode, Mode::Approaching);
        assert!(outcome.acceleration.x > 0.0);

        let mut arrived = agent(2, 600.0, 350.0, 0.0, 0.0);
        arrived.targets.insert(poi(0, 610.0, 350.0), 0);
        assert_eq!(engine.steer(&arrived, &[]).mode, Mode::Arrived);
    }

    #[test]
    fn test_swarming_floor_applies_before_final_cap() {
        let cfg = SwarmConfig::default();
        let engine = SteeringEngine::new(&cfg);
        // Stationary lone agent in open space: every behaviour is zero
        let still = agent(0, 600.0, 350.0, 0.0, 0.0);
        let outcome = engine.steer(&still, &[]);

        // The blended acceleration clears the minimum step
        let displacement = 0.5 * outcome.acceleration * cfg.dt * cfg.dt;
        assert!(displacement.norm() >= cfg.min_step - 1e-9);

        // The apply-time cap trims it back to the force budget, along the facing
        let applied = cap(&outcome.acceleration, &still.velocity, &cfg);
        assert_relative_eq!(applied.norm(), cfg.max_force, epsilon = 1e-12);
        assert_relative_eq!(applied.x, cfg.max_force, epsilon = 1e-12);
        assert_relative_eq!(applied.y, 0.0, epsilon = 1e-12);
    }
}
