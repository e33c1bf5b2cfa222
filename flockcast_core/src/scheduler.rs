//! Two-phase tick scheduling: parallel compute, barrier, serial apply.
//!
//! ```text
//!   snapshot ──► [compute A] [compute B] [compute C] ...   (rayon pool, read-only)
//!                      │           │           │
//!                      └─────── barrier ───────┘           (collect)
//!                                  │
//!                 apply A ─► apply B ─► apply C ...         (each agent writes itself)
//! ```
//!
//! Compute tasks take the snapshot by shared borrow and apply needs the
//! agents mutably, so the barrier is enforced by the borrow checker: no
//! write can start while any compute task still holds the snapshot.

use crate::agent::{Agent, Mode, PoiRef, TargetBook};
use crate::config::SwarmConfig;
use crate::environment::Snapshot;
use crate::gossip::exchange;
use crate::kinematics::{cap, integrate};
use crate::neighbors::neighbors;
use crate::steering::SteeringEngine;
use crate::vector::{heading, Vec2};

use flockcast_env::{AgentId, SwarmError};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Everything one compute task hands to the apply phase.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentUpdate {
    pub id: AgentId,
    pub acceleration: Vec2,
    /// Velocity after any wall bounce
    pub velocity: Vec2,
    pub mode: Mode,
    pub targets: TargetBook,
    pub removed_targets: Vec<PoiRef>,
    pub quorum_evictions: usize,
    pub flood_evictions: usize,
}

/// Summary of one completed tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number that just completed (1-based)
    pub tick: u64,
    pub swarming: usize,
    pub approaching: usize,
    pub arrived: usize,
    pub quorum_evictions: usize,
    pub flood_evictions: usize,
}

/// Computes one agent's update from the snapshot.
///
/// Fails only if the agent's state or the result is not finite, which
/// would poison every neighbour on the next tick.
pub fn compute_agent(
    agent: &Agent,
    snapshot: &Snapshot<'_>,
    config: &SwarmConfig,
) -> Result<AgentUpdate, SwarmError> {
    let neighbors = neighbors(agent, snapshot, config.perception_radius);
    let steering = SteeringEngine::new(config).steer(agent, &neighbors);
    let gossip = exchange(agent, &neighbors, snapshot.pois, config);

    let finite = is_finite(&agent.position)
        && is_finite(&steering.acceleration)
        && is_finite(&steering.velocity);
    if !finite {
        return Err(SwarmError::NonFiniteState {
            agent: agent.id,
            tick: snapshot.tick,
        });
    }

    Ok(AgentUpdate {
        id: agent.id,
        acceleration: steering.acceleration,
        velocity: steering.velocity,
        mode: steering.mode,
        targets: gossip.targets,
        removed_targets: gossip.removed_targets,
        quorum_evictions: gossip.quorum_evictions,
        flood_evictions: gossip.flood_evictions,
    })
}

/// Writes an update into its agent and integrates one step.
pub fn apply_update(agent: &mut Agent, update: AgentUpdate, config: &SwarmConfig) {
    if agent.targets != update.targets {
        debug!(
            "{}: targets {} -> {}, ranks {:?} -> {:?}",
            agent.id,
            fmt_targets(&agent.targets),
            fmt_targets(&update.targets),
            agent.targets.ranks(),
            update.targets.ranks(),
        );
    }

    agent.velocity = update.velocity;
    agent.mode = update.mode;
    agent.acceleration = cap(&update.acceleration, &agent.velocity, config);
    agent.targets = update.targets;
    agent.removed_targets = update.removed_targets;

    if agent.mode == Mode::Arrived {
        agent.freeze();
        return;
    }

    if agent.velocity.norm() > 0.0 {
        agent.facing = heading(&agent.velocity);
    }
    let (position, velocity) =
        integrate(&agent.position, &agent.velocity, &agent.acceleration, config.dt);
    agent.position = position;
    agent.velocity = velocity;
}

/// Runs the compute and apply phases of a tick.
pub struct Scheduler {
    pool: ThreadPool,
}

impl Scheduler {
    /// Builds the compute pool. `workers == 0` lets rayon pick one thread
    /// per core.
    pub fn new(workers: usize) -> Result<Self, SwarmError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("flockcast-compute-{}", i))
            .build()
            .map_err(|e| SwarmError::WorkerPool(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Number of compute threads.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Compute phase. Returns one update per agent, in arena order, or the
    /// first failure; a failed tick yields no updates at all.
    pub fn compute(
        &self,
        snapshot: &Snapshot<'_>,
        config: &SwarmConfig,
    ) -> Result<Vec<AgentUpdate>, SwarmError> {
        self.pool.install(|| {
            snapshot
                .agents
                .par_iter()
                .map(|agent| compute_agent(agent, snapshot, config))
                .collect()
        })
    }

    /// Apply phase. `updates` must be in arena order.
    pub fn apply(
        &self,
        agents: &mut [Agent],
        updates: Vec<AgentUpdate>,
        config: &SwarmConfig,
        tick: u64,
    ) -> TickReport {
        let mut report = TickReport {
            tick,
            ..Default::default()
        };

        for (agent, update) in agents.iter_mut().zip(updates) {
            debug_assert_eq!(agent.id, update.id);
            report.quorum_evictions += update.quorum_evictions;
            report.flood_evictions += update.flood_evictions;
            apply_update(agent, update, config);

            match agent.mode {
                Mode::Swarming => report.swarming += 1,
                Mode::Approaching => report.approaching += 1,
                Mode::Arrived => report.arrived += 1,
            }
        }
        report
    }
}

fn is_finite(v: &Vec2) -> bool {
    v.iter().all(|c| c.is_finite())
}

fn fmt_targets(book: &TargetBook) -> String {
    let labels: Vec<String> = book.target_ids().iter().map(|id| id.to_string()).collect();
    format!("[{}]", labels.join(", "))
}
