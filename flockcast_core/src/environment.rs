//! Swarm environment: the agent arena, the canonical POI list, and the
//! tick loop that drives both.

use crate::agent::{Agent, Poi};
use crate::config::SwarmConfig;
use crate::scheduler::{Scheduler, TickReport};
use crate::vector::Vec2;

use flockcast_env::{AgentId, PoiId, SwarmError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Read-only view of the world at the start of a tick.
///
/// Every compute task sees the same snapshot; nothing a task produces is
/// visible to another task until the next tick.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Tick being computed (0 for the first tick)
    pub tick: u64,
    pub agents: &'a [Agent],
    pub pois: &'a [Poi],
}

impl<'a> Snapshot<'a> {
    pub fn new(tick: u64, agents: &'a [Agent], pois: &'a [Poi]) -> Self {
        Self { tick, agents, pois }
    }

    /// Agent by id. The arena is indexed by id.
    pub fn agent(&self, id: AgentId) -> Option<&'a Agent> {
        self.agents.get(id.index())
    }
}

/// Initial state of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Owns all simulation state.
pub struct Environment {
    config: SwarmConfig,
    agents: Vec<Agent>,
    pois: Vec<Poi>,
    next_poi_id: u32,
    tick: u64,
    scheduler: Scheduler,
}

impl Environment {
    /// Validates `config` and spawns one agent per placement, ids assigned
    /// in placement order.
    pub fn new(config: SwarmConfig, placements: Vec<Placement>) -> Result<Self, SwarmError> {
        config.validate()?;

        let finite = |v: &Vec2| v.iter().all(|c| c.is_finite());
        if let Some(index) = placements
            .iter()
            .position(|p| !finite(&p.position) || !finite(&p.velocity))
        {
            return Err(SwarmError::config(
                "placements",
                format!("placement {} is not finite", index),
            ));
        }

        let agents: Vec<Agent> = placements
            .into_iter()
            .enumerate()
            .map(|(i, p)| Agent::new(AgentId::from_index(i), p.position, p.velocity))
            .collect();

        let scheduler = Scheduler::new(config.workers)?;
        info!(
            "Environment ready: {} agents, {}x{}, {} compute threads",
            agents.len(),
            config.width,
            config.height,
            scheduler.workers()
        );

        Ok(Self {
            config,
            agents,
            pois: Vec::new(),
            next_poi_id: 0,
            tick: 0,
            scheduler,
        })
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// Canonical POI list, in creation order.
    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn poi(&self, id: PoiId) -> Option<&Poi> {
        self.pois.iter().find(|p| p.id == id)
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of compute threads.
    pub fn workers(&self) -> usize {
        self.scheduler.workers()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(self.tick, &self.agents, &self.pois)
    }

    /// Appends a POI to the canonical list. Ids are never reused.
    pub fn add_poi(&mut self, position: Vec2) -> PoiId {
        let id = PoiId(self.next_poi_id);
        self.next_poi_id += 1;
        self.pois.push(Poi::new(id, position));
        info!("POI {} placed at ({:.1}, {:.1})", id, position.x, position.y);
        id
    }

    /// Drops a POI from the canonical list. Agents that already know it keep
    /// their handle until gossip evicts it.
    pub fn remove_poi(&mut self, id: PoiId) -> Option<Poi> {
        let index = self.pois.iter().position(|p| p.id == id)?;
        let poi = self.pois.remove(index);
        info!("POI {} retired", id);
        Some(poi)
    }

    /// Records the witness count computed by the retirement pass.
    pub fn set_witness_count(&mut self, id: PoiId, count: usize) {
        if let Some(poi) = self.pois.iter_mut().find(|p| p.id == id) {
            poi.witness_count = count;
        }
    }

    /// Runs one tick: compute every agent against the snapshot, then apply.
    ///
    /// On error no agent is modified and the tick counter does not advance.
    pub fn run_tick(&mut self) -> Result<TickReport, SwarmError> {
        let updates = {
            let snapshot = self.snapshot();
            self.scheduler.compute(&snapshot, &self.config)
        };
        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Tick {} discarded: {}", self.tick, e);
                return Err(e);
            }
        };

        self.tick += 1;
        let report = self
            .scheduler
            .apply(&mut self.agents, updates, &self.config, self.tick);
        Ok(report)
    }

    /// Checks the per-agent target invariants. Returns one message per
    /// violation; empty when the state is consistent.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for agent in &self.agents {
            let ids = agent.targets.target_ids();
            for (i, id) in ids.iter().enumerate() {
                if ids[..i].contains(id) {
                    violations.push(format!("{}: duplicate target {}", agent.id, id));
                }
            }
            for entry in agent.targets.iter() {
                if entry.rank > self.config.max_rank {
                    violations.push(format!(
                        "{}: target {} rank {} above {}",
                        agent.id, entry.poi.id, entry.rank, self.config.max_rank
                    ));
                }
            }
            for removed in &agent.removed_targets {
                if agent.targets.contains(removed.id) {
                    violations.push(format!(
                        "{}: target {} both held and removed",
                        agent.id, removed.id
                    ));
                }
            }
            if agent.velocity.norm() > self.config.max_speed + 1e-9 {
                violations.push(format!(
                    "{}: speed {:.3} above {}",
                    agent.id,
                    agent.velocity.norm(),
                    self.config.max_speed
                ));
            }
        }
        violations
    }
}
