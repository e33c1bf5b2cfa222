//! Scenario runner - executes swarm behaviour scenarios.

use crate::driver::TickDriver;
use crate::exporter::{SimExport, SimFrame};
use crate::input::PoiScript;
use crate::scenarios::ScenarioId;
use crate::world::{PlacementPolicy, SimConfig, SimWorld};

use flockcast_core::neighbors::neighbors;
use flockcast_core::{Placement, SteeringEngine, SwarmConfig, TickReport, Vec2};
use flockcast_env::{AgentId, PoiId, SwarmContext, SwarmError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Number of POIs still in the canonical list at the end
    pub final_poi_count: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,

    /// Recorded frames, when recording was requested
    pub export: Option<SimExport>,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioMetrics {
    pub pois_spawned: usize,
    pub pois_retired: usize,

    /// Local retirements by quorum, summed over agents and ticks
    pub quorum_evictions: u64,

    /// Local retirements by eviction flood, summed over agents and ticks
    pub flood_evictions: u64,

    /// Most agents simultaneously in the arrived state
    pub max_arrived: usize,

    /// Target-invariant violations observed at tick boundaries
    pub invariant_violations: u64,
}

impl ScenarioMetrics {
    fn record(&mut self, report: &TickReport) {
        self.quorum_evictions += report.quorum_evictions as u64;
        self.flood_evictions += report.flood_evictions as u64;
        self.max_arrived = self.max_arrived.max(report.arrived);
    }
}

/// Per-run bookkeeping shared by every scenario.
struct Trial {
    metrics: ScenarioMetrics,
    export: Option<SimExport>,
    record_every: Option<u64>,
    first_violation: Option<String>,
}

impl Trial {
    fn observe(&mut self, world: &SimWorld, report: &TickReport, time_sec: f64) {
        self.metrics.record(report);

        let violations = world.env().invariant_violations();
        if !violations.is_empty() {
            warn!("Tick {}: {}", report.tick, violations.join("; "));
            self.metrics.invariant_violations += violations.len() as u64;
            if self.first_violation.is_none() {
                self.first_violation = Some(format!("tick {}: {}", report.tick, violations[0]));
            }
        }

        if let (Some(export), Some(every)) = (self.export.as_mut(), self.record_every) {
            if report.tick % every == 0 {
                export.add_frame(SimFrame::capture(world.env(), time_sec));
            }
        }
    }
}

/// Runs swarm scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Engine configuration shared by every scenario
    base: SwarmConfig,

    /// Ticks for the open-ended scenarios
    ticks: u64,

    /// Record a frame every this many ticks
    record_every: Option<u64>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            base: SwarmConfig::default(),
            ticks: SimConfig::default().duration_ticks,
            record_every: None,
        }
    }

    /// Sets the engine configuration.
    pub fn with_config(mut self, config: SwarmConfig) -> Self {
        self.base = config;
        self
    }

    /// Sets the number of agents for the open-ended scenarios.
    pub fn with_agents(mut self, num_agents: usize) -> Self {
        self.base.num_agents = num_agents;
        self
    }

    /// Sets the compute thread count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.base.workers = workers;
        self
    }

    /// Sets the duration of the open-ended scenarios.
    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.ticks = ticks;
        self
    }

    /// Records a frame every `every` ticks into the result's export.
    pub fn with_recording(mut self, every: u64) -> Self {
        self.record_every = Some(every.max(1));
        self
    }

    /// Runs a scenario on the given clock and returns the result.
    pub async fn run<C: SwarmContext>(&self, scenario: ScenarioId, ctx: Arc<C>) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let driver = TickDriver::new(ctx, self.base.tick_period());
        let started = driver.context().now();
        let mut trial = Trial {
            metrics: ScenarioMetrics::default(),
            export: self.record_every.map(|_| SimExport::new(scenario.name(), self.seed)),
            record_every: self.record_every,
            first_violation: None,
        };

        let outcome = match scenario {
            ScenarioId::Quorum => self.run_quorum(&driver, &mut trial).await,
            ScenarioId::Flood => self.run_flood(&driver, &mut trial).await,
            ScenarioId::Separation => self.run_separation(&driver, &mut trial).await,
            ScenarioId::Determinism => self.run_determinism(&driver, &mut trial).await,
            ScenarioId::Swarm => self.run_swarm(&driver, &mut trial).await,
        };

        let (total_ticks, final_poi_count, failure_reason) = match outcome {
            Ok(end) => {
                let failure = end.failure.or_else(|| trial.first_violation.take());
                (end.ticks, end.final_poi_count, failure)
            }
            Err(e) => (0, 0, Some(e.to_string())),
        };
        let passed = failure_reason.is_none();

        if let Some(export) = trial.export.as_mut() {
            export.finalize(passed, failure_reason.clone());
        }

        let final_time_secs = driver.context().now().saturating_sub(started).as_secs_f64();
        info!(
            "Finished scenario: {} after {} ticks ({} POIs retired)",
            scenario.name(),
            total_ticks,
            trial.metrics.pois_retired
        );

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed,
            total_ticks,
            final_time_secs,
            final_poi_count,
            failure_reason,
            metrics: trial.metrics,
            export: trial.export,
        }
    }

    /// Builds a world from hand-placed agents.
    fn fixture(
        &self,
        placements: Vec<Placement>,
        script: PoiScript,
    ) -> Result<SimWorld, SwarmError> {
        let config = SimConfig {
            seed: self.seed,
            swarm: self.base.clone().with_agents(placements.len()),
            duration_ticks: self.ticks,
            placement: PlacementPolicy::Explicit(placements),
        };
        Ok(SimWorld::new(config)?.with_source(script))
    }

    /// Builds a seeded random world with `count` scripted POIs.
    fn seeded(&self, config: SwarmConfig, count: usize) -> Result<SimWorld, SwarmError> {
        let sim = SimConfig {
            seed: self.seed,
            swarm: config,
            duration_ticks: self.ticks,
            placement: PlacementPolicy::Random,
        };
        let world = SimWorld::new(sim)?;
        let interval = (self.ticks / (count as u64 + 1)).max(1);
        let script = PoiScript::random(world.poi_seed(), &world.config().swarm, count, interval);
        Ok(world.with_source(script))
    }

    async fn advance<C: SwarmContext>(
        &self,
        driver: &TickDriver<C>,
        world: &mut SimWorld,
        trial: &mut Trial,
    ) -> Result<TickReport, SwarmError> {
        let report = driver.tick(world).await?;
        let time_sec = report.tick as f64 * driver.period().as_secs_f64();
        trial.observe(world, &report, time_sec);
        trial.metrics.pois_spawned = world.pois_spawned();
        trial.metrics.pois_retired = world.retired().len();
        Ok(report)
    }

    /// SW-001: three agents 10 units from a POI at their centroid.
    ///
    /// **Assertion**: after one tick the POI is in no target book, in every
    /// agent's removed list, and gone from the canonical list.
    async fn run_quorum<C: SwarmContext>(
        &self,
        driver: &TickDriver<C>,
        trial: &mut Trial,
    ) -> Result<End, SwarmError> {
        info!("SW-001: Quorum - local retirement in one tick");
        let mut world = self.fixture(
            vec![still(590.0, 350.0), still(610.0, 350.0), still(600.0, 360.0)],
            PoiScript::new().at(0, Vec2::new(600.0, 350.0)),
        )?;
        let poi = PoiId(0);

        self.advance(driver, &mut world, trial).await?;

        let mut failure = None;
        for agent in world.env().agents() {
            if agent.targets.contains(poi) {
                failure = Some(format!("{} still targets {}", agent.id, poi));
                break;
            }
            if !agent.removed_targets.iter().any(|t| t.id == poi) {
                failure = Some(format!("{} did not record {} as removed", agent.id, poi));
                break;
            }
        }
        if failure.is_none() && world.env().poi(poi).is_some() {
            failure = Some(format!("{} was not retired globally", poi));
        }
        Ok(End::new(&world, failure))
    }

    /// SW-002: the quorum setup plus an agent 100 units away.
    ///
    /// **Assertion**: the outsider holds the POI after tick 1 and has evicted
    /// it after tick 2.
    async fn run_flood<C: SwarmContext>(
        &self,
        driver: &TickDriver<C>,
        trial: &mut Trial,
    ) -> Result<End, SwarmError> {
        info!("SW-002: Flood - eviction spreads one hop per tick");
        let mut world = self.fixture(
            vec![
                still(590.0, 350.0),
                still(610.0, 350.0),
                still(600.0, 360.0),
                still(700.0, 350.0),
            ],
            PoiScript::new().at(0, Vec2::new(600.0, 350.0)),
        )?;
        let poi = PoiId(0);
        let outsider = AgentId(3);

        self.advance(driver, &mut world, trial).await?;
        let holds = |world: &SimWorld| {
            world
                .env()
                .agent(outsider)
                .map_or(false, |a| a.targets.contains(poi))
        };
        if !holds(&world) {
            return Ok(End::new(&world, Some(format!("{} never learned {}", outsider, poi))));
        }

        self.advance(driver, &mut world, trial).await?;
        let failure = if holds(&world) {
            Some(format!("{} still targets {} after the flood", outsider, poi))
        } else {
            None
        };
        Ok(End::new(&world, failure))
    }

    /// SW-003: two agents 10 units apart closing head-on.
    ///
    /// **Assertion**: each separation component points away from the other
    /// agent, and the pair ends further apart than it started.
    async fn run_separation<C: SwarmContext>(
        &self,
        driver: &TickDriver<C>,
        trial: &mut Trial,
    ) -> Result<End, SwarmError> {
        info!("SW-003: Separation - head-on pair");
        let mut world = self.fixture(
            vec![moving(600.0, 350.0, 1.0, 0.0), moving(610.0, 350.0, -1.0, 0.0)],
            PoiScript::new(),
        )?;

        {
            let env = world.env();
            let snapshot = env.snapshot();
            let engine = SteeringEngine::new(env.config());
            for agent in env.agents() {
                let near = neighbors(agent, &snapshot, env.config().perception_radius);
                let Some(other) = near.first() else {
                    return Ok(End::new(&world, Some(format!("{} has no neighbour", agent.id))));
                };
                let separation = engine.steer(agent, &near).components.separation;
                if separation.dot(&(other.position - agent.position)) >= 0.0 {
                    return Ok(End::new(
                        &world,
                        Some(format!("{} separation points toward {}", agent.id, other.id)),
                    ));
                }
            }
        }

        let gap = |world: &SimWorld| {
            let agents = world.env().agents();
            (agents[1].position - agents[0].position).norm()
        };
        let initial = gap(&world);
        for _ in 0..60 {
            self.advance(driver, &mut world, trial).await?;
        }
        let last = gap(&world);
        debug!("  gap {:.2} -> {:.2}", initial, last);

        let failure = if last > initial {
            None
        } else {
            Some(format!("gap shrank from {:.2} to {:.2}", initial, last))
        };
        Ok(End::new(&world, failure))
    }

    /// SW-004: the same seeded world on one compute thread and on several.
    ///
    /// **Assertion**: agent and POI state are bit-identical after every run.
    async fn run_determinism<C: SwarmContext>(
        &self,
        driver: &TickDriver<C>,
        trial: &mut Trial,
    ) -> Result<End, SwarmError> {
        info!("SW-004: Determinism - 1 vs N compute threads");
        let parallel = self.base.workers.max(4);
        let mut serial_world = self.seeded(self.base.clone().with_workers(1), 3)?;
        let mut parallel_world = self.seeded(self.base.clone().with_workers(parallel), 3)?;

        for _ in 0..self.ticks {
            self.advance(driver, &mut serial_world, trial).await?;
            parallel_world.step()?;

            let a = serial_world.env();
            let b = parallel_world.env();
            if a.agents() != b.agents() || a.pois() != b.pois() {
                let failure = format!("1 and {} threads diverged at tick {}", parallel, a.tick());
                return Ok(End::new(&serial_world, Some(failure)));
            }
        }
        Ok(End::new(&serial_world, None))
    }

    /// SW-005: seeded swarm with scripted POIs.
    ///
    /// **Assertion**: the target invariants hold at every tick boundary.
    /// Retirement progress is reported in the metrics.
    async fn run_swarm<C: SwarmContext>(
        &self,
        driver: &TickDriver<C>,
        trial: &mut Trial,
    ) -> Result<End, SwarmError> {
        info!(
            "SW-005: Swarm - {} agents, {} ticks",
            self.base.num_agents, self.ticks
        );
        let mut world = self.seeded(self.base.clone(), 3)?;

        for _ in 0..self.ticks {
            let report = self.advance(driver, &mut world, trial).await?;
            if report.tick % 100 == 0 {
                debug!(
                    "  tick={} | swarming={} approaching={} arrived={} | pois={}",
                    report.tick,
                    report.swarming,
                    report.approaching,
                    report.arrived,
                    world.env().pois().len()
                );
            }
            if world.is_settled() {
                info!("All {} POIs retired by tick {}", world.pois_spawned(), report.tick);
                break;
            }
        }
        Ok(End::new(&world, None))
    }
}

/// How a scenario ended, before the trial's own findings are merged in.
struct End {
    ticks: u64,
    final_poi_count: usize,
    failure: Option<String>,
}

impl End {
    fn new(world: &SimWorld, failure: Option<String>) -> Self {
        Self {
            ticks: world.tick_count(),
            final_poi_count: world.env().pois().len(),
            failure,
        }
    }
}

fn still(x: f64, y: f64) -> Placement {
    moving(x, y, 0.0, 0.0)
}

fn moving(x: f64, y: f64, vx: f64, vy: f64) -> Placement {
    Placement {
        position: Vec2::new(x, y),
        velocity: Vec2::new(vx, vy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;

    async fn run(scenario: ScenarioId, runner: ScenarioRunner) -> ScenarioResult {
        runner.run(scenario, SimContext::shared(42)).await
    }

    #[tokio::test]
    async fn test_quorum_scenario() {
        let result = run(ScenarioId::Quorum, ScenarioRunner::new(42)).await;
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.total_ticks, 1);
        assert_eq!(result.final_poi_count, 0);
        assert_eq!(result.metrics.quorum_evictions, 3);
        assert_eq!(result.metrics.pois_retired, 1);
    }

    #[tokio::test]
    async fn test_flood_scenario() {
        let result = run(ScenarioId::Flood, ScenarioRunner::new(42)).await;
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.total_ticks, 2);
        assert_eq!(result.metrics.flood_evictions, 1);
    }

    #[tokio::test]
    async fn test_separation_scenario() {
        let result = run(ScenarioId::Separation, ScenarioRunner::new(42)).await;
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.invariant_violations, 0);
    }

    #[tokio::test]
    async fn test_determinism_scenario() {
        let runner = ScenarioRunner::new(7).with_agents(16).with_ticks(120);
        let result = run(ScenarioId::Determinism, runner).await;
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.total_ticks, 120);
    }

    #[tokio::test]
    async fn test_swarm_scenario_keeps_invariants() {
        let runner = ScenarioRunner::new(42).with_ticks(300);
        let result = run(ScenarioId::Swarm, runner).await;
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.invariant_violations, 0);
        assert!(result.metrics.pois_spawned >= 1);
    }

    #[tokio::test]
    async fn test_virtual_time_follows_ticks() {
        let runner = ScenarioRunner::new(42).with_ticks(30);
        let result = run(ScenarioId::Swarm, runner).await;
        let period = SwarmConfig::default().tick_period().as_secs_f64();
        assert!((result.final_time_secs - result.total_ticks as f64 * period).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_recording_collects_frames() {
        let runner = ScenarioRunner::new(42).with_ticks(40).with_recording(10);
        let result = run(ScenarioId::Swarm, runner).await;
        let export = result.export.expect("recording was requested");
        assert_eq!(export.scenario, "swarm");
        assert_eq!(export.frames.len() as u64, result.total_ticks / 10);
        assert_eq!(export.passed, result.passed);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_scenario() {
        let config = SwarmConfig {
            dt: 0.0,
            ..SwarmConfig::default()
        };
        let result = run(ScenarioId::Quorum, ScenarioRunner::new(1).with_config(config)).await;
        assert!(!result.passed);
        assert!(result.failure_reason.unwrap().contains("dt"));
    }
}
