//! SimWorld - The simulation harness container.

use crate::input::PoiSource;
use crate::oracle::PoiOracle;

use flockcast_core::{Environment, Placement, Poi, SwarmConfig, TickReport, Vec2};
use flockcast_env::SwarmError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitCircle};
use tracing::debug;

/// How the initial agents are placed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlacementPolicy {
    /// Uniform positions in the world, full speed, uniform heading
    #[default]
    Random,

    /// Exactly these agents, in id order
    Explicit(Vec<Placement>),
}

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Engine configuration
    pub swarm: SwarmConfig,

    /// Number of ticks a scenario runs for
    pub duration_ticks: u64,

    pub placement: PlacementPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            swarm: SwarmConfig::default(),
            duration_ticks: 600,
            placement: PlacementPolicy::Random,
        }
    }
}

/// Seeded initial placements: uniform position, speed `max_speed`, uniform
/// heading.
pub fn random_placements(seed: u64, config: &SwarmConfig) -> Vec<Placement> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..config.num_agents)
        .map(|_| {
            let position = Vec2::new(
                rng.gen_range(0.0..config.width),
                rng.gen_range(0.0..config.height),
            );
            let [hx, hy]: [f64; 2] = UnitCircle.sample(&mut rng);
            Placement {
                position,
                velocity: Vec2::new(hx, hy) * config.max_speed,
            }
        })
        .collect()
}

/// The SimWorld - environment plus its input and retirement collaborators.
///
/// One [`SimWorld::step`] is one full tick:
/// poll the POI source, run the engine tick, retire completed POIs.
pub struct SimWorld {
    config: SimConfig,
    env: Environment,
    source: Option<Box<dyn PoiSource>>,
    oracle: PoiOracle,
    pois_spawned: usize,
    retired: Vec<Poi>,
}

impl SimWorld {
    /// Creates a new SimWorld with the given configuration.
    pub fn new(config: SimConfig) -> Result<Self, SwarmError> {
        // Derive separate seeds for different subsystems
        let placement_seed = config.seed.wrapping_mul(0x9e3779b97f4a7c15);

        let placements = match &config.placement {
            PlacementPolicy::Random => random_placements(placement_seed, &config.swarm),
            PlacementPolicy::Explicit(placements) => placements.clone(),
        };
        let env = Environment::new(config.swarm.clone(), placements)?;
        let oracle = PoiOracle::for_environment(&env);

        Ok(Self {
            config,
            env,
            source: None,
            oracle,
            pois_spawned: 0,
            retired: Vec::new(),
        })
    }

    /// Attaches a POI source.
    pub fn with_source(mut self, source: impl PoiSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Seed for POI scripts, derived from the master seed.
    pub fn poi_seed(&self) -> u64 {
        self.config.seed.wrapping_mul(0x517cc1b727220a95)
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) -> Result<TickReport, SwarmError> {
        if let Some(source) = self.source.as_mut() {
            for position in source.poll(self.env.tick()) {
                self.env.add_poi(position);
                self.pois_spawned += 1;
            }
        }

        let report = self.env.run_tick()?;
        let retired = self.oracle.retire(&mut self.env);
        if !retired.is_empty() {
            debug!("Tick {}: {} POI(s) retired", report.tick, retired.len());
        }
        self.retired.extend(retired);
        Ok(report)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Direct access for scenarios that place POIs by hand.
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Returns the current tick count.
    pub fn tick_count(&self) -> u64 {
        self.env.tick()
    }

    /// Returns the number of agents.
    pub fn agent_count(&self) -> usize {
        self.env.agents().len()
    }

    pub fn pois_spawned(&self) -> usize {
        self.pois_spawned
    }

    /// POIs retired so far, in retirement order.
    pub fn retired(&self) -> &[Poi] {
        &self.retired
    }

    /// True when the source is exhausted and every POI has been retired.
    pub fn is_settled(&self) -> bool {
        self.source.as_ref().map_or(true, |s| s.is_exhausted()) && self.env.pois().is_empty()
    }
}
