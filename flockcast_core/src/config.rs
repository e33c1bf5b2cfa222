//! Swarm configuration constants.
//!
//! All values are fixed at startup. `SwarmConfig::validate` is the single
//! gate: an `Environment` is never built from a config that fails it, so the
//! engines below can assume positive radii and a positive `dt`.

use flockcast_env::SwarmError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Relative weights of the blended steering behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorWeights {
    pub align: f64,
    pub cohesion: f64,
    pub separation: f64,
    pub edge: f64,
    /// Only counted in the normaliser on ticks where a target is selected
    pub target: f64,
}

impl BehaviorWeights {
    /// Sum of the flocking weights (everything except `target`).
    pub fn flocking_sum(&self) -> f64 {
        self.align + self.cohesion + self.separation + self.edge
    }
}

impl Default for BehaviorWeights {
    fn default() -> Self {
        Self {
            align: 0.2,
            cohesion: 0.2,
            separation: 0.4,
            edge: 0.4,
            target: 3.0,
        }
    }
}

/// Configuration for a swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// World width (x spans `0..width`)
    pub width: f64,

    /// World height (y spans `0..height`)
    pub height: f64,

    /// Number of agents spawned at startup
    pub num_agents: usize,

    /// Fixed physics time step (not wall-clock derived)
    pub dt: f64,

    /// Sentinel "unknown / lowest priority" rank
    pub max_rank: u32,

    /// Minimum displacement per tick while swarming
    pub min_step: f64,

    /// Physical speed limit
    pub max_speed: f64,

    /// Force budget per steering component
    pub max_force: f64,

    /// Neighbour and POI detection radius
    pub perception_radius: f64,

    /// Distance below which separation kicks in
    pub safe_distance: f64,

    /// Steering blend weights
    pub weights: BehaviorWeights,

    /// Completion radius around a POI
    pub poi_radius: f64,

    /// Witnesses (self included) needed to retire a POI
    pub quorum: usize,

    /// Tick driver rate in Hz
    pub tick_rate_hz: u32,

    /// Compute worker threads (0 = one per core)
    pub workers: usize,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 700.0,
            num_agents: 10,
            dt: 1.0,
            max_rank: 7,
            min_step: 1.5,
            max_speed: 4.0,
            max_force: 0.15,
            perception_radius: 200.0,
            safe_distance: 150.0,
            weights: BehaviorWeights::default(),
            poi_radius: 20.0,
            quorum: 3,
            tick_rate_hz: 15,
            workers: 0,
        }
    }
}

impl SwarmConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SwarmError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SwarmError::config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SwarmError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SwarmError::config("path", format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Sets the number of agents.
    pub fn with_agents(mut self, num_agents: usize) -> Self {
        self.num_agents = num_agents;
        self
    }

    /// Sets the compute worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the world bounds.
    pub fn with_bounds(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Wall-clock period between ticks at `tick_rate_hz`.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }

    /// Checks every constant; the first violation is returned.
    pub fn validate(&self) -> Result<(), SwarmError> {
        positive("width", self.width)?;
        positive("height", self.height)?;
        positive("dt", self.dt)?;
        non_negative("min_step", self.min_step)?;
        positive("max_speed", self.max_speed)?;
        positive("max_force", self.max_force)?;
        positive("perception_radius", self.perception_radius)?;
        non_negative("safe_distance", self.safe_distance)?;
        positive("poi_radius", self.poi_radius)?;

        let w = &self.weights;
        non_negative("weights.align", w.align)?;
        non_negative("weights.cohesion", w.cohesion)?;
        non_negative("weights.separation", w.separation)?;
        non_negative("weights.edge", w.edge)?;
        non_negative("weights.target", w.target)?;
        if w.flocking_sum() <= 0.0 {
            return Err(SwarmError::config(
                "weights",
                "flocking weights must not all be zero",
            ));
        }

        if self.quorum == 0 {
            return Err(SwarmError::config("quorum", "must be at least 1"));
        }
        if self.tick_rate_hz == 0 {
            return Err(SwarmError::config("tick_rate_hz", "must be at least 1"));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), SwarmError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SwarmError::config(field, format!("must be positive and finite, got {}", value)))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), SwarmError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SwarmError::config(field, format!("must be non-negative and finite, got {}", value)))
    }
}
