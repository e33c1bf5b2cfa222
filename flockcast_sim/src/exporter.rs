//! JSON exporter for replaying runs in an external viewer.
//!
//! Each frame carries what a renderer needs (label, position, facing) plus
//! the swarm's decision state (mode, targets, ranks, witness counts).

use flockcast_core::{Environment, Mode};
use flockcast_env::SwarmError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    pub tick: u64,

    /// Simulation time in seconds
    pub time_sec: f64,

    pub agents: Vec<AgentFrame>,

    pub pois: Vec<PoiFrame>,
}

/// Agent frame data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFrame {
    pub label: String,
    pub x: f64,
    pub y: f64,

    /// Heading in radians
    pub facing: f64,

    pub mode: Mode,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub targets: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ranks: Vec<u32>,
}

/// POI frame data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiFrame {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub witness_count: usize,
}

impl SimFrame {
    /// Captures the environment's current state.
    pub fn capture(env: &Environment, time_sec: f64) -> Self {
        let agents = env
            .agents()
            .iter()
            .map(|a| AgentFrame {
                label: a.id.to_string(),
                x: a.position.x,
                y: a.position.y,
                facing: a.facing,
                mode: a.mode,
                targets: a.targets.target_ids().iter().map(|id| id.to_string()).collect(),
                ranks: a.targets.ranks(),
            })
            .collect();

        let pois = env
            .pois()
            .iter()
            .map(|p| PoiFrame {
                label: p.id.to_string(),
                x: p.position.x,
                y: p.position.y,
                witness_count: p.witness_count,
            })
            .collect();

        Self {
            tick: env.tick(),
            time_sec,
            agents,
            pois,
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SwarmError> {
        let json = serde_json::to_string_pretty(self).map_err(SwarmError::export)?;
        let mut file = File::create(path).map_err(SwarmError::export)?;
        file.write_all(json.as_bytes()).map_err(SwarmError::export)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flockcast_core::{Placement, SwarmConfig, Vec2};

    fn env() -> Environment {
        let placements = vec![
            Placement {
                position: Vec2::new(100.0, 100.0),
                velocity: Vec2::new(1.0, 0.0),
            },
            Placement {
                position: Vec2::new(150.0, 100.0),
                velocity: Vec2::zeros(),
            },
        ];
        Environment::new(SwarmConfig::default(), placements).unwrap()
    }

    #[test]
    fn test_capture_labels_and_targets() {
        let mut env = env();
        env.add_poi(Vec2::new(120.0, 120.0));
        env.run_tick().unwrap();

        let frame = SimFrame::capture(&env, 1.0 / 15.0);
        assert_eq!(frame.tick, 1);
        assert_eq!(frame.agents[0].label, "A");
        assert_eq!(frame.agents[1].label, "B");
        assert_eq!(frame.agents[0].targets, vec!["a".to_string()]);
        assert_eq!(frame.agents[0].ranks, vec![0]);
        assert_eq!(frame.pois[0].label, "a");
    }

    #[test]
    fn test_export_json_shape() {
        let mut export = SimExport::new("quorum", 42);
        export.add_frame(SimFrame::capture(&env(), 0.5));
        export.finalize(true, None);

        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["scenario"], "quorum");
        assert_eq!(value["duration_sec"], 0.5);
        assert_eq!(value["frames"][0]["agents"][0]["mode"], "swarming");
        assert!(value["frames"][0]["agents"][0].get("targets").is_none());
        assert!(value.get("failure_reason").is_none());
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir()
            .join(format!("flockcast-export-{}.json", std::process::id()));
        let mut export = SimExport::new("swarm", 7);
        export.add_frame(SimFrame::capture(&env(), 0.0));
        export.write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: SimExport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.seed, 7);
        assert_eq!(back.frames.len(), 1);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_to_bad_path_is_export_error() {
        let export = SimExport::new("swarm", 7);
        let err = export.write_to_file("/nonexistent-dir/flockcast/out.json").unwrap_err();
        assert!(matches!(err, SwarmError::Export(_)));
    }
}
