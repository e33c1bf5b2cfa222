//! Swarm behaviour scenarios.

use flockcast_env::SwarmError;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SW-001: three agents retire a POI in one tick
    Quorum,

    /// SW-002: a retirement floods to an outside agent one tick later
    Flood,

    /// SW-003: a head-on pair pushes apart
    Separation,

    /// SW-004: identical runs on different worker counts
    Determinism,

    /// SW-005: full swarm with scripted POIs
    Swarm,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Quorum,
            ScenarioId::Flood,
            ScenarioId::Separation,
            ScenarioId::Determinism,
            ScenarioId::Swarm,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Quorum => "quorum",
            ScenarioId::Flood => "flood",
            ScenarioId::Separation => "separation",
            ScenarioId::Determinism => "determinism",
            ScenarioId::Swarm => "swarm",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Quorum => {
                "POI at the centroid of three agents is retired by all three in one tick"
            }
            ScenarioId::Flood => {
                "A fourth agent outside the completion radius evicts the POI one tick later"
            }
            ScenarioId::Separation => {
                "Two agents 10 units apart on a head-on course steer away from each other"
            }
            ScenarioId::Determinism => {
                "Same seed on 1 and N compute threads gives bit-identical state"
            }
            ScenarioId::Swarm => {
                "Seeded swarm with scripted POIs; target invariants hold every tick"
            }
        }
    }

    /// True for scenarios with a fixed hand-built setup; these ignore the
    /// requested agent count and duration.
    pub fn is_fixture(&self) -> bool {
        matches!(self, ScenarioId::Quorum | ScenarioId::Flood | ScenarioId::Separation)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quorum" | "sw-001" => Ok(ScenarioId::Quorum),
            "flood" | "sw-002" => Ok(ScenarioId::Flood),
            "separation" | "sw-003" => Ok(ScenarioId::Separation),
            "determinism" | "sw-004" => Ok(ScenarioId::Determinism),
            "swarm" | "sw-005" => Ok(ScenarioId::Swarm),
            _ => Err(SwarmError::UnknownScenario(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>().unwrap(), scenario);
            assert_eq!(scenario.to_string(), scenario.name());
        }
    }

    #[test]
    fn test_parse_aliases_and_case() {
        assert_eq!("SW-002".parse::<ScenarioId>().unwrap(), ScenarioId::Flood);
        assert_eq!("Swarm".parse::<ScenarioId>().unwrap(), ScenarioId::Swarm);
    }

    #[test]
    fn test_unknown_scenario() {
        let err = "split_brain".parse::<ScenarioId>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown scenario: split_brain");
    }
}
