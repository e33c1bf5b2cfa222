//! Error types for Flockcast.

use crate::types::AgentId;
use thiserror::Error;

/// Errors that can occur while configuring or stepping a swarm.
#[derive(Debug, Error)]
pub enum SwarmError {
    /// A configuration value is out of range (fatal at startup)
    #[error("Invalid config `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// An agent's compute step produced NaN/inf; the whole tick is discarded
    #[error("Agent {agent} produced a non-finite state at tick {tick}")]
    NonFiniteState { agent: AgentId, tick: u64 },

    /// The compute worker pool could not be built
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Frame export failed
    #[error("Export error: {0}")]
    Export(String),

    /// Scenario name not recognised
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}

impl SwarmError {
    /// Creates a configuration error.
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Creates an export error.
    pub fn export(err: impl std::fmt::Display) -> Self {
        Self::Export(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SwarmError::config("dt", "must be positive");
        assert_eq!(err.to_string(), "Invalid config `dt`: must be positive");

        let err = SwarmError::NonFiniteState {
            agent: AgentId(1),
            tick: 4,
        };
        assert_eq!(err.to_string(), "Agent B produced a non-finite state at tick 4");
    }
}
