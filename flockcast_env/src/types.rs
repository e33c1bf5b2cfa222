//! Common identity types shared by every Flockcast crate.

use serde::{Deserialize, Serialize};

/// Stable identity of an agent (boid).
///
/// Doubles as the agent's index in the environment arena, so ids are dense
/// and assigned in spawn order. Never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    /// Returns the arena index for this agent.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Creates an id from an arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", alpha_label(self.0, b'A'))
    }
}

/// Unique identity of a point of interest.
///
/// Allocated from a monotonically increasing counter; a retired POI's id is
/// never handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoiId(pub u32);

impl std::fmt::Display for PoiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", alpha_label(self.0, b'a'))
    }
}

/// Spreadsheet-style letter label: 0 -> A, 25 -> Z, 26 -> AA, ...
fn alpha_label(mut n: u32, base: u8) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((base + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_labels() {
        assert_eq!(AgentId(0).to_string(), "A");
        assert_eq!(AgentId(25).to_string(), "Z");
        assert_eq!(AgentId(26).to_string(), "AA");
        assert_eq!(AgentId(27).to_string(), "AB");
        assert_eq!(AgentId(701).to_string(), "ZZ");
        assert_eq!(AgentId(702).to_string(), "AAA");
    }

    #[test]
    fn test_poi_labels_are_lowercase() {
        assert_eq!(PoiId(0).to_string(), "a");
        assert_eq!(PoiId(2).to_string(), "c");
        assert_eq!(PoiId(28).to_string(), "ac");
    }

    #[test]
    fn test_agent_id_index_roundtrip() {
        let id = AgentId::from_index(7);
        assert_eq!(id.index(), 7);
        assert!(AgentId(1) < AgentId(2));
    }
}
