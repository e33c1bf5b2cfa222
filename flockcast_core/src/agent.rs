//! Agent and point-of-interest records.
//!
//! Agents never own POIs. They hold a [`PoiRef`] (id plus the POI's fixed
//! position) so a target stays usable after the canonical POI has been
//! retired by the environment but before the agent has heard about it.

use crate::vector::{heading, Vec2};
use flockcast_env::{AgentId, PoiId};
use serde::{Deserialize, Serialize};

/// What an agent is doing this tick.
///
/// Re-derived every tick by target selection: `Swarming` when nothing is
/// selected, `Approaching` when a target is selected, `Arrived` when the
/// selected target is within the completion radius (motion frozen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Swarming,
    Approaching,
    Arrived,
}

/// Non-owning handle to a point of interest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoiRef {
    pub id: PoiId,
    pub position: Vec2,
}

/// A known target and its rank (0 = directly observed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetEntry {
    pub poi: PoiRef,
    pub rank: u32,
}

/// Insertion-ordered mapping from POI identity to rank.
///
/// Replaces the parallel target/rank lists: one entry per POI, so the lists
/// can never fall out of alignment. Order is significant (selection breaks
/// ties by it) and survives removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetBook {
    entries: Vec<TargetEntry>,
}

impl TargetBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: PoiId) -> bool {
        self.entries.iter().any(|e| e.poi.id == id)
    }

    /// Rank of `id`, if known.
    pub fn rank_of(&self, id: PoiId) -> Option<u32> {
        self.entries.iter().find(|e| e.poi.id == id).map(|e| e.rank)
    }

    /// Appends `poi` with `rank` unless it is already known.
    ///
    /// Returns true if the entry was added.
    pub fn insert(&mut self, poi: PoiRef, rank: u32) -> bool {
        if self.contains(poi.id) {
            return false;
        }
        self.entries.push(TargetEntry { poi, rank });
        true
    }

    /// Records a direct observation: appended with rank 0, or promoted to
    /// rank 0 in place if already known.
    pub fn observe(&mut self, poi: PoiRef) {
        match self.entries.iter_mut().find(|e| e.poi.id == poi.id) {
            Some(entry) => entry.rank = 0,
            None => self.entries.push(TargetEntry { poi, rank: 0 }),
        }
    }

    /// Lowers the rank of `id` to `rank` if that beats the one on record.
    pub fn lower_rank(&mut self, id: PoiId, rank: u32) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.poi.id == id) {
            entry.rank = entry.rank.min(rank);
        }
    }

    /// Removes `id`, keeping the order of the remaining entries.
    pub fn remove(&mut self, id: PoiId) -> Option<TargetEntry> {
        let index = self.entries.iter().position(|e| e.poi.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetEntry> {
        self.entries.iter()
    }

    /// Target view, in list order.
    pub fn targets(&self) -> impl Iterator<Item = &PoiRef> {
        self.entries.iter().map(|e| &e.poi)
    }

    /// Target ids, in list order.
    pub fn target_ids(&self) -> Vec<PoiId> {
        self.entries.iter().map(|e| e.poi.id).collect()
    }

    /// Rank view, index-aligned with [`TargetBook::target_ids`].
    pub fn ranks(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.rank).collect()
    }
}

/// A swarm agent (boid).
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Stable identity and arena index
    pub id: AgentId,

    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,

    /// Display heading in radians; frozen while the agent is stationary
    pub facing: f64,

    pub mode: Mode,

    /// Known targets with their ranks
    pub targets: TargetBook,

    /// Targets evicted last tick, relayed to neighbours once then cleared
    pub removed_targets: Vec<PoiRef>,
}

impl Agent {
    /// Creates a swarming agent with no knowledge of any POI.
    pub fn new(id: AgentId, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id,
            position,
            velocity,
            acceleration: Vec2::zeros(),
            facing: heading(&velocity),
            mode: Mode::Swarming,
            targets: TargetBook::new(),
            removed_targets: Vec::new(),
        }
    }

    /// Euclidean distance to a point.
    pub fn distance_to(&self, point: &Vec2) -> f64 {
        (self.position - point).norm()
    }

    /// Zeroes velocity and acceleration.
    pub fn freeze(&mut self) {
        self.velocity = Vec2::zeros();
        self.acceleration = Vec2::zeros();
    }
}

/// A point of interest in the canonical list.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: PoiId,

    /// Fixed for the POI's lifetime
    pub position: Vec2,

    /// Agents inside the completion radius as of the last retirement pass
    pub witness_count: usize,
}

impl Poi {
    pub fn new(id: PoiId, position: Vec2) -> Self {
        Self {
            id,
            position,
            witness_count: 0,
        }
    }

    /// The handle agents store in their target books.
    pub fn handle(&self) -> PoiRef {
        PoiRef {
            id: self.id,
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(id: u32) -> PoiRef {
        PoiRef {
            id: PoiId(id),
            position: Vec2::new(id as f64, 0.0),
        }
    }

    #[test]
    fn test_target_book_insert_is_idempotent() {
        let mut book = TargetBook::new();
        assert!(book.insert(poi(0), 3));
        assert!(!book.insert(poi(0), 1));
        assert_eq!(book.len(), 1);
        assert_eq!(book.rank_of(PoiId(0)), Some(3));
    }

    #[test]
    fn test_target_book_remove_keeps_alignment() {
        let mut book = TargetBook::new();
        book.insert(poi(0), 0);
        book.insert(poi(1), 4);
        book.insert(poi(2), 7);

        let removed = book.remove(PoiId(1)).unwrap();
        assert_eq!(removed.rank, 4);
        assert_eq!(book.target_ids(), vec![PoiId(0), PoiId(2)]);
        assert_eq!(book.ranks(), vec![0, 7]);
        assert!(book.remove(PoiId(1)).is_none());
    }

    #[test]
    fn test_observe_promotes_to_rank_zero() {
        let mut book = TargetBook::new();
        book.insert(poi(0), 5);
        book.insert(poi(1), 2);
        book.observe(poi(0));
        book.observe(poi(9));

        assert_eq!(book.target_ids(), vec![PoiId(0), PoiId(1), PoiId(9)]);
        assert_eq!(book.ranks(), vec![0, 2, 0]);
    }

    #[test]
    fn test_lower_rank_never_raises() {
        let mut book = TargetBook::new();
        book.insert(poi(0), 5);
        book.insert(poi(1), 1);
        book.lower_rank(PoiId(0), 2);
        book.lower_rank(PoiId(1), 6);
        book.lower_rank(PoiId(7), 0);

        assert_eq!(book.ranks(), vec![2, 1]);
        assert!(!book.contains(PoiId(7)));
    }

    #[test]
    fn test_agent_new_faces_velocity() {
        let agent = Agent::new(AgentId(0), Vec2::zeros(), Vec2::new(0.0, -1.0));
        assert_eq!(agent.mode, Mode::Swarming);
        assert!((agent.facing + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(agent.targets.is_empty());
    }

    #[test]
    fn test_freeze() {
        let mut agent = Agent::new(AgentId(0), Vec2::zeros(), Vec2::new(3.0, 1.0));
        agent.acceleration = Vec2::new(0.1, 0.1);
        agent.freeze();
        assert_eq!(agent.velocity, Vec2::zeros());
        assert_eq!(agent.acceleration, Vec2::zeros());
    }
}
