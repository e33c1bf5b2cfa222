//! POI input: where new points of interest come from.
//!
//! Interactive front ends drop POIs where the user clicks. The harness uses
//! a [`PoiScript`] instead: a fixed schedule of drops keyed by tick.

use flockcast_core::{SwarmConfig, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Produces new POIs before a tick's compute phase.
pub trait PoiSource: Send {
    /// Positions of the POIs to add before computing tick `tick`.
    fn poll(&mut self, tick: u64) -> Vec<Vec2>;

    /// True once the source will never produce another POI.
    fn is_exhausted(&self) -> bool;
}

/// Scheduled POI drops.
#[derive(Debug, Clone, Default)]
pub struct PoiScript {
    drops: BTreeMap<u64, Vec<Vec2>>,
}

impl PoiScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a drop at `tick` (builder style).
    pub fn at(mut self, tick: u64, position: Vec2) -> Self {
        self.push(tick, position);
        self
    }

    pub fn push(&mut self, tick: u64, position: Vec2) {
        self.drops.entry(tick).or_default().push(position);
    }

    /// `count` drops, one every `interval` ticks starting at tick 0, placed
    /// uniformly in the interior of the world (clear of the edge buffer).
    pub fn random(seed: u64, config: &SwarmConfig, count: usize, interval: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let margin_x = config.perception_radius.min(config.width / 4.0);
        let margin_y = config.perception_radius.min(config.height / 4.0);

        let mut script = Self::new();
        for i in 0..count {
            let x = rng.gen_range(margin_x..config.width - margin_x);
            let y = rng.gen_range(margin_y..config.height - margin_y);
            script.push(i as u64 * interval, Vec2::new(x, y));
        }
        script
    }

    /// Drops not yet polled.
    pub fn remaining(&self) -> usize {
        self.drops.values().map(Vec::len).sum()
    }
}

impl PoiSource for PoiScript {
    fn poll(&mut self, tick: u64) -> Vec<Vec2> {
        // Anything scheduled for an earlier tick that was never polled is
        // released now rather than lost
        let due: Vec<u64> = self.drops.range(..=tick).map(|(t, _)| *t).collect();
        due.into_iter()
            .filter_map(|t| self.drops.remove(&t))
            .flatten()
            .collect()
    }

    fn is_exhausted(&self) -> bool {
        self.drops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_script_releases_drops_on_schedule() {
        let mut script = PoiScript::new()
            .at(0, Vec2::new(1.0, 1.0))
            .at(5, Vec2::new(2.0, 2.0))
            .at(5, Vec2::new(3.0, 3.0));

        assert_eq!(script.poll(0), vec![Vec2::new(1.0, 1.0)]);
        assert!(script.poll(4).is_empty());
        assert_eq!(script.poll(5).len(), 2);
        assert!(script.is_exhausted());
    }

    #[test]
    fn test_script_releases_missed_drops() {
        let mut script = PoiScript::new().at(2, Vec2::new(1.0, 1.0));
        assert_eq!(script.poll(10).len(), 1);
        assert_eq!(script.remaining(), 0);
    }

    #[test]
    fn test_random_script_is_seeded_and_in_bounds() {
        let cfg = SwarmConfig::default();
        let a = PoiScript::random(9, &cfg, 5, 100);
        let b = PoiScript::random(9, &cfg, 5, 100);
        assert_eq!(a.drops, b.drops);
        assert_eq!(a.remaining(), 5);

        // Default world is 1200x700: x margin 200, y margin 175
        for position in a.drops.values().flatten() {
            assert!(position.x >= 200.0 && position.x <= 1000.0);
            assert!(position.y >= 175.0 && position.y <= 525.0);
        }
        assert_eq!(a.drops.keys().copied().collect::<Vec<_>>(), vec![0, 100, 200, 300, 400]);
    }

    proptest! {
        #[test]
        fn prop_every_drop_is_polled_once(
            ticks in prop::collection::vec(0u64..50, 0..20),
            polls in prop::collection::vec(0u64..60, 1..10),
        ) {
            let mut script = PoiScript::new();
            for (i, t) in ticks.iter().enumerate() {
                script.push(*t, Vec2::new(i as f64, 0.0));
            }

            let mut polled = 0;
            let mut sorted = polls.clone();
            sorted.sort_unstable();
            for t in sorted {
                polled += script.poll(t).len();
            }
            polled += script.poll(u64::MAX).len();

            prop_assert_eq!(polled, ticks.len());
            prop_assert!(script.is_exhausted());
        }
    }
}
