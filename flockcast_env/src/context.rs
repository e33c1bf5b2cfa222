//! Clock context trait used by the tick driver.

use async_trait::async_trait;
use std::time::Duration;

/// The interface between the tick loop and "time".
///
/// Physics never reads this clock: every formula uses the configured fixed
/// `dt`. The context only decides how long the driver waits between ticks.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wall clock, `tokio::time::sleep`
/// - **Simulation**: `SimContext` - virtual clock, sleep advances instantly
#[async_trait]
pub trait SwarmContext: Send + Sync + 'static {
    /// Returns the time elapsed since the context was created.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends the caller for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock and returns immediately
    async fn sleep(&self, duration: Duration);

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
