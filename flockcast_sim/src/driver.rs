//! Fixed-rate tick pacing over a [`SwarmContext`] clock.

use crate::world::SimWorld;

use flockcast_core::TickReport;
use flockcast_env::{SwarmContext, SwarmError};
use std::sync::Arc;
use std::time::Duration;

/// Calls [`SimWorld::step`] once per period.
///
/// With a `SimContext` the waits are virtual and a run finishes as fast as
/// the engine can compute; with a `TokioContext` ticks are spaced in real
/// time. Physics is unaffected either way: it only ever sees `dt`.
pub struct TickDriver<C: SwarmContext> {
    ctx: Arc<C>,
    period: Duration,
}

impl<C: SwarmContext> TickDriver<C> {
    pub fn new(ctx: Arc<C>, period: Duration) -> Self {
        Self { ctx, period }
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs one tick, then waits out the rest of the period.
    pub async fn tick(&self, world: &mut SimWorld) -> Result<TickReport, SwarmError> {
        let started = self.ctx.now();
        let report = world.step()?;
        let elapsed = self.ctx.now().saturating_sub(started);
        if elapsed < self.period {
            self.ctx.sleep(self.period - elapsed).await;
        }
        Ok(report)
    }

    /// Runs up to `ticks` ticks. `observe` sees the world after each one and
    /// returns false to stop early. Returns the number of ticks run.
    pub async fn run<F>(
        &self,
        world: &mut SimWorld,
        ticks: u64,
        mut observe: F,
    ) -> Result<u64, SwarmError>
    where
        F: FnMut(&SimWorld, &TickReport) -> bool,
    {
        let mut completed = 0;
        while completed < ticks {
            let report = self.tick(world).await?;
            completed += 1;
            if !observe(world, &report) {
                break;
            }
        }
        Ok(completed)
    }
}
