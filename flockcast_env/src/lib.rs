//! Flockcast Environment Abstraction Layer
//!
//! Shared identity types, the workspace error type, and the clock
//! abstraction that lets the same tick loop run against the wall clock
//! (Tokio) or a virtual clock (deterministic simulation).
//!
//! # Example
//!
//! ```ignore
//! use flockcast_env::{SwarmContext, TokioContext};
//!
//! async fn drive<Ctx: SwarmContext>(ctx: &Ctx, period: Duration) {
//!     loop {
//!         env.run_tick()?;
//!         ctx.sleep(period).await;
//!     }
//! }
//! ```

mod context;
mod error;
mod tokio_impl;
mod types;

pub use context::SwarmContext;
pub use error::SwarmError;
pub use tokio_impl::TokioContext;
pub use types::{AgentId, PoiId};
