//! Flockcast Deterministic Simulation Harness
//!
//! Runs the swarm engine inside a controlled world where every source of
//! variation is pinned down:
//! - **Time**: ticks are paced by a `SwarmContext`; the virtual clock makes
//!   a paced run cost no wall-clock time
//! - **Randomness**: placements and POI scripts derive from one 64-bit seed
//! - **Parallelism**: compute results are collected in agent order, so the
//!   worker count never changes the outcome
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      SimWorld                        │
//! │  PoiSource ──► Environment::run_tick ──► PoiOracle   │
//! │  (scripted      (compute ║ barrier ║     (global     │
//! │   drops)         apply)                retirement)   │
//! └──────────────────────────────────────────────────────┘
//!            ▲
//!       TickDriver (SimContext | TokioContext)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use flockcast_sim::{ScenarioRunner, SimContext};
//! use flockcast_sim::scenarios::ScenarioId;
//!
//! let runner = ScenarioRunner::new(42).with_agents(10);
//! let result = runner.run(ScenarioId::Swarm, SimContext::shared(42)).await;
//! assert!(result.passed);
//! ```

mod context;
mod driver;
mod exporter;
mod input;
mod oracle;
mod runner;
pub mod scenarios;
mod world;

pub use context::SimContext;
pub use driver::TickDriver;
pub use exporter::{AgentFrame, PoiFrame, SimExport, SimFrame};
pub use input::{PoiScript, PoiSource};
pub use oracle::{witness_count, PoiOracle};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use world::{random_placements, PlacementPolicy, SimConfig, SimWorld};
