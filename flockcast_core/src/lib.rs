//! Flockcast Core - Decentralised Swarm Decision Engine
//!
//! A swarm of agents explores a bounded 2D world, discovers points of
//! interest (POIs), spreads what it knows to nearby agents, and retires a
//! POI once enough agents have converged on it. Every agent decides from
//! local information only:
//! 1. **Steering**: a weighted blend of alignment, cohesion, separation,
//!    edge avoidance and target seeking, under speed/force limits
//! 2. **Gossip**: targets spread over the proximity graph with hop-count
//!    ranks; completions spread as one-tick eviction notices
//! 3. **Scheduling**: each tick is computed in parallel against a frozen
//!    snapshot, then applied in one serial pass

pub mod agent;
pub mod config;
pub mod environment;
pub mod gossip;
pub mod kinematics;
pub mod neighbors;
pub mod scheduler;
pub mod steering;
pub mod vector;

// Re-export key types for convenience
pub use agent::{Agent, Mode, Poi, PoiRef, TargetBook, TargetEntry};
pub use config::{BehaviorWeights, SwarmConfig};
pub use environment::{Environment, Placement, Snapshot};
pub use scheduler::{AgentUpdate, Scheduler, TickReport};
pub use steering::{SteeringEngine, SteeringOutcome};
pub use vector::Vec2;

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, flockcast_env::SwarmError>;
