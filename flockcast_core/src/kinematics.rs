//! Kinematic limits and integration.
//!
//! All formulas assume a fixed step `dt`. With constant acceleration `a`
//! over one step, the next velocity is `v + a·dt` and the displacement is
//! `v·dt + ½·a·dt²`. The two projections below are disks in acceleration
//! space built from those two expressions:
//!
//! ```text
//!   |v + a·dt| <= max_speed          <=>  |a - (-v/dt)|   <= max_speed/dt
//!   |v·dt + ½a·dt²| >= min_step      <=>  |a - (-2v/dt)|  >= 2·min_step/dt²
//! ```

use crate::config::SwarmConfig;
use crate::vector::{onto_circle, unit_from_heading, Vec2};

/// Bounds `acc` by the force budget, then by the reachable-velocity disk.
///
/// The result never implies a next-tick speed above `max_speed`. When the
/// two constraints conflict the speed limit wins.
pub fn cap(acc: &Vec2, velocity: &Vec2, config: &SwarmConfig) -> Vec2 {
    let mut capped = *acc;
    let magnitude = capped.norm();
    if magnitude > config.max_force {
        capped *= config.max_force / magnitude;
    }

    let centre = -velocity / config.dt;
    let speed_radius = config.max_speed / config.dt;
    if (capped - centre).norm() > speed_radius {
        // Off-centre here, so the ray direction is always defined
        capped = onto_circle(&centre, speed_radius, &capped, &Vec2::x());
    }
    capped
}

/// Pushes `acc` out of the disk of accelerations that would move the agent
/// less than `min_step` this tick.
///
/// `facing` orients the push when the agent is stationary and the blend
/// cancelled out exactly.
pub fn bound_to_min_step(
    acc: &Vec2,
    velocity: &Vec2,
    facing: f64,
    config: &SwarmConfig,
) -> Vec2 {
    let dt = config.dt;
    let centre = -2.0 * velocity / dt;
    let min_radius = 2.0 * config.min_step / (dt * dt);
    if (acc - centre).norm() >= min_radius {
        return *acc;
    }
    onto_circle(&centre, min_radius, acc, &unit_from_heading(facing))
}

/// Acceleration that closes the gap `delta` in exactly one tick given the
/// current velocity: `2·(Δp − v·dt)/dt²`.
pub fn position_correction(delta: &Vec2, velocity: &Vec2, dt: f64) -> Vec2 {
    2.0 * (delta - velocity * dt) / (dt * dt)
}

/// Constant-acceleration step. Returns `(position, velocity)`.
pub fn integrate(position: &Vec2, velocity: &Vec2, acc: &Vec2, dt: f64) -> (Vec2, Vec2) {
    let next_position = position + velocity * dt + 0.5 * acc * dt * dt;
    let next_velocity = velocity + acc * dt;
    (next_position, next_velocity)
}
