//! Deterministic movement simulation.
//!
//! Both sides run the same integration; reconciliation is only sound if
//! identical inputs produce bit-identical positions on client and server.

use crate::{
    config::SimConfig,
    math::Vec3,
    net::{InputSample, StatePayload},
};

/// Advances a position by one fixed step: `position + input * speed * dt`.
///
/// Pure and stateless. No side effects, no hidden state.
pub fn step_movement(position: Vec3, input: Vec3, fixed_dt: f32, speed: f32) -> Vec3 {
    position + input * (speed * fixed_dt)
}

/// Fixed-step simulator shared by predictor and authority.
///
/// Constructed from [`SimConfig`] on both sides so delta time and speed
/// cannot drift apart.
#[derive(Debug, Clone, Copy)]
pub struct Simulator {
    fixed_dt: f32,
    speed: f32,
}

impl Simulator {
    pub fn from_config(cfg: &SimConfig) -> Self {
        Self {
            fixed_dt: cfg.fixed_dt(),
            speed: cfg.move_speed,
        }
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Runs one input against a prior position. The payload carries the
    /// input's own tick, not the caller's counter.
    pub fn advance(&self, position: Vec3, input: &InputSample) -> StatePayload {
        StatePayload {
            tick: input.tick,
            position: step_movement(position, input.movement, self.fixed_dt, self.speed),
        }
    }
}
