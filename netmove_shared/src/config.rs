//! Configuration system.
//!
//! Loads simulation configuration from JSON strings (file IO left to app).

use std::time::Duration;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Root configuration shared by client/server.
///
/// Both sides must be built from the same values: the movement step is only
/// bit-identical across the two timelines if `tick_hz` and `move_speed`
/// match exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Fixed simulation tick rate.
    pub tick_hz: u32,
    /// Movement speed in units per second.
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    /// Capacity of the input/state history buffers, in ticks.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    /// One-way artificial network delay in milliseconds.
    #[serde(default = "default_net_delay_ms")]
    pub net_delay_ms: u64,
    /// Position error below which reconciliation accepts the prediction.
    #[serde(default = "default_reconcile_epsilon")]
    pub reconcile_epsilon: f32,
}

fn default_move_speed() -> f32 {
    5.0
}

fn default_history_len() -> usize {
    1024
}

fn default_net_delay_ms() -> u64 {
    20
}

fn default_reconcile_epsilon() -> f32 {
    0.001
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_hz: 30,
            move_speed: default_move_speed(),
            history_len: default_history_len(),
            net_delay_ms: default_net_delay_ms(),
            reconcile_epsilon: default_reconcile_epsilon(),
        }
    }
}

impl SimConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Fixed per-tick delta time in seconds.
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_hz as f32
    }

    /// Fixed tick interval as a duration.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f32(self.fixed_dt())
    }

    /// One-way transport delay as a duration.
    pub fn net_delay(&self) -> Duration {
        Duration::from_millis(self.net_delay_ms)
    }

    /// Checks internal consistency, in particular the history-horizon
    /// contract: the buffers must cover the full network round trip
    /// (the widest possible rewind/replay span) with headroom, or inputs
    /// still needed for replay get evicted.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tick_hz == 0 {
            bail!("tick_hz must be positive");
        }
        if !self.move_speed.is_finite() {
            bail!("move_speed must be finite");
        }
        if self.history_len == 0 {
            bail!("history_len must be positive");
        }
        if !(self.reconcile_epsilon > 0.0) {
            bail!("reconcile_epsilon must be positive");
        }

        let round_trip_ticks = (2 * self.net_delay_ms * u64::from(self.tick_hz)).div_ceil(1000);
        if self.history_len as u64 <= round_trip_ticks * 2 {
            bail!(
                "history_len {} does not cover the {}-tick round trip with headroom",
                self.history_len,
                round_trip_ticks
            );
        }
        Ok(())
    }
}
