//! Fixed-timestep scheduling.
//!
//! Converts variable elapsed real time into a whole number of logic ticks.
//! Simulation code never sees a variable delta, only the fixed interval.

use std::time::Duration;

/// Accumulator-style fixed-rate tick driver.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval: Duration,
    accumulated: Duration,
}

impl TickScheduler {
    pub fn new(tick_hz: u32) -> Self {
        assert!(tick_hz > 0, "tick rate must be positive");
        Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(tick_hz)),
            accumulated: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn fixed_dt(&self) -> f32 {
        self.interval.as_secs_f32()
    }

    /// Feeds elapsed real time and returns how many ticks are now due.
    ///
    /// After a stall every missed tick is emitted on the next call; none
    /// are skipped. Leftover time below one interval stays accumulated.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        let mut due = 0;
        while self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            due += 1;
        }
        due
    }
}
