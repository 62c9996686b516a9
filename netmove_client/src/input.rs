//! Input sampling.
//!
//! In a real client this would integrate with windowing, raw mouse/keyboard,
//! and action bindings. The seam here is a trait so tests and the demo
//! runner can inject axis values; the predictor only ever consumes the
//! latest sampled state when a tick is due.

use netmove_shared::{math::Vec3, net::InputSample};

/// Named input axes, each sampled in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Source of axis values, polled once per frame.
pub trait AxisSource: Send {
    fn sample_axis(&mut self, axis: Axis) -> f32;
}

/// User input state at a moment in time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub horizontal: f32,
    pub vertical: f32,
}

impl InputState {
    /// Samples both axes, clamping out-of-range device values.
    pub fn sample(source: &mut dyn AxisSource) -> Self {
        Self {
            horizontal: source.sample_axis(Axis::Horizontal).clamp(-1.0, 1.0),
            vertical: source.sample_axis(Axis::Vertical).clamp(-1.0, 1.0),
        }
    }

    /// Movement on the ground plane; the vertical axis maps to z.
    pub fn movement_vector(self) -> Vec3 {
        Vec3::new(self.horizontal, 0.0, self.vertical)
    }
}

/// Turns sampled input into an `InputSample` for a tick.
pub fn build_sample(tick: u32, input: InputState) -> InputSample {
    InputSample {
        tick,
        movement: input.movement_vector(),
    }
}

/// Axis source holding constant values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantAxes {
    pub horizontal: f32,
    pub vertical: f32,
}

impl AxisSource for ConstantAxes {
    fn sample_axis(&mut self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }
}
