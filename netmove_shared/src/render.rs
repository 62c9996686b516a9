//! Transform output abstraction.
//!
//! The core computes positions; presenting them is someone else's job.
//! Positions flow one way through this seam — the core never reads them
//! back.

use std::sync::{Arc, Mutex};

use crate::math::Vec3;

/// Sink for per-tick computed positions.
pub trait TransformSink: Send {
    fn apply_position(&mut self, position: Vec3);
}

/// No-op sink for headless runs.
#[derive(Default)]
pub struct NullTransform;

impl TransformSink for NullTransform {
    fn apply_position(&mut self, _position: Vec3) {}
}

/// Records every applied position; clones share the same log, so tests can
/// hand one clone to a predictor and inspect the other.
#[derive(Default, Clone)]
pub struct RecordingTransform {
    applied: Arc<Mutex<Vec<Vec3>>>,
}

impl RecordingTransform {
    pub fn applied(&self) -> Vec<Vec3> {
        self.applied.lock().expect("transform log poisoned").clone()
    }
}

impl TransformSink for RecordingTransform {
    fn apply_position(&mut self, position: Vec3) {
        self.applied
            .lock()
            .expect("transform log poisoned")
            .push(position);
    }
}
