//! `netmove_client`
//!
//! Client-side systems:
//! - Input sampling seam and per-tick `InputSample` generation
//! - Immediate prediction through the shared simulator
//! - Server reconciliation (rewind and replay from recorded history)

pub mod input;
pub mod predictor;

pub use predictor::ClientPredictor;
