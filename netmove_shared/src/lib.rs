//! `netmove_shared`
//!
//! Shared libraries used by both the predicting client and the
//! authoritative server.
//!
//! Design goals:
//! - Deterministic and modular where practical.
//! - Clear separation of concerns (math, net, history, tick, transport).
//! - Traits for abstraction and dependency injection.
//! - No `unsafe`.

pub mod config;
pub mod history;
pub mod math;
pub mod net;
pub mod render;
pub mod sim;
pub mod tick;
pub mod transport;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::history::*;
    pub use crate::math::*;
    pub use crate::net::*;
    pub use crate::sim::*;
    pub use crate::tick::*;
    pub use crate::transport::*;
}
