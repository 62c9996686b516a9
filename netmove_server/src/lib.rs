//! `netmove_server`
//!
//! Server-side systems:
//! - Fixed timestep simulation loop
//! - Inbound `InputSample` queue (bursty, unpaced)
//! - Authoritative state history
//! - Broadcasts one state anchor per working tick

pub mod authority;

pub use authority::ServerAuthority;
