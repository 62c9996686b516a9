//! Wire messages.
//!
//! Goals:
//! - Provide the command and state types exchanged between client/server.
//! - Keep serialization explicit and versionable.
//!
//! The transport delivering these is modeled in [`crate::transport`].

use anyhow::Context;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Client input for one tick. Created exactly once per client tick and
/// never mutated; read again only during local replay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InputSample {
    pub tick: u32,
    pub movement: Vec3,
}

/// Predicted or authoritative state for one tick. The tick always matches
/// the input that produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StatePayload {
    pub tick: u32,
    pub position: Vec3,
}

/// High-level message envelope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum WireMsg {
    /// Client -> server: input for a given tick.
    Input(InputSample),
    /// Server -> client: authoritative state anchor.
    State(StatePayload),
}

/// Convenience codec helpers.
pub fn encode_to_bytes(msg: &WireMsg) -> anyhow::Result<Bytes> {
    let payload = serde_json::to_vec(msg).context("serialize")?;
    Ok(Bytes::from(payload))
}

pub fn decode_from_bytes(b: &[u8]) -> anyhow::Result<WireMsg> {
    serde_json::from_slice(b).context("deserialize")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiremsg_roundtrip_bytes() {
        let input = WireMsg::Input(InputSample {
            tick: 7,
            movement: Vec3::new(1.0, 0.0, -0.5),
        });
        assert_eq!(decode_from_bytes(&encode_to_bytes(&input).unwrap()).unwrap(), input);

        let state = WireMsg::State(StatePayload {
            tick: 7,
            position: Vec3::new(0.25, 0.0, 0.0),
        });
        assert_eq!(decode_from_bytes(&encode_to_bytes(&state).unwrap()).unwrap(), state);
    }
}
