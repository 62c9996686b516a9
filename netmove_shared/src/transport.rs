//! Simulated network transport.
//!
//! Models latency as scheduled, non-blocking deferred delivery: `send`
//! encodes the message, stamps a delivery deadline, and returns
//! immediately. A single pump task per link sleeps until each frame's
//! deadline and forwards in send order, so equal delays preserve FIFO.
//! That ordering property leans on the delay being constant; it must be
//! re-checked before introducing jitter.
//!
//! Loss, reordering, duplication, and cancellation are out of scope: every
//! scheduled frame is assumed to eventually arrive.

use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use tokio::{
    sync::mpsc,
    time::{self, Instant},
};
use tracing::trace;

use crate::net::{decode_from_bytes, encode_to_bytes, WireMsg};

struct Frame {
    deliver_at: Instant,
    payload: Bytes,
}

/// Sending half of a delayed link. Cloneable; all clones share the delay.
#[derive(Clone)]
pub struct DelaySender {
    tx: mpsc::UnboundedSender<Frame>,
    delay: Duration,
}

/// Receiving half of a delayed link.
pub struct DelayReceiver {
    rx: mpsc::UnboundedReceiver<Bytes>,
}

/// Creates a one-way link delivering every message `delay` after send.
///
/// Spawns the pump task, so it must be called inside a tokio runtime.
pub fn delay_link(delay: Duration) -> (DelaySender, DelayReceiver) {
    let (tx, mut pump_rx) = mpsc::unbounded_channel::<Frame>();
    let (out_tx, rx) = mpsc::unbounded_channel::<Bytes>();

    tokio::spawn(async move {
        while let Some(frame) = pump_rx.recv().await {
            time::sleep_until(frame.deliver_at).await;
            trace!(bytes = frame.payload.len(), "Delivering frame");
            if out_tx.send(frame.payload).is_err() {
                break;
            }
        }
    });

    (DelaySender { tx, delay }, DelayReceiver { rx })
}

impl DelaySender {
    /// Encodes and schedules a message; returns as soon as it is queued.
    pub fn send(&self, msg: &WireMsg) -> anyhow::Result<()> {
        let payload = encode_to_bytes(msg)?;
        let frame = Frame {
            deliver_at: Instant::now() + self.delay,
            payload,
        };
        self.tx.send(frame).ok().context("link closed")?;
        Ok(())
    }
}

impl DelayReceiver {
    /// Non-blocking drain of one delivered message, if any.
    pub fn try_recv(&mut self) -> anyhow::Result<Option<WireMsg>> {
        match self.rx.try_recv() {
            Ok(payload) => Ok(Some(decode_from_bytes(&payload)?)),
            Err(_) => Ok(None),
        }
    }

    /// Awaits the next delivery. Returns `None` when the link is closed.
    pub async fn recv(&mut self) -> anyhow::Result<Option<WireMsg>> {
        match self.rx.recv().await {
            Some(payload) => Ok(Some(decode_from_bytes(&payload)?)),
            None => Ok(None),
        }
    }
}
