//! Client-side prediction and reconciliation.
//!
//! The predictor simulates local input immediately, records what it did,
//! and corrects its trajectory when the authoritative result for a past
//! tick disagrees with what it predicted back then. Corrections rewind to
//! the authoritative tick and replay the inputs already held in history;
//! nothing is re-sent over the network.

use std::time::Duration;

use anyhow::Context;
use netmove_shared::{
    config::SimConfig,
    history::TickHistory,
    math::Vec3,
    net::{InputSample, StatePayload, WireMsg},
    render::TransformSink,
    sim::Simulator,
    transport::{DelayReceiver, DelaySender},
};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::input::{build_sample, AxisSource, InputState};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    /// Prediction agreed with the server within tolerance.
    InSync { tick: u32, error: f32 },
    /// Snapped to the authoritative position and replayed the recorded
    /// inputs after it.
    Corrected { tick: u32, error: f32, replayed: u32 },
    /// The replay span ran past the input history horizon; replay stopped
    /// at the first missing tick.
    Truncated {
        tick: u32,
        replayed: u32,
        first_missing: u32,
    },
}

/// What one client tick produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub predicted: StatePayload,
    pub reconciliation: Option<ReconcileOutcome>,
}

/// Running totals for diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictorStats {
    pub ticks: u64,
    pub corrections: u64,
    pub truncated_replays: u64,
}

/// Predicting side of the simulation.
pub struct ClientPredictor {
    sim: Simulator,
    epsilon: f32,
    tick_interval: Duration,

    tick: u32,
    position: Vec3,
    inputs: TickHistory<InputSample>,
    states: TickHistory<StatePayload>,

    /// Newest authoritative state received; `None` until the first arrives.
    latest_server_state: Option<StatePayload>,
    /// Last authoritative state reconciliation ran against.
    last_processed: Option<StatePayload>,

    to_server: DelaySender,
    from_server: DelayReceiver,
    sink: Box<dyn TransformSink>,

    stats: PredictorStats,
}

impl ClientPredictor {
    pub fn new(
        cfg: &SimConfig,
        to_server: DelaySender,
        from_server: DelayReceiver,
        sink: Box<dyn TransformSink>,
    ) -> anyhow::Result<Self> {
        cfg.validate().context("client config")?;
        Ok(Self {
            sim: Simulator::from_config(cfg),
            epsilon: cfg.reconcile_epsilon,
            tick_interval: cfg.tick_interval(),
            tick: 0,
            position: Vec3::ZERO,
            inputs: TickHistory::new(cfg.history_len),
            states: TickHistory::new(cfg.history_len),
            latest_server_state: None,
            last_processed: None,
            to_server,
            from_server,
            sink,
            stats: PredictorStats::default(),
        })
    }

    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn stats(&self) -> PredictorStats {
        self.stats
    }

    /// The client's own recorded prediction for a tick, if still in history.
    pub fn predicted_state(&self, tick: u32) -> Option<&StatePayload> {
        self.states.get(tick)
    }

    /// Drains delivered server states, keeping only the newest.
    fn poll_server(&mut self) -> anyhow::Result<()> {
        while let Some(msg) = self.from_server.try_recv()? {
            match msg {
                WireMsg::State(state) => {
                    debug!(tick = state.tick, "Authoritative state received");
                    self.latest_server_state = Some(state);
                }
                other => {
                    debug!(?other, "Unexpected message from server");
                }
            }
        }
        Ok(())
    }

    /// Advances one client tick: reconcile, predict, record, send.
    ///
    /// The client ticks unconditionally at its fixed rate; a zero input
    /// still produces and sends an `InputSample`, keeping the server's
    /// anchor moving and the replay span bounded.
    pub fn tick(&mut self, input: InputState) -> anyhow::Result<TickReport> {
        self.poll_server()?;
        let reconciliation = self.reconcile();

        let sample = build_sample(self.tick, input);
        self.inputs.insert(self.tick, sample);

        let predicted = self.sim.advance(self.position, &sample);
        self.position = predicted.position;
        self.states.insert(self.tick, predicted);
        self.sink.apply_position(self.position);

        self.to_server
            .send(&WireMsg::Input(sample))
            .context("send input")?;

        self.tick += 1;
        self.stats.ticks += 1;
        Ok(TickReport {
            predicted,
            reconciliation,
        })
    }

    /// Compares the newest authoritative state against the recorded
    /// prediction for that tick and rewinds/replays on divergence.
    fn reconcile(&mut self) -> Option<ReconcileOutcome> {
        let server_state = self.latest_server_state?;
        if self.last_processed == Some(server_state) {
            return None;
        }
        self.last_processed = Some(server_state);

        let error = match self.states.get(server_state.tick) {
            Some(predicted) => server_state.position.distance(predicted.position),
            // Our own prediction for that tick has already left the history
            // horizon; the comparison is impossible, so force a correction.
            None => f32::INFINITY,
        };

        if error <= self.epsilon {
            return Some(ReconcileOutcome::InSync {
                tick: server_state.tick,
                error,
            });
        }

        warn!(
            tick = server_state.tick,
            error, "Prediction diverged, rewinding"
        );
        self.stats.corrections += 1;

        self.position = server_state.position;
        self.states.insert(server_state.tick, server_state);

        let mut replayed = 0u32;
        let mut replay_tick = server_state.tick + 1;
        while replay_tick < self.tick {
            let Some(input) = self.inputs.get(replay_tick).copied() else {
                warn!(
                    tick = replay_tick,
                    oldest_resident = ?self.inputs.oldest_covered_tick(),
                    "Input history evicted, replay truncated"
                );
                self.stats.truncated_replays += 1;
                return Some(ReconcileOutcome::Truncated {
                    tick: server_state.tick,
                    replayed,
                    first_missing: replay_tick,
                });
            };
            let replayed_state = self.sim.advance(self.position, &input);
            self.position = replayed_state.position;
            self.states.insert(replay_tick, replayed_state);
            replayed += 1;
            replay_tick += 1;
        }

        Some(ReconcileOutcome::Corrected {
            tick: server_state.tick,
            error,
            replayed,
        })
    }

    /// Drives the predictor at its fixed rate for `ticks` ticks.
    pub async fn run_for_ticks(
        &mut self,
        source: &mut dyn AxisSource,
        ticks: u32,
    ) -> anyhow::Result<()> {
        let mut next = Instant::now();
        for _ in 0..ticks {
            next += self.tick_interval;
            let input = InputState::sample(source);
            self.tick(input)?;
            sleep_until(next).await;
        }
        Ok(())
    }
}
