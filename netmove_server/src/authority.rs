//! Authoritative server side.
//!
//! Runs the same fixed-step movement as the client, but only on inputs
//! that actually arrived. Inputs come in bursts; each tick drains
//! everything pending, stores a state per input under the input's own
//! tick, and answers with a single anchor — the newest state just
//! computed.
//!
//! Determinism notes:
//! - Keep simulation in a fixed timestep.
//! - Avoid wall-clock-dependent branching in movement code.
//! - Process inputs strictly in arrival order.

use std::collections::VecDeque;
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
use tracing::debug;

/// What one server tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Tick counter value this step ran as.
    pub tick: u32,
    /// Inputs drained and simulated this step.
    pub processed: u32,
    /// The anchor sent, if any input was processed.
    pub broadcast: Option<StatePayload>,
}

/// Running totals for diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorityStats {
    pub ticks: u64,
    pub inputs_processed: u64,
    pub broadcasts: u64,
}

/// Authoritative side of the simulation.
pub struct ServerAuthority {
    sim: Simulator,
    tick_interval: Duration,

    tick: u32,
    position: Vec3,
    queue: VecDeque<InputSample>,
    states: TickHistory<StatePayload>,

    from_client: DelayReceiver,
    to_client: DelaySender,
    sink: Box<dyn TransformSink>,

    stats: AuthorityStats,
}

impl ServerAuthority {
    pub fn new(
        cfg: &SimConfig,
        from_client: DelayReceiver,
        to_client: DelaySender,
        sink: Box<dyn TransformSink>,
    ) -> anyhow::Result<Self> {
        cfg.validate().context("server config")?;
        Ok(Self {
            sim: Simulator::from_config(cfg),
            tick_interval: cfg.tick_interval(),
            tick: 0,
            position: Vec3::ZERO,
            queue: VecDeque::new(),
            states: TickHistory::new(cfg.history_len),
            from_client,
            to_client,
            sink,
            stats: AuthorityStats::default(),
        })
    }

    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn stats(&self) -> AuthorityStats {
        self.stats
    }

    /// The authoritative state computed for a tick, if still in history.
    pub fn authoritative_state(&self, tick: u32) -> Option<&StatePayload> {
        self.states.get(tick)
    }

    /// Moves delivered inputs into the processing queue, preserving
    /// arrival order.
    fn poll_clients(&mut self) -> anyhow::Result<()> {
        while let Some(msg) = self.from_client.try_recv()? {
            match msg {
                WireMsg::Input(sample) => self.queue.push_back(sample),
                other => {
                    debug!(?other, "Unexpected message from client");
                }
            }
        }
        Ok(())
    }

    /// Executes one fixed simulation step.
    ///
    /// The tick counter advances whether or not any input arrived; an
    /// empty queue just means no simulation and no broadcast this step.
    pub fn step(&mut self) -> anyhow::Result<StepReport> {
        self.poll_clients()?;

        let step_tick = self.tick;
        let mut processed = 0u32;
        let mut newest: Option<StatePayload> = None;

        while let Some(input) = self.queue.pop_front() {
            let state = self.sim.advance(self.position, &input);
            self.position = state.position;
            self.states.insert(input.tick, state);
            self.sink.apply_position(self.position);
            processed += 1;
            if newest.map_or(true, |anchor| state.tick > anchor.tick) {
                newest = Some(state);
            }
        }

        if let Some(anchor) = newest {
            self.to_client
                .send(&WireMsg::State(anchor))
                .context("broadcast state")?;
            self.stats.broadcasts += 1;
            debug!(tick = anchor.tick, processed, "Broadcast state anchor");
        }

        self.tick += 1;
        self.stats.ticks += 1;
        self.stats.inputs_processed += u64::from(processed);

        Ok(StepReport {
            tick: step_tick,
            processed,
            broadcast: newest,
        })
    }

    /// Drives the authority at its fixed rate for `ticks` steps.
    pub async fn run_for_ticks(&mut self, ticks: u32) -> anyhow::Result<()> {
        let mut next = Instant::now();
        for _ in 0..ticks {
            next += self.tick_interval;
            self.step()?;
            sleep_until(next).await;
        }
        Ok(())
    }
}
