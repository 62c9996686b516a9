//! In-process prediction/reconciliation demo.
//!
//! Usage:
//!   cargo run -p netmove_tests --bin sim_runner -- \
//!       [--ticks 300] [--tick-hz 30] [--delay-ms 20] [--perturb-tick N]
//!
//! Wires a predicting client and an authoritative server through the
//! fixed-delay links and lets both free-run. With `--perturb-tick N` a
//! divergent authoritative state is injected after client tick N to force
//! a visible rewind-and-replay correction. Prints a run summary.

use std::env;
use std::time::Duration;

use anyhow::Context;
use netmove_client::input::{ConstantAxes, InputState};
use netmove_client::ClientPredictor;
use netmove_server::ServerAuthority;
use netmove_shared::config::SimConfig;
use netmove_shared::math::Vec3;
use netmove_shared::net::{StatePayload, WireMsg};
use netmove_shared::render::NullTransform;
use netmove_shared::tick::TickScheduler;
use netmove_shared::transport::delay_link;
use tokio::time::Instant;
use tracing::{debug, info};

struct RunnerArgs {
    ticks: u32,
    perturb_tick: Option<u32>,
    cfg: SimConfig,
}

fn parse_args() -> RunnerArgs {
    let mut args = RunnerArgs {
        ticks: 300,
        perturb_tick: None,
        cfg: SimConfig::default(),
    };
    let argv: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--ticks" if i + 1 < argv.len() => {
                args.ticks = argv[i + 1].parse().unwrap_or(300);
                i += 2;
            }
            "--tick-hz" if i + 1 < argv.len() => {
                args.cfg.tick_hz = argv[i + 1].parse().unwrap_or(30);
                i += 2;
            }
            "--delay-ms" if i + 1 < argv.len() => {
                args.cfg.net_delay_ms = argv[i + 1].parse().unwrap_or(20);
                i += 2;
            }
            "--perturb-tick" if i + 1 < argv.len() => {
                args.perturb_tick = argv[i + 1].parse().ok();
                i += 2;
            }
            _ => i += 1,
        }
    }
    args
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args();
    let cfg = args.cfg.clone();
    info!(
        tick_hz = cfg.tick_hz,
        delay_ms = cfg.net_delay_ms,
        ticks = args.ticks,
        "Starting simulation"
    );

    let (to_server, from_client) = delay_link(cfg.net_delay());
    let (to_client, from_server) = delay_link(cfg.net_delay());
    let injector = to_client.clone();

    let mut predictor =
        ClientPredictor::new(&cfg, to_server, from_server, Box::new(NullTransform))
            .context("create predictor")?;
    let mut authority = ServerAuthority::new(&cfg, from_client, to_client, Box::new(NullTransform))
        .context("create authority")?;

    // Run the server long enough to drain inputs still in flight when the
    // client stops.
    let round_trip_ticks = (2 * cfg.net_delay_ms * u64::from(cfg.tick_hz)).div_ceil(1000) as u32;
    let server_ticks = args.ticks + round_trip_ticks + 4;
    let server_task = tokio::spawn(async move {
        authority.run_for_ticks(server_ticks).await?;
        Ok::<_, anyhow::Error>(authority)
    });

    // Client frame loop: sample per frame, let the scheduler decide how
    // many ticks are due, catching up after any stall.
    let mut axes = ConstantAxes {
        horizontal: 1.0,
        vertical: 0.0,
    };
    let mut sched = TickScheduler::new(cfg.tick_hz);
    let frame: Duration = sched.interval() / 4;
    let mut last = Instant::now();
    let mut ticked = 0u32;

    while ticked < args.ticks {
        tokio::time::sleep(frame).await;
        let now = Instant::now();
        let due = sched.advance(now - last);
        last = now;

        for _ in 0..due {
            if ticked >= args.ticks {
                break;
            }
            let input = InputState::sample(&mut axes);
            let report = predictor.tick(input).context("client tick")?;
            if let Some(outcome) = report.reconciliation {
                debug!(?outcome, "Reconciled");
            }
            ticked += 1;

            if args.perturb_tick == Some(ticked) {
                // Pretend the server disagreed about the tick just produced.
                let bogus = StatePayload {
                    tick: report.predicted.tick,
                    position: report.predicted.position + Vec3::new(0.5, 0.0, 0.0),
                };
                injector
                    .send(&WireMsg::State(bogus))
                    .context("inject perturbation")?;
                info!(tick = bogus.tick, "Injected divergent authoritative state");
            }
        }
    }

    let authority = server_task.await.context("join server")??;

    let client_stats = predictor.stats();
    let server_stats = authority.stats();
    println!();
    println!("Run summary");
    println!("===========");
    println!("Client ticks:       {}", client_stats.ticks);
    println!("Corrections:        {}", client_stats.corrections);
    println!("Truncated replays:  {}", client_stats.truncated_replays);
    println!("Server ticks:       {}", server_stats.ticks);
    println!("Inputs processed:   {}", server_stats.inputs_processed);
    println!("Broadcasts:         {}", server_stats.broadcasts);
    println!("Client position:    {:?}", predictor.position());
    println!("Server position:    {:?}", authority.position());

    Ok(())
}
