//! Client prediction and reconciliation against the authoritative server,
//! wired through the fixed-delay links.

use std::time::Duration;

use netmove_client::input::{ConstantAxes, InputState};
use netmove_client::predictor::ReconcileOutcome;
use netmove_client::ClientPredictor;
use netmove_server::ServerAuthority;
use netmove_shared::config::SimConfig;
use netmove_shared::math::Vec3;
use netmove_shared::net::{StatePayload, WireMsg};
use netmove_shared::render::{NullTransform, RecordingTransform};
use netmove_shared::sim::step_movement;
use netmove_shared::transport::delay_link;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

fn zero_delay_cfg() -> SimConfig {
    SimConfig {
        net_delay_ms: 0,
        ..Default::default()
    }
}

/// Lets the link pump tasks run and flush anything already due.
async fn flush_links() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// With no transport delay, the client's prediction for every tick is
/// bit-identical to the server's authoritative result.
#[tokio::test(start_paused = true)]
async fn client_and_server_agree_with_zero_delay() -> anyhow::Result<()> {
    init_tracing();
    let cfg = zero_delay_cfg();

    let (to_server, from_client) = delay_link(cfg.net_delay());
    let (to_client, from_server) = delay_link(cfg.net_delay());
    let mut predictor =
        ClientPredictor::new(&cfg, to_server, from_server, Box::new(NullTransform))?;
    let mut authority =
        ServerAuthority::new(&cfg, from_client, to_client, Box::new(NullTransform))?;

    let mut rng = StdRng::seed_from_u64(7);
    for tick in 0..60u32 {
        let input = InputState {
            horizontal: rng.gen_range(-1.0..=1.0),
            vertical: rng.gen_range(-1.0..=1.0),
        };
        predictor.tick(input)?;
        flush_links().await;
        authority.step()?;

        assert_eq!(
            authority.authoritative_state(tick),
            predictor.predicted_state(tick),
            "divergence at tick {tick}"
        );
    }

    flush_links().await;
    predictor.tick(InputState::default())?;
    assert_eq!(predictor.stats().corrections, 0);
    Ok(())
}

/// (1,0,0) held for 10 ticks at 1/30 s and speed 5 lands at x ~ 1.6667 on
/// both sides.
#[tokio::test(start_paused = true)]
async fn concrete_scenario_matches_closed_form() -> anyhow::Result<()> {
    init_tracing();
    let cfg = zero_delay_cfg();

    let (to_server, from_client) = delay_link(cfg.net_delay());
    let (to_client, from_server) = delay_link(cfg.net_delay());
    let recorder = RecordingTransform::default();
    let mut predictor =
        ClientPredictor::new(&cfg, to_server, from_server, Box::new(recorder.clone()))?;
    let mut authority =
        ServerAuthority::new(&cfg, from_client, to_client, Box::new(NullTransform))?;

    let mut axes = ConstantAxes {
        horizontal: 1.0,
        vertical: 0.0,
    };
    for _ in 0..10 {
        let input = InputState::sample(&mut axes);
        predictor.tick(input)?;
        flush_links().await;
        authority.step()?;
    }

    assert!((predictor.position().x - 10.0 * 5.0 / 30.0).abs() < 1e-4);
    assert_eq!(
        authority.authoritative_state(9),
        predictor.predicted_state(9)
    );

    // The transform sink saw exactly one position per tick.
    let applied = recorder.applied();
    assert_eq!(applied.len(), 10);
    assert_eq!(applied.last().copied(), Some(predictor.position()));
    Ok(())
}

/// Reconciling against the same authoritative state twice corrects at most
/// once.
#[tokio::test(start_paused = true)]
async fn reconciliation_is_idempotent() -> anyhow::Result<()> {
    init_tracing();
    let cfg = zero_delay_cfg();

    let (to_server, _from_client) = delay_link(cfg.net_delay());
    let (to_client, from_server) = delay_link(cfg.net_delay());
    let mut predictor =
        ClientPredictor::new(&cfg, to_server, from_server, Box::new(NullTransform))?;

    let input = InputState {
        horizontal: 1.0,
        vertical: 0.0,
    };
    for _ in 0..5 {
        predictor.tick(input)?;
    }

    let divergent = StatePayload {
        tick: 2,
        position: predictor.predicted_state(2).unwrap().position + Vec3::new(1.0, 0.0, 0.0),
    };

    to_client.send(&WireMsg::State(divergent))?;
    flush_links().await;
    let first = predictor.tick(input)?;
    assert!(matches!(
        first.reconciliation,
        Some(ReconcileOutcome::Corrected {
            tick: 2,
            replayed: 2,
            error,
        }) if (error - 1.0).abs() < 1e-3
    ));

    to_client.send(&WireMsg::State(divergent))?;
    flush_links().await;
    let second = predictor.tick(input)?;
    assert_eq!(second.reconciliation, None);
    assert_eq!(predictor.stats().corrections, 1);
    Ok(())
}

/// After a forced correction, the replayed trajectory equals straight-line
/// re-simulation from the authoritative position through the recorded
/// inputs.
#[tokio::test(start_paused = true)]
async fn replay_matches_straight_line_resimulation() -> anyhow::Result<()> {
    init_tracing();
    let cfg = zero_delay_cfg();
    let dt = cfg.fixed_dt();
    let speed = cfg.move_speed;

    let (to_server, _from_client) = delay_link(cfg.net_delay());
    let (to_client, from_server) = delay_link(cfg.net_delay());
    let mut predictor =
        ClientPredictor::new(&cfg, to_server, from_server, Box::new(NullTransform))?;

    let script: Vec<InputState> = (0..9)
        .map(|i| InputState {
            horizontal: (i as f32 * 0.2) - 0.8,
            vertical: 1.0 - (i as f32 * 0.25),
        })
        .collect();

    // Ticks 0..=7 predicted normally.
    for input in &script[..8] {
        predictor.tick(*input)?;
    }

    let authoritative = StatePayload {
        tick: 2,
        position: predictor.predicted_state(2).unwrap().position + Vec3::new(0.5, 0.0, 0.25),
    };
    to_client.send(&WireMsg::State(authoritative))?;
    flush_links().await;

    // Tick 8 reconciles first: replay 3..=7, then predict tick 8.
    let report = predictor.tick(script[8])?;
    assert!(matches!(
        report.reconciliation,
        Some(ReconcileOutcome::Corrected {
            tick: 2,
            replayed: 5,
            ..
        })
    ));

    let mut expected = authoritative.position;
    for input in &script[3..9] {
        expected = step_movement(expected, input.movement_vector(), dt, speed);
    }
    assert!(predictor.position().distance(expected) < 1e-6);
    Ok(())
}

/// When the replay span reaches inputs already evicted from history, the
/// replay stops at the first missing tick and reports it.
#[tokio::test(start_paused = true)]
async fn truncated_replay_when_inputs_evicted() -> anyhow::Result<()> {
    init_tracing();
    let cfg = SimConfig {
        net_delay_ms: 0,
        history_len: 4,
        ..Default::default()
    };

    let (to_server, _from_client) = delay_link(cfg.net_delay());
    let (to_client, from_server) = delay_link(cfg.net_delay());
    let mut predictor =
        ClientPredictor::new(&cfg, to_server, from_server, Box::new(NullTransform))?;

    let input = InputState {
        horizontal: 1.0,
        vertical: 0.0,
    };
    for _ in 0..10 {
        predictor.tick(input)?;
    }

    // Tick 1 has wrapped out of both buffers by now.
    let stale = StatePayload {
        tick: 1,
        position: Vec3::new(-5.0, 0.0, 0.0),
    };
    to_client.send(&WireMsg::State(stale))?;
    flush_links().await;

    let report = predictor.tick(input)?;
    assert_eq!(
        report.reconciliation,
        Some(ReconcileOutcome::Truncated {
            tick: 1,
            replayed: 0,
            first_missing: 2,
        })
    );
    assert_eq!(predictor.stats().truncated_replays, 1);
    assert_eq!(predictor.stats().corrections, 1);
    Ok(())
}

/// Full loop with a real transport delay: both sides free-run on their own
/// cadence and never need a correction, since the authoritative results
/// match the predictions exactly.
#[tokio::test(start_paused = true)]
async fn end_to_end_with_delay_stays_in_sync() -> anyhow::Result<()> {
    init_tracing();
    let cfg = SimConfig::default();

    let (to_server, from_client) = delay_link(cfg.net_delay());
    let (to_client, from_server) = delay_link(cfg.net_delay());
    let mut predictor =
        ClientPredictor::new(&cfg, to_server, from_server, Box::new(NullTransform))?;
    let mut authority =
        ServerAuthority::new(&cfg, from_client, to_client, Box::new(NullTransform))?;

    let server_task = tokio::spawn(async move {
        authority.run_for_ticks(50).await?;
        Ok::<_, anyhow::Error>(authority)
    });

    let mut axes = ConstantAxes {
        horizontal: 0.6,
        vertical: -1.0,
    };
    predictor.run_for_ticks(&mut axes, 40).await?;

    let authority = server_task.await??;

    assert_eq!(predictor.stats().corrections, 0);
    assert_eq!(authority.stats().inputs_processed, 40);
    for tick in 0..40u32 {
        assert_eq!(
            authority.authoritative_state(tick),
            predictor.predicted_state(tick),
            "divergence at tick {tick}"
        );
    }
    Ok(())
}
