use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::error::{AppError, AppResult, ValidationError};
use crate::gateway::testing::{FakeGateway, TaskScript};
use crate::gateway::{
    COMPLETION_ENDPOINT, CommandSpec, GatewayTransport, HEALTH_ENDPOINT, POLL_ENDPOINT,
    PollSettings, STATUS_ENDPOINT,
};
use crate::system::shutdown_handlers::shutdown_channel;

fn plan(weights: &[(TaskKind, u32)], users: usize, duration_secs: u64) -> AppResult<LoadPlan> {
    Ok(LoadPlan {
        users,
        user_rate: 5.0,
        duration: Duration::from_secs(duration_secs),
        spawn_rate: users,
        spawn_interval: Duration::from_secs(1),
        poll: PollSettings {
            interval: Duration::from_millis(100),
            max_wait: Duration::from_secs(2),
        },
        mix: TaskMix::new(weights)?,
        commands: vec![CommandSpec::new("echo", ["hi"], Duration::from_secs(5))],
        seed: Some(7),
    })
}

#[test]
fn weighted_selection_matches_configured_shares() -> AppResult<()> {
    let mix = TaskMix::new(&DEFAULT_WEIGHTS)?;
    let mut rng = StdRng::seed_from_u64(42);
    let mut counts: HashMap<TaskKind, u32> = HashMap::new();
    for _ in 0..10_000 {
        let entry = counts.entry(mix.pick(&mut rng)).or_insert(0);
        *entry = entry.saturating_add(1);
    }
    for (kind, weight) in DEFAULT_WEIGHTS {
        let share = f64::from(counts.get(&kind).copied().unwrap_or(0)) / 10_000.0;
        let expected = f64::from(weight) / 100.0;
        if (share - expected).abs() > 0.02 {
            return Err(AppError::validation(format!(
                "{} share {} too far from {}",
                kind, share, expected
            )));
        }
    }
    Ok(())
}

#[test]
fn weights_parse_and_validate() -> AppResult<()> {
    let weights = parse_weights("health=1, execute=0,status=0")?;
    if weights
        != vec![
            (TaskKind::HealthCheck, 1),
            (TaskKind::Execute, 0),
            (TaskKind::StatusCheck, 0),
        ]
    {
        return Err(AppError::validation(format!("Unexpected weights: {:?}", weights)));
    }
    match TaskMix::new(&parse_weights("health=0,execute=0")?) {
        Err(ValidationError::WeightsAllZero) => {}
        other => return Err(AppError::validation(format!("Unexpected: {:?}", other.err()))),
    }
    match parse_weights("health:10") {
        Err(ValidationError::InvalidWeightsFormat { .. }) => {}
        other => return Err(AppError::validation(format!("Unexpected: {:?}", other))),
    }
    match parse_weights("sleep=3") {
        Err(ValidationError::UnknownTaskKind { .. }) => Ok(()),
        other => Err(AppError::validation(format!("Unexpected: {:?}", other))),
    }
}

#[test]
fn throttle_is_cumulative_from_start() -> AppResult<()> {
    let start = tokio::time::Instant::now();
    let mut throttle = ConstantThroughput::new(start, 4.0);
    let first = throttle
        .next_start()
        .ok_or_else(|| AppError::validation("Missing first start"))?;
    let mut last = first;
    for _ in 0..3 {
        last = throttle
            .next_start()
            .ok_or_else(|| AppError::validation("Missing start"))?;
    }
    if first.duration_since(start) != Duration::from_millis(250)
        || last.duration_since(start) != Duration::from_secs(1)
    {
        return Err(AppError::validation("Throttle offsets are not n / rate"));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn user_rate_is_held_over_the_run() -> AppResult<()> {
    let gateway: Arc<dyn GatewayTransport> = Arc::new(FakeGateway::default());
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let outcome = run_load(
        plan(&[(TaskKind::HealthCheck, 1)], 2, 10)?,
        gateway,
        &shutdown_tx,
    )
    .await?;
    // 5 it/s for 10 s per user.
    if outcome.users_started != 2 || !(98..=100).contains(&outcome.iterations) {
        return Err(AppError::validation(format!(
            "Unexpected outcome: {} users, {} iterations",
            outcome.users_started, outcome.iterations
        )));
    }
    let health = outcome
        .report
        .percentiles(HEALTH_ENDPOINT)
        .ok_or_else(|| AppError::validation("Missing health bucket"))?;
    if health.count != outcome.iterations || (health.rps - 10.0).abs() > 0.5 {
        return Err(AppError::validation(format!("Unexpected health stats: {:?}", health)));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn status_check_without_tasks_is_a_noop() -> AppResult<()> {
    let fake = Arc::new(FakeGateway::default());
    let gateway: Arc<dyn GatewayTransport> = fake.clone();
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let outcome = run_load(
        plan(&[(TaskKind::StatusCheck, 1)], 1, 2)?,
        gateway,
        &shutdown_tx,
    )
    .await?;
    if outcome.idle_status_checks != outcome.iterations
        || outcome.report.percentiles(STATUS_ENDPOINT).is_some()
        || fake.status_calls.load(std::sync::atomic::Ordering::Relaxed) != 0
    {
        return Err(AppError::validation("Status checks should not hit the gateway"));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn execute_records_submission_polls_and_completion() -> AppResult<()> {
    let gateway: Arc<dyn GatewayTransport> = Arc::new(FakeGateway::default());
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let outcome = run_load(
        plan(&[(TaskKind::Execute, 1)], 1, 2)?,
        gateway,
        &shutdown_tx,
    )
    .await?;
    for endpoint in ["Execute echo", POLL_ENDPOINT, COMPLETION_ENDPOINT] {
        if outcome.report.percentiles(endpoint).is_none() {
            return Err(AppError::validation(format!("Missing bucket {}", endpoint)));
        }
    }
    if outcome.tally.total() != 0 {
        return Err(AppError::validation(format!("Unexpected failures: {:?}", outcome.tally)));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn poll_timeouts_and_failed_tasks_are_counted_apart() -> AppResult<()> {
    let stuck: Arc<dyn GatewayTransport> = Arc::new(FakeGateway::with_script(TaskScript {
        running_polls: u32::MAX,
        ..TaskScript::default()
    }));
    let failing: Arc<dyn GatewayTransport> = Arc::new(FakeGateway::with_script(TaskScript {
        running_polls: 0,
        terminal: "TASK_FAILED".to_owned(),
        nested: true,
    }));
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();

    let timed_out = run_load(plan(&[(TaskKind::Execute, 1)], 1, 3)?, stuck, &shutdown_tx).await?;
    let failed = run_load(plan(&[(TaskKind::Execute, 1)], 1, 3)?, failing, &shutdown_tx).await?;

    if timed_out.tally.poll_timeout == 0 || timed_out.tally.task_failed != 0 {
        return Err(AppError::validation(format!("Unexpected tally: {:?}", timed_out.tally)));
    }
    if failed.tally.task_failed == 0 || failed.tally.poll_timeout != 0 {
        return Err(AppError::validation(format!("Unexpected tally: {:?}", failed.tally)));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_users_early() -> AppResult<()> {
    let gateway: Arc<dyn GatewayTransport> = Arc::new(FakeGateway::default());
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let trigger = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(trigger.send(()));
    });
    let outcome = run_load(
        plan(&[(TaskKind::HealthCheck, 1)], 1, 60)?,
        gateway,
        &shutdown_tx,
    )
    .await?;
    if outcome.iterations > 6 {
        return Err(AppError::validation(format!(
            "Expected early stop, got {} iterations",
            outcome.iterations
        )));
    }
    Ok(())
}
