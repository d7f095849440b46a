use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{Instant, interval, sleep_until};
use tracing::info;

use crate::error::{AppError, AppResult, ValidationError};
use crate::gateway::{CommandSpec, GatewayTransport, PollSettings};
use crate::metrics::{AggregateReport, ErrorTally, LatencyAggregator, TallySnapshot};
use crate::shutdown::ShutdownSender;

use super::mix::TaskMix;
use super::user::VirtualUser;

/// Everything a load run needs, already validated by the CLI/config layer.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub users: usize,
    /// Iterations per second per user.
    pub user_rate: f64,
    pub duration: Duration,
    /// Users released per `spawn_interval` tick.
    pub spawn_rate: usize,
    pub spawn_interval: Duration,
    pub poll: PollSettings,
    pub mix: TaskMix,
    pub commands: Vec<CommandSpec>,
    /// Fixed RNG seed; user `n` uses `seed + n`.
    pub seed: Option<u64>,
}

/// State shared by every virtual user of one run.
pub(crate) struct LoadContext {
    pub transport: Arc<dyn GatewayTransport>,
    pub aggregator: LatencyAggregator,
    pub tally: ErrorTally,
    pub mix: TaskMix,
    pub commands: Vec<CommandSpec>,
    pub poll: PollSettings,
    pub user_rate: f64,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub users_started: usize,
    pub iterations: u64,
    pub idle_status_checks: u64,
    pub report: AggregateReport,
    pub tally: TallySnapshot,
}

fn validate(plan: &LoadPlan) -> AppResult<()> {
    if plan.commands.is_empty() {
        return Err(AppError::validation(ValidationError::EmptyCommandList));
    }
    if !(plan.user_rate.is_finite() && plan.user_rate > 0.0) {
        return Err(AppError::validation(ValidationError::InvalidRate {
            value: plan.user_rate.to_string(),
        }));
    }
    if plan.users == 0 || plan.spawn_rate == 0 {
        return Err(AppError::validation(ValidationError::ValueTooSmall { min: 1 }));
    }
    if plan.duration.is_zero() || plan.spawn_interval.is_zero() {
        return Err(AppError::validation(ValidationError::DurationZero));
    }
    Ok(())
}

/// Runs `plan.users` virtual users until `plan.duration` elapses or a
/// shutdown is broadcast, then freezes the aggregated latencies.
///
/// Users are released `spawn_rate` at a time on every `spawn_interval`
/// tick. Users not yet released when the run ends never start.
///
/// # Errors
///
/// Returns an error when the plan is invalid or a user task panics.
pub async fn run_load(
    plan: LoadPlan,
    transport: Arc<dyn GatewayTransport>,
    shutdown_tx: &ShutdownSender,
) -> AppResult<LoadOutcome> {
    validate(&plan)?;
    let started = Instant::now();
    let deadline = started
        .checked_add(plan.duration)
        .ok_or_else(|| AppError::validation(ValidationError::DurationOverflow))?;

    let ctx = Arc::new(LoadContext {
        transport,
        aggregator: LatencyAggregator::new(),
        tally: ErrorTally::new(),
        mix: plan.mix,
        commands: plan.commands,
        poll: plan.poll,
        user_rate: plan.user_rate,
    });

    let mut shutdown_rx = shutdown_tx.subscribe();
    let permits = Arc::new(Semaphore::new(0));
    let mut user_handles = Vec::with_capacity(plan.users);

    for id in 0..plan.users {
        let ctx = Arc::clone(&ctx);
        let permits = Arc::clone(&permits);
        let mut startup_rx = shutdown_tx.subscribe();
        let user_rx = shutdown_tx.subscribe();
        let user = VirtualUser::new(id, plan.seed);

        let handle = tokio::spawn(async move {
            let startup_permit = tokio::select! {
                _ = startup_rx.recv() => return None,
                () = sleep_until(deadline) => return None,
                permit = permits.acquire_owned() => permit,
            };
            let Ok(_permit) = startup_permit else {
                return None;
            };
            Some(user.run(ctx, deadline, user_rx).await)
        });
        user_handles.push(handle);
    }

    let mut spawn_tick = interval(plan.spawn_interval);
    let mut released: usize = 0;
    while released < plan.users {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            () = sleep_until(deadline) => break,
            _ = spawn_tick.tick() => {
                let to_release = plan.spawn_rate.min(plan.users.saturating_sub(released));
                permits.add_permits(to_release);
                released = released.saturating_add(to_release);
                if released == plan.users {
                    info!("All {} virtual users released", plan.users);
                }
            }
        }
    }

    let mut users_started: usize = 0;
    let mut iterations: u64 = 0;
    let mut idle_status_checks: u64 = 0;
    for handle in user_handles {
        if let Some(stats) = handle.await? {
            users_started = users_started.saturating_add(1);
            iterations = iterations.saturating_add(stats.iterations);
            idle_status_checks = idle_status_checks.saturating_add(stats.idle_status_checks);
        }
    }

    let report = ctx.aggregator.finish();
    info!(
        "Load finished: {} users, {} iterations in {:?}",
        users_started, iterations, report.window
    );
    Ok(LoadOutcome {
        users_started,
        iterations,
        idle_status_checks,
        report,
        tally: ctx.tally.snapshot(),
    })
}
