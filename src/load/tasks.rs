use rand::Rng;
use rand::seq::SliceRandom;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::gateway::{
    COMPLETION_ENDPOINT, HEALTH_ENDPOINT, STATUS_ENDPOINT, TaskPoller, TaskStatus, TaskSubmitter,
    check_health, execute_endpoint_name, fetch_status,
};
use crate::metrics::{FailureKind, LatencySample};

use super::scheduler::LoadContext;

pub(super) async fn run_health(ctx: &LoadContext) {
    let started = Instant::now();
    let result = check_health(ctx.transport.as_ref()).await;
    let elapsed = started.elapsed();
    ctx.aggregator
        .record(LatencySample::new(HEALTH_ENDPOINT, elapsed, result.is_ok()));
    if let Err(err) = result {
        ctx.tally.record_error(&err);
        warn!(endpoint = HEALTH_ENDPOINT, ?elapsed, "{}", err);
    }
}

/// Submit, remember the id, poll to terminal.
pub(super) async fn run_execute<R: Rng + ?Sized>(
    ctx: &LoadContext,
    rng: &mut R,
    seen: &mut Vec<String>,
) {
    let Some(spec) = ctx.commands.choose(rng) else {
        return;
    };
    let endpoint = execute_endpoint_name(&spec.command);
    let transport = ctx.transport.as_ref();

    let started = Instant::now();
    let submitted = TaskSubmitter::new(transport).submit(spec).await;
    let elapsed = started.elapsed();
    ctx.aggregator
        .record(LatencySample::new(endpoint.as_str(), elapsed, submitted.is_ok()));
    let handle = match submitted {
        Ok(handle) => handle,
        Err(err) => {
            ctx.tally.record_error(&err);
            warn!(endpoint = %endpoint, ?elapsed, "{}", err);
            return;
        }
    };
    seen.push(handle.task_id.clone());

    let poller = TaskPoller::new(transport, ctx.poll).with_recorder(&ctx.aggregator);
    match poller.poll_until_terminal(&handle).await {
        Ok(info) => {
            let total = handle.submitted_at.elapsed();
            let completed = info.status == TaskStatus::Completed;
            ctx.aggregator
                .record(LatencySample::new(COMPLETION_ENDPOINT, total, completed));
            if completed {
                debug!(task_id = %info.task_id, ?total, "Task completed");
            } else {
                ctx.tally.record(FailureKind::TaskFailed);
                warn!(
                    endpoint = %endpoint,
                    task_id = %info.task_id,
                    elapsed = ?total,
                    "Task finished as {}",
                    info.status
                );
            }
        }
        Err(err) => {
            ctx.tally.record_error(&err);
            warn!(
                endpoint = %endpoint,
                task_id = %handle.task_id,
                elapsed = ?handle.submitted_at.elapsed(),
                "{}",
                err
            );
        }
    }
}

/// Queries one previously seen task. Returns `false` when the user has not
/// submitted anything yet.
pub(super) async fn run_status_check<R: Rng + ?Sized>(
    ctx: &LoadContext,
    rng: &mut R,
    seen: &[String],
) -> bool {
    let Some(task_id) = seen.choose(rng) else {
        return false;
    };
    let started = Instant::now();
    let result = fetch_status(ctx.transport.as_ref(), task_id).await;
    let elapsed = started.elapsed();
    ctx.aggregator
        .record(LatencySample::new(STATUS_ENDPOINT, elapsed, result.is_ok()));
    if let Err(err) = result {
        ctx.tally.record_error(&err);
        warn!(endpoint = STATUS_ENDPOINT, task_id = %task_id, ?elapsed, "{}", err);
    }
    true
}
