use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::shutdown::ShutdownReceiver;

use super::mix::TaskKind;
use super::scheduler::LoadContext;
use super::tasks::{run_execute, run_health, run_status_check};
use super::throttle::ConstantThroughput;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct UserStats {
    pub iterations: u64,
    pub idle_status_checks: u64,
}

/// One independent simulated client. Owns its RNG and the ids it submitted.
pub(super) struct VirtualUser {
    id: usize,
    rng: StdRng,
    seen: Vec<String>,
}

impl VirtualUser {
    pub(super) fn new(id: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_entropy(),
        };
        Self {
            id,
            rng,
            seen: Vec::new(),
        }
    }

    /// Runs iterations until `deadline` or shutdown. An iteration that has
    /// started always finishes, including its polling.
    pub(super) async fn run(
        mut self,
        ctx: Arc<LoadContext>,
        deadline: Instant,
        mut shutdown_rx: ShutdownReceiver,
    ) -> UserStats {
        let mut stats = UserStats::default();
        let mut throttle = ConstantThroughput::new(Instant::now(), ctx.user_rate);
        loop {
            if Instant::now() >= deadline || stop_requested(&mut shutdown_rx) {
                break;
            }

            match ctx.mix.pick(&mut self.rng) {
                TaskKind::HealthCheck => run_health(&ctx).await,
                TaskKind::Execute => run_execute(&ctx, &mut self.rng, &mut self.seen).await,
                TaskKind::StatusCheck => {
                    if !run_status_check(&ctx, &mut self.rng, &self.seen).await {
                        stats.idle_status_checks = stats.idle_status_checks.saturating_add(1);
                    }
                }
            }
            stats.iterations = stats.iterations.saturating_add(1);

            let Some(next_start) = throttle.next_start() else {
                break;
            };
            if next_start >= deadline {
                break;
            }
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                () = sleep_until(next_start) => {}
            }
        }
        debug!(
            "User {} stopped after {} iterations ({} tasks submitted)",
            self.id,
            stats.iterations,
            self.seen.len()
        );
        stats
    }
}

fn stop_requested(shutdown_rx: &mut ShutdownReceiver) -> bool {
    match shutdown_rx.try_recv() {
        Err(TryRecvError::Empty) => false,
        Ok(()) | Err(TryRecvError::Closed | TryRecvError::Lagged(_)) => true,
    }
}
