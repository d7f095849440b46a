use std::time::Duration;

use tokio::time::Instant;

/// Cumulative per-user pacing: iteration `n + 1` may not start before
/// `start + n / rate`. A slow iteration is caught up on by the following
/// ones instead of shifting the whole schedule.
#[derive(Debug, Clone)]
pub struct ConstantThroughput {
    start: Instant,
    rate: f64,
    completed: u64,
}

impl ConstantThroughput {
    /// `rate` is iterations per second and must be positive and finite.
    #[must_use]
    pub const fn new(start: Instant, rate: f64) -> Self {
        Self {
            start,
            rate,
            completed: 0,
        }
    }

    /// Marks one iteration done and returns the earliest start of the next.
    /// `None` when the offset does not fit in an `Instant`.
    pub fn next_start(&mut self) -> Option<Instant> {
        self.completed = self.completed.saturating_add(1);
        let offset = Duration::try_from_secs_f64(self.completed as f64 / self.rate).ok()?;
        self.start.checked_add(offset)
    }
}
