//! Weighted multi-user load generation against the gateway.
mod mix;
mod scheduler;
mod tasks;
mod throttle;
mod user;

#[cfg(test)]
mod tests;

pub use mix::{DEFAULT_WEIGHTS, TaskKind, TaskMix, parse_weights};
pub use scheduler::{LoadOutcome, LoadPlan, run_load};
pub use throttle::ConstantThroughput;
