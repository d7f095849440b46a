//! Core library for the `gateprobe` CLI.
//!
//! `gateprobe` drives asynchronous command-execution gateways: it submits
//! commands, polls them to a terminal state, and either verifies a single
//! fixture listing (`check`) or runs weighted virtual users while aggregating
//! per-endpoint latency percentiles and evaluating SLOs (`load`). The library
//! modules back the binary; the gateway, load, metrics and slo APIs can also
//! be driven directly.
mod app;
pub mod args;
pub mod config;
mod entry;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod load;
pub mod metrics;
pub mod shutdown;
pub mod slo;
mod system;

/// Parses the command line, applies the config file and runs the selected
/// subcommand on a multi-threaded runtime.
///
/// # Errors
///
/// Returns an error when arguments or config are invalid, the gateway
/// cannot be reached, the check fails, or `--fail-on-slo` sees a violation.
pub fn run() -> error::AppResult<()> {
    entry::run()
}
