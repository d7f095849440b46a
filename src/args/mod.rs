//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{CheckArgs, Command, GateprobeArgs, GatewayArgs, LoadArgs};
pub use types::{CommandLine, PositiveUsize, TaskWeights};

pub(crate) use parsers::parse_duration;
