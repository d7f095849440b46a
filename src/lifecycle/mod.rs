//! Scoped start/ready/stop bracket around an external gateway process.
mod scope;
mod server;


pub use scope::with_running_server;
pub use server::{ServerProcess, ServerSpec, StopOutcome};
