use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::slo::SloThreshold;

use super::parsers::{
    parse_command, parse_duration_arg, parse_positive_usize, parse_slo, parse_task_weights,
    parse_user_rate,
};
use super::types::{CommandLine, PositiveUsize, TaskWeights};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Correctness checks and weighted load tests for asynchronous command-execution gateways."
)]
pub struct GateprobeArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (sets log level to debug unless overridden by GATEPROBE_LOG/RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Path to config file (TOML/JSON). Defaults to ./gateprobe.toml or ./gateprobe.json if present.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run weighted virtual users against the gateway and evaluate latency SLOs
    Load(LoadArgs),
    /// Health check, then execute `ls -la` on a fixture workspace and verify the output
    Check(CheckArgs),
}

/// Gateway location and the optional server process to bracket the run with.
#[derive(Debug, Args, Clone)]
pub struct GatewayArgs {
    /// Gateway base URL
    #[arg(long, short, env = "GATEPROBE_URL", default_value = "http://localhost:8081")]
    pub url: String,

    /// Start this command before the run and stop it afterwards
    #[arg(long = "server-cmd")]
    pub server_cmd: Option<String>,

    /// Argument for --server-cmd (repeatable)
    #[arg(long = "server-arg", allow_hyphen_values = true)]
    pub server_args: Vec<String>,

    /// Output line substring that marks the server as ready
    #[arg(long = "ready-pattern", default_value = "Server listening")]
    pub ready_pattern: String,

    /// How long to wait for the readiness line (supports ms/s/m/h)
    #[arg(long = "ready-timeout", default_value = "15s", value_parser = parse_duration_arg)]
    pub ready_timeout: Duration,

    /// Time between SIGTERM and a forced kill (supports ms/s/m/h)
    #[arg(long = "stop-grace", default_value = "5s", value_parser = parse_duration_arg)]
    pub stop_grace: Duration,

    /// Per-request HTTP timeout (supports ms/s/m/h)
    #[arg(long = "request-timeout", default_value = "10s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Timeout sent with each execute request (supports ms/s/m/h, whole seconds on the wire)
    #[arg(long = "command-timeout", default_value = "30s", value_parser = parse_duration_arg)]
    pub command_timeout: Duration,
}

#[derive(Debug, Args, Clone)]
pub struct LoadArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Number of virtual users
    #[arg(long, default_value = "20", value_parser = parse_positive_usize)]
    pub users: PositiveUsize,

    /// Iterations per second per user
    #[arg(long = "user-rate", default_value = "5", value_parser = parse_user_rate)]
    pub user_rate: f64,

    /// Duration of the run (supports ms/s/m/h)
    #[arg(long, short = 't', default_value = "300s", value_parser = parse_duration_arg)]
    pub duration: Duration,

    /// Users started per spawn tick (default: all at once)
    #[arg(long = "spawn-rate", value_parser = parse_positive_usize)]
    pub spawn_rate: Option<PositiveUsize>,

    /// Interval between spawn ticks (supports ms/s/m/h)
    #[arg(long = "spawn-interval", default_value = "1s", value_parser = parse_duration_arg)]
    pub spawn_interval: Duration,

    /// Delay between status polls (supports ms/s/m/h)
    #[arg(long = "poll-interval", default_value = "500ms", value_parser = parse_duration_arg)]
    pub poll_interval: Duration,

    /// Give up polling a task after this long (supports ms/s/m/h)
    #[arg(long = "poll-max-wait", default_value = "10s", value_parser = parse_duration_arg)]
    pub poll_max_wait: Duration,

    /// Task mix, e.g. health=10,execute=60,status=30
    #[arg(long, default_value = "health=10,execute=60,status=30", value_parser = parse_task_weights)]
    pub weights: TaskWeights,

    /// Command line to execute (repeatable; defaults to a built-in mix).
    /// Split on whitespace with no shell quoting; use a config `commands`
    /// table such as { command = "echo", args = ["Hello, World!"] } for
    /// arguments containing spaces
    #[arg(long = "exec", value_parser = parse_command)]
    pub commands: Vec<CommandLine>,

    /// Latency SLO as '<endpoint>:<percentile>:<max_ms>' (repeatable; default p95 <= 400ms per endpoint)
    #[arg(long = "slo", value_parser = parse_slo)]
    pub slos: Vec<SloThreshold>,

    /// Write the run report as JSON
    #[arg(long = "export-json")]
    pub export_json: Option<String>,

    /// Exit non-zero when any SLO is violated
    #[arg(long = "fail-on-slo")]
    pub fail_on_slo: bool,

    /// Seed for the per-user task and command selection
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Directory to list (default: a temporary directory with file1.txt..file3.txt)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Delay between status polls (supports ms/s/m/h)
    #[arg(long = "poll-interval", default_value = "1s", value_parser = parse_duration_arg)]
    pub poll_interval: Duration,

    /// Give up polling after this long (supports ms/s/m/h)
    #[arg(long = "poll-max-wait", default_value = "10s", value_parser = parse_duration_arg)]
    pub poll_max_wait: Duration,
}
