use std::ffi::OsString;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::app::{run_check, run_load_command};
use crate::args::{Command, GateprobeArgs};
use crate::config::{apply_config, load_config};
use crate::error::AppResult;
use crate::system::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

pub(crate) fn run() -> AppResult<()> {
    let Some((mut args, matches)) = parse_args()? else {
        return Ok(());
    };

    crate::system::logger::init_logging(args.verbose, args.no_color);

    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(&args))
}

fn parse_args() -> AppResult<Option<(GateprobeArgs, ArgMatches)>> {
    let mut cmd = GateprobeArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = GateprobeArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--")
}

async fn run_async(args: &GateprobeArgs) -> AppResult<()> {
    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let result = match &args.command {
        Command::Load(load) => run_load_command(load, &shutdown_tx).await,
        Command::Check(check) => run_check(check, &shutdown_tx).await,
    };

    drop(shutdown_tx.send(()));
    if let Err(err) = signal_handle.await {
        tracing::debug!("Signal handler task ended abnormally: {}", err);
    }
    result
}
