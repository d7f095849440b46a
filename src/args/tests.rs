use std::time::Duration;

use clap::Parser;

use super::*;
use super::parsers::parse_user_rate;
use crate::error::{AppError, AppResult, ValidationError};
use crate::load::TaskKind;

fn parse<const N: usize>(args: [&str; N]) -> AppResult<GateprobeArgs> {
    GateprobeArgs::try_parse_from(args).map_err(AppError::from)
}

fn load_args(args: GateprobeArgs) -> AppResult<LoadArgs> {
    match args.command {
        Command::Load(load) => Ok(load),
        Command::Check(_) => Err(AppError::validation("Expected load subcommand")),
    }
}

#[test]
fn load_defaults_match_documented_values() -> AppResult<()> {
    let load = load_args(parse(["gateprobe", "load"])?)?;
    if load.users.get() != 20
        || (load.user_rate - 5.0).abs() > f64::EPSILON
        || load.duration != Duration::from_secs(300)
        || load.poll_interval != Duration::from_millis(500)
        || load.poll_max_wait != Duration::from_secs(10)
        || load.gateway.ready_pattern != "Server listening"
        || load.gateway.ready_timeout != Duration::from_secs(15)
        || load.gateway.stop_grace != Duration::from_secs(5)
    {
        return Err(AppError::validation(format!("Unexpected defaults: {:?}", load)));
    }
    if load.weights != TaskWeights::default() || !load.commands.is_empty() || !load.slos.is_empty() {
        return Err(AppError::validation("Unexpected default mix"));
    }
    Ok(())
}

#[test]
fn load_options_parse() -> AppResult<()> {
    let args = parse([
        "gateprobe",
        "--verbose",
        "load",
        "--url",
        "http://127.0.0.1:9000",
        "--users",
        "3",
        "--user-rate",
        "0.5",
        "--duration",
        "2m",
        "--weights",
        "execute=1,status=1",
        "--exec",
        "echo hello world",
        "--slo",
        "Health Check:p99:250",
        "--server-cmd",
        "mcp-gateway",
        "--server-arg",
        "serve",
        "--server-arg",
        "--port=50051",
        "--fail-on-slo",
    ])?;
    if !args.verbose {
        return Err(AppError::validation("Expected --verbose"));
    }
    let load = load_args(args)?;
    if load.users.get() != 3 || load.duration != Duration::from_secs(120) || !load.fail_on_slo {
        return Err(AppError::validation(format!("Unexpected load args: {:?}", load)));
    }
    if load.weights.0 != vec![(TaskKind::Execute, 1), (TaskKind::StatusCheck, 1)] {
        return Err(AppError::validation(format!("Unexpected weights: {:?}", load.weights)));
    }
    let expected_command = CommandLine {
        program: "echo".to_owned(),
        args: vec!["hello".to_owned(), "world".to_owned()],
        timeout: None,
    };
    if load.commands != vec![expected_command] {
        return Err(AppError::validation(format!("Unexpected commands: {:?}", load.commands)));
    }
    if load.gateway.server_args != vec!["serve".to_owned(), "--port=50051".to_owned()] {
        return Err(AppError::validation("Unexpected server args"));
    }
    Ok(())
}

#[test]
fn rejects_invalid_values() -> AppResult<()> {
    for bad in [
        ["gateprobe", "load", "--users", "0"],
        ["gateprobe", "load", "--user-rate", "-1"],
        ["gateprobe", "load", "--weights", "health=0"],
        ["gateprobe", "load", "--duration", "5x"],
        ["gateprobe", "load", "--slo", "Health Check:400"],
    ] {
        if parse(bad).is_ok() {
            return Err(AppError::validation(format!("Expected rejection: {:?}", bad)));
        }
    }
    Ok(())
}

#[test]
fn check_defaults() -> AppResult<()> {
    match parse(["gateprobe", "check"])?.command {
        Command::Check(check)
            if check.poll_interval == Duration::from_secs(1)
                && check.poll_max_wait == Duration::from_secs(10)
                && check.workspace.is_none() =>
        {
            Ok(())
        }
        other => Err(AppError::validation(format!("Unexpected command: {:?}", other))),
    }
}

#[test]
fn duration_units() -> AppResult<()> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("7", Duration::from_secs(7)),
        ("3m", Duration::from_secs(180)),
        ("1h", Duration::from_secs(3600)),
    ];
    for (raw, expected) in cases {
        if parse_duration(raw)? != expected {
            return Err(AppError::validation(format!("{} parsed wrong", raw)));
        }
    }
    match parse_duration("0s") {
        Err(ValidationError::DurationZero) => {}
        other => return Err(AppError::validation(format!("Unexpected: {:?}", other))),
    }
    match parse_duration("5d") {
        Err(ValidationError::InvalidDurationUnit { .. }) => Ok(()),
        other => Err(AppError::validation(format!("Unexpected: {:?}", other))),
    }
}

#[test]
fn exec_splits_on_whitespace_without_quoting() -> AppResult<()> {
    let load = load_args(parse([
        "gateprobe",
        "load",
        "--exec",
        "echo \"Hello, World!\"",
    ])?)?;
    let Some(command) = load.commands.first() else {
        return Err(AppError::validation("Missing --exec command"));
    };
    if command.program != "echo" || command.args != ["\"Hello,", "World!\""] {
        return Err(AppError::validation(format!("Unexpected split: {:?}", command)));
    }
    Ok(())
}

#[test]
fn user_rate_accepts_fractions() -> AppResult<()> {
    if (parse_user_rate("0.25")? - 0.25).abs() > f64::EPSILON {
        return Err(AppError::validation("Unexpected rate"));
    }
    if parse_user_rate("inf").is_ok() || parse_user_rate("0").is_ok() {
        return Err(AppError::validation("Expected rejection"));
    }
    Ok(())
}
