use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{CheckArgs, Command, CommandLine, GateprobeArgs, GatewayArgs, LoadArgs, PositiveUsize, TaskWeights};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::load::TaskKind;
use crate::slo::SloThreshold;

use super::types::{CheckConfig, CommandConfig, ConfigFile, LoadConfig, SloConfig};

/// Applies configuration values to CLI arguments. Options given on the
/// command line or through the environment keep their value.
///
/// # Errors
///
/// Returns an error when config values are invalid.
pub fn apply_config(
    args: &mut GateprobeArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    match &mut args.command {
        Command::Load(load) => {
            let sub = matches.subcommand_matches("load").unwrap_or(matches);
            apply_gateway(&mut load.gateway, sub, config)?;
            if let Some(load_config) = config.load.as_ref() {
                apply_load(load, sub, load_config)?;
            }
        }
        Command::Check(check) => {
            let sub = matches.subcommand_matches("check").unwrap_or(matches);
            apply_gateway(&mut check.gateway, sub, config)?;
            if let Some(check_config) = config.check.as_ref() {
                apply_check(check, sub, check_config)?;
            }
        }
    }
    Ok(())
}

fn set_by_user(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn apply_gateway(args: &mut GatewayArgs, matches: &ArgMatches, config: &ConfigFile) -> AppResult<()> {
    if !set_by_user(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = url;
    }

    if !set_by_user(matches, "request_timeout")
        && let Some(timeout) = config.request_timeout.as_ref()
    {
        args.request_timeout = timeout.to_duration("request_timeout")?;
    }

    if !set_by_user(matches, "command_timeout")
        && let Some(timeout) = config.command_timeout.as_ref()
    {
        args.command_timeout = timeout.to_duration("command_timeout")?;
    }

    let Some(server) = config.server.as_ref() else {
        return Ok(());
    };

    if !set_by_user(matches, "server_cmd")
        && let Some(command) = server.command.clone()
    {
        args.server_cmd = Some(command);
    }

    if !set_by_user(matches, "server_args")
        && let Some(server_args) = server.args.clone()
    {
        args.server_args = server_args;
    }

    if !set_by_user(matches, "ready_pattern")
        && let Some(pattern) = server.ready_pattern.clone()
    {
        args.ready_pattern = pattern;
    }

    if !set_by_user(matches, "ready_timeout")
        && let Some(timeout) = server.ready_timeout.as_ref()
    {
        args.ready_timeout = timeout.to_duration("server.ready_timeout")?;
    }

    if !set_by_user(matches, "stop_grace")
        && let Some(grace) = server.stop_grace.as_ref()
    {
        args.stop_grace = grace.to_duration("server.stop_grace")?;
    }

    Ok(())
}

fn apply_load(args: &mut LoadArgs, matches: &ArgMatches, config: &LoadConfig) -> AppResult<()> {
    if !set_by_user(matches, "users")
        && let Some(users) = config.users
    {
        args.users = ensure_positive_usize(users, "load.users")?;
    }

    if !set_by_user(matches, "user_rate")
        && let Some(rate) = config.user_rate
    {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(AppError::config(ConfigError::InvalidUserRate {
                source: ValidationError::InvalidRate {
                    value: rate.to_string(),
                },
            }));
        }
        args.user_rate = rate;
    }

    if !set_by_user(matches, "duration")
        && let Some(duration) = config.duration.as_ref()
    {
        args.duration = duration.to_duration("load.duration")?;
    }

    if !set_by_user(matches, "spawn_rate")
        && let Some(spawn_rate) = config.spawn_rate
    {
        args.spawn_rate = Some(ensure_positive_usize(spawn_rate, "load.spawn_rate")?);
    }

    if !set_by_user(matches, "spawn_interval")
        && let Some(interval) = config.spawn_interval.as_ref()
    {
        args.spawn_interval = interval.to_duration("load.spawn_interval")?;
    }

    if !set_by_user(matches, "poll_interval")
        && let Some(interval) = config.poll_interval.as_ref()
    {
        args.poll_interval = interval.to_duration("load.poll_interval")?;
    }

    if !set_by_user(matches, "poll_max_wait")
        && let Some(max_wait) = config.poll_max_wait.as_ref()
    {
        args.poll_max_wait = max_wait.to_duration("load.poll_max_wait")?;
    }

    if !set_by_user(matches, "weights")
        && let Some(weights) = config.weights.as_ref()
    {
        args.weights = parse_weight_table(weights)?;
    }

    if !set_by_user(matches, "commands")
        && let Some(commands) = config.commands.as_ref()
    {
        args.commands = commands
            .iter()
            .enumerate()
            .map(|(index, command)| parse_command_config(index, command))
            .collect::<AppResult<Vec<_>>>()?;
    }

    if !set_by_user(matches, "slos")
        && let Some(slos) = config.slos.as_ref()
    {
        args.slos = slos
            .iter()
            .enumerate()
            .map(|(index, slo)| parse_slo_config(index, slo))
            .collect::<AppResult<Vec<_>>>()?;
    }

    if !set_by_user(matches, "export_json")
        && let Some(path) = config.export_json.clone()
    {
        args.export_json = Some(path);
    }

    if !set_by_user(matches, "fail_on_slo")
        && let Some(fail_on_slo) = config.fail_on_slo
    {
        args.fail_on_slo = fail_on_slo;
    }

    if !set_by_user(matches, "seed")
        && let Some(seed) = config.seed
    {
        args.seed = Some(seed);
    }

    Ok(())
}

fn apply_check(args: &mut CheckArgs, matches: &ArgMatches, config: &CheckConfig) -> AppResult<()> {
    if !set_by_user(matches, "workspace")
        && let Some(workspace) = config.workspace.clone()
    {
        args.workspace = Some(workspace);
    }

    if !set_by_user(matches, "poll_interval")
        && let Some(interval) = config.poll_interval.as_ref()
    {
        args.poll_interval = interval.to_duration("check.poll_interval")?;
    }

    if !set_by_user(matches, "poll_max_wait")
        && let Some(max_wait) = config.poll_max_wait.as_ref()
    {
        args.poll_max_wait = max_wait.to_duration("check.poll_max_wait")?;
    }

    Ok(())
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn parse_weight_table(
    table: &std::collections::BTreeMap<String, u32>,
) -> AppResult<TaskWeights> {
    let invalid = |source| AppError::config(ConfigError::InvalidWeights { source });
    let mut weights: Vec<(TaskKind, u32)> = Vec::with_capacity(table.len());
    for (name, weight) in table {
        let kind: TaskKind = name.parse().map_err(invalid)?;
        weights.retain(|(existing, _)| *existing != kind);
        weights.push((kind, *weight));
    }
    if weights.iter().all(|(_, weight)| *weight == 0) {
        return Err(invalid(ValidationError::WeightsAllZero));
    }
    Ok(TaskWeights(weights))
}

fn parse_command_config(index: usize, config: &CommandConfig) -> AppResult<CommandLine> {
    let command = match config {
        CommandConfig::Line(line) => line
            .parse::<CommandLine>()
            .map_err(|_err| AppError::config(ConfigError::EmptyCommand { index }))?,
        CommandConfig::Spec {
            command,
            args,
            timeout,
        } => {
            if command.trim().is_empty() {
                return Err(AppError::config(ConfigError::EmptyCommand { index }));
            }
            let timeout = timeout
                .as_ref()
                .map(|timeout| timeout.to_duration(&format!("load.commands[{}].timeout", index)))
                .transpose()?;
            CommandLine {
                program: command.trim().to_owned(),
                args: args.clone(),
                timeout,
            }
        }
    };
    Ok(command)
}

fn parse_slo_config(index: usize, config: &SloConfig) -> AppResult<SloThreshold> {
    let percentile = if config.percentile > 1.0 {
        config.percentile / 100.0
    } else {
        config.percentile
    };
    SloThreshold::new(config.endpoint.trim(), percentile, config.max_ms)
        .map_err(|source| AppError::config(ConfigError::InvalidSlo { index, source }))
}
