use std::sync::Arc;

use tracing::{info, warn};

use crate::args::LoadArgs;
use crate::error::{AppError, AppResult, ValidationError};
use crate::gateway::{
    COMPLETION_ENDPOINT, CommandSpec, GatewayTransport, HttpGatewayTransport, PollSettings,
    check_health, is_healthy,
};
use crate::load::{LoadPlan, TaskMix, run_load};
use crate::metrics::AggregateReport;
use crate::shutdown::ShutdownSender;
use crate::slo::{SloOutcome, SloThreshold, default_thresholds, evaluate};

use super::export::{RunReport, export_json};
use super::server::with_optional_server;
use super::summary::print_summary;

pub(crate) fn build_plan(args: &LoadArgs) -> AppResult<LoadPlan> {
    let command_timeout = args.gateway.command_timeout;
    let commands = if args.commands.is_empty() {
        CommandSpec::default_mix(command_timeout)
    } else {
        args.commands
            .iter()
            .map(|line| line.to_spec(command_timeout))
            .collect()
    };
    let mix = TaskMix::new(&args.weights.0)?;
    let users = args.users.get();

    Ok(LoadPlan {
        users,
        user_rate: args.user_rate,
        duration: args.duration,
        spawn_rate: args.spawn_rate.map_or(users, |rate| rate.get()),
        spawn_interval: args.spawn_interval,
        poll: PollSettings {
            interval: args.poll_interval,
            max_wait: args.poll_max_wait,
        },
        mix,
        commands,
        seed: args.seed,
    })
}

/// Default targets cover the request endpoints only. The completion bucket
/// includes poll sleeps and is judged only through an explicit `--slo`.
pub(crate) fn default_slo_thresholds(report: &AggregateReport) -> Vec<SloThreshold> {
    default_thresholds(
        report
            .endpoints
            .keys()
            .filter(|name| name.as_str() != COMPLETION_ENDPOINT),
    )
}

async fn preflight(transport: &dyn GatewayTransport) -> AppResult<()> {
    let status = check_health(transport).await?;
    if is_healthy(&status) {
        info!("Gateway reports '{}'", status);
    } else {
        warn!("Gateway reports '{}', continuing with the load run", status);
    }
    Ok(())
}

/// Runs the `load` subcommand: preflight health, the weighted load run,
/// summary, SLO evaluation and the optional JSON export.
pub(crate) async fn run_load_command(
    args: &LoadArgs,
    shutdown_tx: &ShutdownSender,
) -> AppResult<()> {
    let plan = build_plan(args)?;
    let transport: Arc<dyn GatewayTransport> = Arc::new(HttpGatewayTransport::new(
        &args.gateway.url,
        args.gateway.request_timeout,
    )?);

    info!(
        "Starting load: {} users at {} it/s each for {:?} against {}",
        plan.users, plan.user_rate, plan.duration, args.gateway.url
    );
    let transport = &transport;
    let outcome = with_optional_server(&args.gateway, || async move {
        preflight(transport.as_ref()).await?;
        run_load(plan, Arc::clone(transport), shutdown_tx).await
    })
    .await?;

    let thresholds = if args.slos.is_empty() {
        default_slo_thresholds(&outcome.report)
    } else {
        args.slos.clone()
    };
    let slo_outcomes = evaluate(&outcome.report, &thresholds);
    print_summary(&outcome, &slo_outcomes);

    if let Some(path) = args.export_json.as_deref() {
        export_json(path, &RunReport::new(&outcome, &slo_outcomes)).await?;
        info!("Wrote JSON report to {}", path);
    }

    enforce_slos(&slo_outcomes, args.fail_on_slo)
}

fn enforce_slos(outcomes: &[SloOutcome], fail_on_slo: bool) -> AppResult<()> {
    let violations = outcomes.iter().filter(|outcome| outcome.is_violation()).count();
    if violations > 0 {
        warn!("{} SLO threshold(s) violated", violations);
        if fail_on_slo {
            return Err(AppError::validation(ValidationError::SloViolated { violations }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Command, GateprobeArgs};
    use crate::slo::SloVerdict;
    use clap::Parser;
    use std::time::Duration;

    fn parse_load(extra: &[&str]) -> Result<LoadArgs, String> {
        let mut argv = vec!["gateprobe", "load"];
        argv.extend_from_slice(extra);
        let args = GateprobeArgs::try_parse_from(argv).map_err(|err| err.to_string())?;
        match args.command {
            Command::Load(load) => Ok(load),
            Command::Check(_) => Err("expected load subcommand".to_owned()),
        }
    }

    fn outcome(verdict: SloVerdict) -> SloOutcome {
        SloOutcome {
            endpoint_name: "Health Check".to_owned(),
            percentile: 0.95,
            observed_ms: Some(450.0),
            max_ms: 400.0,
            verdict,
        }
    }

    #[test]
    fn plan_defaults_to_builtin_mix_and_full_spawn() -> Result<(), String> {
        let args = parse_load(&["--users", "4", "--command-timeout", "7s"])?;
        let plan = build_plan(&args).map_err(|err| err.to_string())?;
        if plan.spawn_rate != 4 || plan.users != 4 {
            return Err(format!("unexpected users/spawn rate: {}/{}", plan.users, plan.spawn_rate));
        }
        if plan.commands.len() != 5 {
            return Err(format!("expected 5 built-in commands, got {}", plan.commands.len()));
        }
        if plan
            .commands
            .iter()
            .any(|spec| spec.timeout != Duration::from_secs(7))
        {
            return Err("built-in commands should carry --command-timeout".to_owned());
        }
        Ok(())
    }

    #[test]
    fn plan_uses_explicit_commands() -> Result<(), String> {
        let args = parse_load(&["--exec", "echo hi there", "--spawn-rate", "2"])?;
        let plan = build_plan(&args).map_err(|err| err.to_string())?;
        let [spec] = plan.commands.as_slice() else {
            return Err(format!("expected one command, got {:?}", plan.commands));
        };
        if spec.command != "echo" || spec.args != ["hi", "there"] {
            return Err(format!("unexpected command: {:?}", spec));
        }
        if plan.spawn_rate != 2 {
            return Err(format!("expected spawn rate 2, got {}", plan.spawn_rate));
        }
        Ok(())
    }

    #[test]
    fn violations_only_fail_when_requested() -> Result<(), String> {
        let outcomes = vec![outcome(SloVerdict::SloViolated), outcome(SloVerdict::SloMet)];
        enforce_slos(&outcomes, false).map_err(|err| err.to_string())?;
        match enforce_slos(&outcomes, true) {
            Err(AppError::Validation(ValidationError::SloViolated { violations: 1 })) => Ok(()),
            other => Err(format!("expected one violation, got {:?}", other)),
        }
    }
}
