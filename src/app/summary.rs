use crate::load::LoadOutcome;
use crate::metrics::TallySnapshot;
use crate::slo::{SloOutcome, SloVerdict};

pub(crate) fn summary_lines(outcome: &LoadOutcome, slos: &[SloOutcome]) -> Vec<String> {
    let report = &outcome.report;
    let mut lines = Vec::new();

    lines.push(format!(
        "Window: {:.1}s, users started: {}, iterations: {}",
        report.window.as_secs_f64(),
        outcome.users_started,
        outcome.iterations
    ));
    if outcome.idle_status_checks > 0 {
        lines.push(format!(
            "Status checks skipped (no task seen yet): {}",
            outcome.idle_status_checks
        ));
    }

    let endpoints = report.endpoint_percentiles();
    if endpoints.is_empty() {
        lines.push("No requests recorded.".to_owned());
    } else {
        lines.push(format!(
            "{:<32} {:>8} {:>8} {:>9} {:>9} {:>9} {:>9} {:>8}",
            "Endpoint", "Requests", "Failures", "p50 ms", "p90 ms", "p95 ms", "p99 ms", "RPS"
        ));
        for (name, set) in &endpoints {
            lines.push(format!(
                "{:<32} {:>8} {:>8} {:>9.1} {:>9.1} {:>9.1} {:>9.1} {:>8.2}",
                name, set.count, set.failures, set.p50, set.p90, set.p95, set.p99, set.rps
            ));
        }
        lines.push(format!("Total requests: {}", report.total_requests()));
    }

    lines.extend(tally_lines(&outcome.tally));
    lines.extend(slos.iter().map(slo_line));
    lines
}

fn tally_lines(tally: &TallySnapshot) -> Vec<String> {
    if tally.total() == 0 {
        return vec!["Errors: none".to_owned()];
    }
    vec![
        format!("Errors: {}", tally.total()),
        format!("  Transport: {}", tally.transport),
        format!("  Malformed response: {}", tally.malformed),
        format!("  Unknown status: {}", tally.unknown_status),
        format!("  Poll timeout: {}", tally.poll_timeout),
        format!("  Task failed: {}", tally.task_failed),
    ]
}

fn percentile_label(percentile: f64) -> String {
    format!("p{}", (percentile * 1000.0).round() / 10.0)
}

pub(crate) fn slo_line(outcome: &SloOutcome) -> String {
    let label = percentile_label(outcome.percentile);
    match (outcome.verdict, outcome.observed_ms) {
        (SloVerdict::SloMet, Some(observed)) => format!(
            "SUCCESS: {} {} {:.1}ms <= {}ms",
            outcome.endpoint_name, label, observed, outcome.max_ms
        ),
        (SloVerdict::SloViolated, Some(observed)) => format!(
            "WARNING: {} {} {:.1}ms exceeds the {}ms target",
            outcome.endpoint_name, label, observed, outcome.max_ms
        ),
        (SloVerdict::NoData | SloVerdict::SloMet | SloVerdict::SloViolated, _) => format!(
            "WARNING: {} {} has no samples ({}ms target not evaluated)",
            outcome.endpoint_name, label, outcome.max_ms
        ),
    }
}

pub(crate) fn print_summary(outcome: &LoadOutcome, slos: &[SloOutcome]) {
    for line in summary_lines(outcome, slos) {
        println!("{}", line);
    }
}
