//! Coordinator-side reporting: console summary and JSON export.

use std::path::Path;

use anyhow::{Context, Result};
use calor_compute::{ExchangeMode, PhaseTimings, SessionConfig, SessionOutcome};
use calor_core::types::SolveReport;
use serde::Serialize;

/// Print the per-worker results and the coordinator's phase timings.
pub fn print_summary(outcome: &SessionOutcome) {
    for report in &outcome.reports {
        if report.converged {
            println!(
                "worker {}: converged after {} sweeps",
                report.worker_id, report.sweeps
            );
        } else {
            println!(
                "worker {}: not converged after {} sweeps",
                report.worker_id, report.sweeps
            );
        }
    }
    let timings = &outcome.timings;
    println!(
        "communication: {:.6} s",
        timings.communication().as_secs_f64()
    );
    println!("compute:       {:.6} s", timings.solve.as_secs_f64());
    println!("total:         {:.6} s", timings.total().as_secs_f64());
}

/// JSON shape of a completed run.
#[derive(Serialize)]
struct RunSummary<'a> {
    size: usize,
    workers: usize,
    mode: ExchangeMode,
    reports: &'a [SolveReport],
    timings: TimingSummary,
}

#[derive(Serialize)]
struct TimingSummary {
    distribute_s: f64,
    solve_s: f64,
    collect_s: f64,
}

impl From<&PhaseTimings> for TimingSummary {
    fn from(timings: &PhaseTimings) -> Self {
        Self {
            distribute_s: timings.distribute.as_secs_f64(),
            solve_s: timings.solve.as_secs_f64(),
            collect_s: timings.collect.as_secs_f64(),
        }
    }
}

/// Write the run summary to `path` as pretty-printed JSON.
pub fn write_json(
    outcome: &SessionOutcome,
    config: &SessionConfig,
    size: usize,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let summary = RunSummary {
        size,
        workers: config.workers,
        mode: config.mode,
        reports: &outcome.reports,
        timings: TimingSummary::from(&outcome.timings),
    };
    let json = serde_json::to_string_pretty(&summary).context("serialising run summary")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;

    println!("Summary written to: {}", path.display());
    Ok(())
}
