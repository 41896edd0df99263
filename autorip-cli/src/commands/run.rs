//! Implementation of the stage flags (`--rip`, `--compress`, `--extra`, `--all`).

use crate::error::CliResult;

use autorip_core::{
    Collaborators, CoreConfig, Ledger, Orchestrator, RunSummary, Stage, StageOutcome,
};

use log::{info, warn};

/// Opens the ledger and runs `stages` with the real collaborators.
pub fn run_stages(config: &CoreConfig, stages: &[Stage]) -> CliResult<RunSummary> {
    let ledger = Ledger::open(&config.database)?;
    let collaborators = Collaborators::from_config(config)?;

    let summary = Orchestrator::new(config, &ledger, collaborators).run(stages)?;
    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    for (stage, outcome) in &summary.stages {
        match outcome {
            StageOutcome::Completed(report) if report.is_idle() => {
                info!("[{}] Nothing to do", stage);
            }
            StageOutcome::Completed(report) => {
                info!(
                    "[{}] {} succeeded, {} failed, {} skipped",
                    stage,
                    report.succeeded.len(),
                    report.failed.len(),
                    report.skipped.len()
                );
            }
            StageOutcome::Skipped => info!("[{}] Skipped, another instance holds the lock", stage),
            StageOutcome::LockUnavailable { reason } => {
                warn!("[{}] Not run: {}", stage, reason);
            }
        }
    }
}
