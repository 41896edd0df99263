// ============================================================================
// autorip-core/src/orchestrator.rs
// ============================================================================
//
// ORCHESTRATOR: Running the Requested Stages Under Their Locks
//
// For each requested stage, in pipeline order, the orchestrator takes the
// stage lock and runs the driver exactly once. A stage whose lock is held by
// another invocation is skipped without touching the ledger. Because the
// stages run in order inside one invocation, `--all` can carry a disc from
// rip through compress to extras in one go.
//
// AI-ASSISTANT-INFO: Stage orchestration with per-stage cross-process locks

// ---- External crate imports ----
use serde::Serialize;

// ---- Internal crate imports ----
use crate::config::CoreConfig;
use crate::drivers::{StageContext, StageReport, run_compress, run_extras, run_rip};
use crate::error::CoreResult;
use crate::external::{
    DiscRipper, Ejector, FileBot, MakeMkv, Renamer, SystemEjector, Transcoder, transcoder_for,
};
use crate::ledger::Ledger;
use crate::lock::{LockOutcome, StageLocks};
use crate::notifications::{NotificationSender, NtfyNotificationSender};
use crate::stage::Stage;

/// The external capabilities the stage drivers delegate to.
pub struct Collaborators {
    pub ripper: Box<dyn DiscRipper>,
    pub transcoder: Box<dyn Transcoder>,
    pub renamer: Box<dyn Renamer>,
    pub ejector: Box<dyn Ejector>,
    pub notifier: Option<Box<dyn NotificationSender>>,
}

impl Collaborators {
    /// Wires up the real tools named in `config`.
    pub fn from_config(config: &CoreConfig) -> CoreResult<Self> {
        let notifier: Option<Box<dyn NotificationSender>> = match &config.notify.ntfy_topic {
            Some(topic) => Some(Box::new(NtfyNotificationSender::new(topic)?)),
            None => None,
        };
        Ok(Self {
            ripper: Box::new(MakeMkv::new(&config.rip.binary, config.rip.cache_mb)),
            transcoder: transcoder_for(&config.compress),
            renamer: Box::new(FileBot::new(&config.extras.binary)),
            ejector: Box::new(SystemEjector),
            notifier,
        })
    }
}

/// What happened to one requested stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The lock was acquired and the driver ran.
    Completed(StageReport),
    /// Another invocation holds the stage lock.
    Skipped,
    /// The lock could not be attempted at all (e.g. unusable lock directory).
    LockUnavailable { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub stages: Vec<(Stage, StageOutcome)>,
}

impl RunSummary {
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| outcome)
    }

    pub fn report(&self, stage: Stage) -> Option<&StageReport> {
        match self.outcome(stage) {
            Some(StageOutcome::Completed(report)) => Some(report),
            _ => None,
        }
    }

    pub fn skipped(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .filter(|(_, outcome)| *outcome == StageOutcome::Skipped)
            .map(|(stage, _)| *stage)
            .collect()
    }
}

pub struct Orchestrator<'a> {
    config: &'a CoreConfig,
    ledger: &'a Ledger,
    collaborators: Collaborators,
    locks: StageLocks,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a CoreConfig, ledger: &'a Ledger, collaborators: Collaborators) -> Self {
        Self {
            config,
            ledger,
            collaborators,
            locks: StageLocks::new(config.lock_dir(), config.lock_timeout()),
        }
    }

    /// Runs `stages` in pipeline order, each at most once.
    ///
    /// Returns an error only for ledger failures; everything else is recorded
    /// per title or per stage in the summary.
    pub fn run(&self, stages: &[Stage]) -> CoreResult<RunSummary> {
        let mut requested = stages.to_vec();
        requested.sort();
        requested.dedup();

        let mut summary = RunSummary::default();
        for stage in requested {
            let outcome = match self.locks.with_stage_lock(stage, || self.run_stage(stage)) {
                Ok(LockOutcome::Acquired(result)) => StageOutcome::Completed(result?),
                Ok(LockOutcome::NotAcquired) => {
                    log::info!("[{}] Another instance is running this stage, skipping", stage);
                    StageOutcome::Skipped
                }
                Err(e) => {
                    log::error!("[{}] Could not take stage lock: {}", stage, e);
                    StageOutcome::LockUnavailable {
                        reason: e.to_string(),
                    }
                }
            };
            summary.stages.push((stage, outcome));
        }
        Ok(summary)
    }

    fn run_stage(&self, stage: Stage) -> CoreResult<StageReport> {
        let ctx = StageContext::new(self.config, self.ledger)
            .with_notifier(self.collaborators.notifier.as_deref());
        log::debug!("[{}] Stage started", stage);

        let report = match stage {
            Stage::Rip => run_rip(
                &ctx,
                self.collaborators.ripper.as_ref(),
                self.collaborators.ejector.as_ref(),
            ),
            Stage::Compress => run_compress(&ctx, self.collaborators.transcoder.as_ref()),
            Stage::Extras => run_extras(&ctx, self.collaborators.renamer.as_ref()),
        }?;

        log::debug!(
            "[{}] Stage finished: {} succeeded, {} failed, {} skipped",
            stage,
            report.succeeded.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}
