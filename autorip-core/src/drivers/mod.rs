// ============================================================================
// autorip-core/src/drivers/mod.rs
// ============================================================================
//
// STAGE DRIVERS: Transition Protocol Around Each Collaborator Call
//
// A driver picks the work its stage is allowed to do, moves the title into
// the stage's in-progress state, calls the collaborator, and records the
// outcome. Every status change goes through `advance` or `claim`, which
// validate it against the transition table and pair it with exactly one
// history entry.
//
// Only ledger failures are returned as errors. A collaborator failure is an
// outcome: it is written to the ledger and reported in the StageReport.
//
// AI-ASSISTANT-INFO: Shared driver context, reports and transition helpers

// ---- External crate imports ----
use serde::Serialize;

// ---- Internal crate imports ----
use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::ledger::{Ledger, Severity, Title};
use crate::notifications::{self, NotificationSender, NotificationType};
use crate::stage::Stage;
use crate::status::TitleStatus;
use crate::utils::hostname;

pub mod compress;
pub mod extras;
pub mod rip;

pub use compress::run_compress;
pub use extras::run_extras;
pub use rip::run_rip;

/// Everything a driver reads from besides its collaborators.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub config: &'a CoreConfig,
    pub ledger: &'a Ledger,
    pub notifier: Option<&'a dyn NotificationSender>,
}

impl<'a> StageContext<'a> {
    pub fn new(config: &'a CoreConfig, ledger: &'a Ledger) -> Self {
        Self {
            config,
            ledger,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Option<&'a dyn NotificationSender>) -> Self {
        self.notifier = notifier;
        self
    }

    pub(crate) fn notify(&self, notification: NotificationType) {
        notifications::dispatch(self.notifier, notification);
    }

    pub(crate) fn notify_failure(&self, stage: Stage, title: &Title, message: &str) {
        self.notify(NotificationType::StageFailed {
            stage,
            title: title.name.clone(),
            message: message.to_string(),
            hostname: hostname(),
        });
    }
}

/// What one driver run did, by title name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// True when the driver found nothing to act on.
    pub fn is_idle(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Validates and persists `title -> next`, then records `message`.
pub(crate) fn advance(
    ledger: &Ledger,
    title: &mut Title,
    next: TitleStatus,
    output_file: Option<&str>,
    message: &str,
    severity: Severity,
) -> CoreResult<()> {
    title.status.transition(next)?;
    ledger.update_status(title, next, output_file)?;
    ledger.append_history(title, message, severity);
    Ok(())
}

/// Like `advance`, but only if no other writer changed the title since it was
/// read. Returns `false` (and writes nothing) when the claim is lost.
pub(crate) fn claim(
    ledger: &Ledger,
    title: &mut Title,
    next: TitleStatus,
    message: &str,
) -> CoreResult<bool> {
    title.status.transition(next)?;
    if !ledger.claim(title, next, None)? {
        log::info!(
            "Title {} ('{}') changed under us, leaving it alone",
            title.id,
            title.name
        );
        return Ok(false);
    }
    ledger.append_history(title, message, Severity::Normal);
    Ok(true)
}
