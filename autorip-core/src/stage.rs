//! Pipeline stages and the status preconditions that make a title eligible.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::Title;
use crate::status::TitleStatus;

/// An independently lockable phase of processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Rip,
    Compress,
    Extras,
}

impl Stage {
    /// Stages in pipeline order.
    pub const ALL: [Stage; 3] = [Stage::Rip, Stage::Compress, Stage::Extras];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Rip => "rip",
            Stage::Compress => "compress",
            Stage::Extras => "extras",
        }
    }

    /// The status gate a title must pass before this stage may act on it.
    pub fn precondition(self) -> Precondition {
        match self {
            // Rip only revisits titles whose rip failed; new titles come from
            // inserted discs rather than from the ledger.
            Stage::Rip => Precondition {
                fresh: TitleStatus::RipFailed,
                retry: None,
                requires_extras: false,
            },
            Stage::Compress => Precondition {
                fresh: TitleStatus::Ripped,
                retry: Some(TitleStatus::Compressing),
                requires_extras: false,
            },
            Stage::Extras => Precondition {
                fresh: TitleStatus::Compressed,
                retry: Some(TitleStatus::Renaming),
                requires_extras: true,
            },
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Eligibility rule for a stage.
///
/// `fresh` titles are preferred over `retry` titles so that one title that
/// keeps failing cannot starve newer work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precondition {
    pub fresh: TitleStatus,
    pub retry: Option<TitleStatus>,
    pub requires_extras: bool,
}

impl Precondition {
    pub fn statuses(&self) -> Vec<TitleStatus> {
        let mut statuses = vec![self.fresh];
        statuses.extend(self.retry);
        statuses
    }

    pub fn admits(&self, title: &Title) -> bool {
        let status_ok = title.status == self.fresh || Some(title.status) == self.retry;
        status_ok && (!self.requires_extras || title.extras_enabled)
    }
}
