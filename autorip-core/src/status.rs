//! Title lifecycle states and the transition table between them.
//!
//! Every title moves through these states as the rip, compress and extras
//! stages act on it. The integer codes are persisted in the ledger and are
//! part of its durable contract, so they must never be renumbered.
//!
//! ```text
//! New ─► Ripping ─► Ripped ─► Compressing ─► Compressed ─► Renaming
//!                                                 │  ▲          │
//!                                                 │  └──────────┘
//!                                                 ▼
//!                                             Finalized
//! ```
//!
//! `New`, `Ripping`, `Ripped` and `Compressing` may fall back to `RipFailed`,
//! which the rip stage retries when the disc is inserted again. A failed
//! compression or rename leaves the title in `Compressing` or `Renaming`,
//! from where the same stage picks it up again.

use serde::{Deserialize, Serialize};
use std::fmt;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::error::{CoreError, CoreResult};

/// Lifecycle state of a tracked title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStatus {
    /// Record created, nothing ripped yet.
    New,
    /// The last rip attempt failed, or the ripped file disappeared.
    RipFailed,
    /// Extraction is in progress.
    Ripping,
    /// Raw rip finished and awaits compression.
    Ripped,
    /// Compression in progress, or a previous attempt failed and will be retried.
    Compressing,
    /// Compressed (or renamed, awaiting finalization).
    Compressed,
    /// Rename in progress, or a previous rename failed and will be retried.
    Renaming,
    /// All configured work is done.
    Finalized,
}

impl TitleStatus {
    /// All states, in code order.
    pub const ALL: [TitleStatus; 8] = [
        TitleStatus::New,
        TitleStatus::RipFailed,
        TitleStatus::Ripping,
        TitleStatus::Ripped,
        TitleStatus::Compressing,
        TitleStatus::Compressed,
        TitleStatus::Renaming,
        TitleStatus::Finalized,
    ];

    /// Stable integer code stored in the ledger.
    pub fn code(self) -> i64 {
        match self {
            TitleStatus::New => 1,
            TitleStatus::RipFailed => 2,
            TitleStatus::Ripping => 3,
            TitleStatus::Ripped => 4,
            TitleStatus::Compressing => 5,
            TitleStatus::Compressed => 6,
            TitleStatus::Renaming => 7,
            TitleStatus::Finalized => 8,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Human-readable name, also seeded into the `statuses` lookup table.
    pub fn name(self) -> &'static str {
        match self {
            TitleStatus::New => "new",
            TitleStatus::RipFailed => "rip_failed",
            TitleStatus::Ripping => "ripping",
            TitleStatus::Ripped => "ripped",
            TitleStatus::Compressing => "compressing",
            TitleStatus::Compressed => "compressed",
            TitleStatus::Renaming => "renaming",
            TitleStatus::Finalized => "finalized",
        }
    }

    /// Transition table. Self-loops exist only for the two states that retry
    /// in place after a failed attempt.
    pub fn can_transition_to(self, next: TitleStatus) -> bool {
        use TitleStatus::*;
        matches!(
            (self, next),
            (New, Ripping)
                | (New, RipFailed)
                | (RipFailed, Ripping)
                | (Ripping, Ripped)
                | (Ripping, RipFailed)
                | (Ripped, Compressing)
                | (Ripped, RipFailed)
                | (Compressing, Compressing)
                | (Compressing, Compressed)
                | (Compressing, RipFailed)
                | (Compressed, Renaming)
                | (Compressed, Finalized)
                | (Renaming, Renaming)
                | (Renaming, Compressed)
        )
    }

    /// Validates a transition, returning the new state.
    pub fn transition(self, next: TitleStatus) -> CoreResult<TitleStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::IllegalTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for TitleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ToSql for TitleStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for TitleStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_i64()?;
        TitleStatus::from_code(code).ok_or(FromSqlError::OutOfRange(code))
    }
}
