//! Records stored in the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::status::TitleStatus;

/// One tracked movie moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub id: i64,
    pub name: String,
    /// Directory the ripped and compressed files live in. Unique per title.
    pub source_path: PathBuf,
    pub status: TitleStatus,
    /// File name (inside `source_path`) of the most recently produced artifact.
    pub output_file: Option<String>,
    /// Captured from configuration when the title was created.
    pub extras_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Title {
    /// Full path of the current artifact, if one has been produced.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output_file
            .as_deref()
            .map(|file| self.source_path.join(file))
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let source_path: String = row.get("source_path")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            source_path: PathBuf::from(source_path),
            status: row.get("status")?,
            output_file: row.get("output_file")?,
            extras_enabled: row.get("extras_enabled")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Severity of a history entry. Codes match the persisted layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Failure,
}

impl Severity {
    pub fn code(self) -> i64 {
        match self {
            Severity::Normal => 1,
            Severity::Failure => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Severity::Normal),
            4 => Some(Severity::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Normal => f.write_str("normal"),
            Severity::Failure => f.write_str("failure"),
        }
    }
}

impl ToSql for Severity {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Severity {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_i64()?;
        Severity::from_code(code).ok_or(FromSqlError::OutOfRange(code))
    }
}

/// Append-only audit record of something that happened to a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    /// Lookup reference to the owning title; not enforced as a foreign key.
    pub title_id: i64,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title_id: row.get("title_id")?,
            message: row.get("message")?,
            severity: row.get("severity")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub(crate) fn path_to_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
