//! Persistent record of every tracked title and its event history.
//!
//! The ledger is a SQLite database shared by every invocation of the
//! pipeline. It stores mechanism only: `update_status` does not check whether
//! a transition is legal (the stage drivers do that), and history writes are
//! best-effort so a lost audit line never aborts media work.

mod models;
mod schema;

pub use models::{HistoryEntry, Severity, Title};
pub use schema::SCHEMA_VERSION;

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, TransactionBehavior, params};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CoreError, CoreResult};
use crate::stage::Stage;
use crate::status::TitleStatus;
use models::path_to_text;

/// How long a writer waits for another process to release the database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const TITLE_COLUMNS: &str =
    "id, name, source_path, status, output_file, extras_enabled, created_at, updated_at";

/// Handle to the title ledger.
#[derive(Debug)]
pub struct Ledger {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Ledger {
    /// Opens (creating if necessary) the ledger at `path` and applies the schema.
    pub fn open(path: &Path) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("Opened ledger {} (journal mode {})", path.display(), mode);

        schema::migrate(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens an existing ledger without creating or migrating anything.
    pub fn open_read_only(path: &Path) -> CoreResult<Self> {
        if !path.is_file() {
            return Err(CoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("ledger '{}' does not exist", path.display()),
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// In-memory ledger, used by tests and dry runs.
    pub fn open_in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Records a newly discovered title together with its `"created"` entry.
    ///
    /// Fails with [`CoreError::DuplicatePath`] when `path` is already tracked.
    pub fn create_title(&self, name: &str, path: &Path, extras_enabled: bool) -> CoreResult<Title> {
        let now = Utc::now();
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            "INSERT INTO titles (name, source_path, status, output_file, extras_enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?5)",
            params![name, path_to_text(path), TitleStatus::New, extras_enabled, now],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                return Err(CoreError::DuplicatePath(path.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        }

        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO history (title_id, message, severity, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, "created", Severity::Normal, now],
        )?;
        tx.commit()?;

        log::debug!("Created title {} '{}' at {}", id, name, path.display());
        Ok(Title {
            id,
            name: name.to_string(),
            source_path: path.to_path_buf(),
            status: TitleStatus::New,
            output_file: None,
            extras_enabled,
            created_at: now,
            updated_at: now,
        })
    }

    /// Unconditionally sets the status (and, when given, the output file).
    ///
    /// `title` is updated in place to mirror what was persisted.
    pub fn update_status(
        &self,
        title: &mut Title,
        status: TitleStatus,
        output_file: Option<&str>,
    ) -> CoreResult<()> {
        let now = Utc::now();
        let changed = self.conn.execute(
            "UPDATE titles SET status = ?2, output_file = COALESCE(?3, output_file), updated_at = ?4
             WHERE id = ?1",
            params![title.id, status, output_file, now],
        )?;
        if changed == 0 {
            return Err(CoreError::TitleNotFound(title.id));
        }

        apply(title, status, output_file, now);
        Ok(())
    }

    /// Compare-and-set status update.
    ///
    /// Moves `title` to `next` only if the stored status still equals
    /// `title.status`. Returns `false` when another writer got there first,
    /// in which case nothing is changed.
    pub fn claim(
        &self,
        title: &mut Title,
        next: TitleStatus,
        output_file: Option<&str>,
    ) -> CoreResult<bool> {
        let now = Utc::now();
        let changed = self.conn.execute(
            "UPDATE titles SET status = ?3, output_file = COALESCE(?4, output_file), updated_at = ?5
             WHERE id = ?1 AND status = ?2",
            params![title.id, title.status, next, output_file, now],
        )?;
        if changed == 0 {
            return Ok(false);
        }

        apply(title, next, output_file, now);
        Ok(true)
    }

    /// Corrects a title's display name.
    pub fn rename_title(&self, title: &mut Title, name: &str) -> CoreResult<()> {
        let now = Utc::now();
        let changed = self.conn.execute(
            "UPDATE titles SET name = ?2, updated_at = ?3 WHERE id = ?1",
            params![title.id, name, now],
        )?;
        if changed == 0 {
            return Err(CoreError::TitleNotFound(title.id));
        }
        title.name = name.to_string();
        title.updated_at = now;
        Ok(())
    }

    /// Appends an audit entry. Never fails the caller.
    pub fn append_history(&self, title: &Title, message: &str, severity: Severity) {
        if let Err(e) = self.try_append_history(title.id, message, severity) {
            log::error!(
                "Failed to record history for title {} ('{}'): {}",
                title.id,
                message,
                e
            );
        }
    }

    fn try_append_history(&self, title_id: i64, message: &str, severity: Severity) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO history (title_id, message, severity, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![title_id, message, severity, Utc::now()],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Oldest title satisfying `stage`'s precondition, fresh work first.
    pub fn find_next_eligible(&self, stage: Stage) -> CoreResult<Option<Title>> {
        let pre = stage.precondition();
        let statuses = pre.statuses();
        let placeholders = (0..statuses.len())
            .map(|i| format!("?{}", i + 3))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {TITLE_COLUMNS} FROM titles
             WHERE status IN ({placeholders}) AND (?2 = 0 OR extras_enabled = 1)
             ORDER BY CASE WHEN status = ?1 THEN 0 ELSE 1 END, id
             LIMIT 1"
        );
        let mut values: Vec<&dyn rusqlite::ToSql> = vec![&pre.fresh, &pre.requires_extras];
        values.extend(statuses.iter().map(|s| s as &dyn rusqlite::ToSql));

        let title = self
            .conn
            .query_row(&sql, values.as_slice(), Title::from_row)
            .optional()?;
        if let Some(t) = &title {
            debug_assert!(pre.admits(t), "{} selected outside its precondition", t.id);
        }
        Ok(title)
    }

    pub fn find_by_path(&self, path: &Path) -> CoreResult<Option<Title>> {
        let sql = format!("SELECT {TITLE_COLUMNS} FROM titles WHERE source_path = ?1");
        let title = self
            .conn
            .query_row(&sql, params![path_to_text(path)], Title::from_row)
            .optional()?;
        Ok(title)
    }

    pub fn get_title(&self, id: i64) -> CoreResult<Title> {
        let sql = format!("SELECT {TITLE_COLUMNS} FROM titles WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], Title::from_row)
            .optional()?
            .ok_or(CoreError::TitleNotFound(id))
    }

    /// All titles in creation order, optionally filtered by status.
    pub fn list_titles(&self, status: Option<TitleStatus>) -> CoreResult<Vec<Title>> {
        let sql = format!(
            "SELECT {TITLE_COLUMNS} FROM titles WHERE (?1 IS NULL OR status = ?1) ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let titles = stmt
            .query_map(params![status], Title::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(titles)
    }

    /// History of one title in the order it was written.
    pub fn history_for(&self, title_id: i64) -> CoreResult<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title_id, message, severity, created_at FROM history
             WHERE title_id = ?1 ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![title_id], HistoryEntry::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Number of titles per status, including statuses with no titles.
    pub fn status_counts(&self) -> CoreResult<Vec<(TitleStatus, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, COUNT(t.id) FROM statuses s
             LEFT JOIN titles t ON t.status = s.id
             GROUP BY s.id ORDER BY s.id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(code, count)| {
                TitleStatus::from_code(code).map(|status| (status, count.max(0) as u64))
            })
            .collect())
    }
}

fn apply(
    title: &mut Title,
    status: TitleStatus,
    output_file: Option<&str>,
    now: chrono::DateTime<Utc>,
) {
    title.status = status;
    if let Some(file) = output_file {
        title.output_file = Some(file.to_string());
    }
    title.updated_at = now;
}
