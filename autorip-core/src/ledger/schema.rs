// ============================================================================
// autorip-core/src/ledger/schema.rs
// ============================================================================
//
// LEDGER SCHEMA: Table Layout for the Title Ledger
//
// The tables below are the durable contract other tools (dashboards, manual
// SQL) read. Status and severity are stored as integer codes; the `statuses`
// table maps codes to names for humans.
//
// AI-ASSISTANT-INFO: SQLite schema and migration for the ledger

use rusqlite::{Connection, params};

use crate::status::TitleStatus;

/// Schema version recorded in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS statuses (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS titles (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    source_path    TEXT NOT NULL UNIQUE,
    status         INTEGER NOT NULL REFERENCES statuses(id),
    output_file    TEXT,
    extras_enabled INTEGER NOT NULL,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS titles_status_idx ON titles(status);

CREATE TABLE IF NOT EXISTS history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    title_id   INTEGER NOT NULL,
    message    TEXT NOT NULL,
    severity   INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS history_title_idx ON history(title_id);

CREATE TRIGGER IF NOT EXISTS history_no_update
BEFORE UPDATE ON history
BEGIN
    SELECT RAISE(ABORT, 'history entries are append-only');
END;

CREATE TRIGGER IF NOT EXISTS history_no_delete
BEFORE DELETE ON history
BEGIN
    SELECT RAISE(ABORT, 'history entries are append-only');
END;
"#;

/// Creates missing tables and seeds the status lookup. Idempotent.
pub(crate) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;

    let mut seed = conn.prepare("INSERT OR IGNORE INTO statuses (id, name) VALUES (?1, ?2)")?;
    for status in TitleStatus::ALL {
        seed.execute(params![status.code(), status.name()])?;
    }

    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}
