// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run log — append-only SQLite record of every redaction run.
//
// Only fingerprints and counts are stored. No original or redacted text, no
// sensitive substrings and no image data ever reach the database.
//
// Schema:
//   redaction_runs(
//     id            INTEGER PRIMARY KEY AUTOINCREMENT,
//     run_id        TEXT    NOT NULL UNIQUE,
//     timestamp     TEXT    NOT NULL,   -- RFC 3339
//     source        TEXT    NOT NULL,   -- "text", "image", "pdf"
//     document_hash TEXT    NOT NULL,   -- SHA-256 hex digest of the input
//     markers       INTEGER NOT NULL,   -- text markers written
//     regions       INTEGER NOT NULL,   -- image regions painted
//     visual_status TEXT    NOT NULL,
//     degraded      TEXT    NOT NULL    -- JSON array of skipped components
//   )

use std::path::Path;

use chrono::Utc;
use medicloak_core::error::{MedicloakError, Result};
use medicloak_core::types::RunId;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS redaction_runs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id        TEXT    NOT NULL UNIQUE,
    timestamp     TEXT    NOT NULL,
    source        TEXT    NOT NULL,
    document_hash TEXT    NOT NULL,
    markers       INTEGER NOT NULL,
    regions       INTEGER NOT NULL,
    visual_status TEXT    NOT NULL,
    degraded      TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS redaction_runs_hash ON redaction_runs (document_hash);";

const COLUMNS: &str =
    "id, run_id, timestamp, source, document_hash, markers, regions, visual_status, degraded";

fn db_err(e: rusqlite::Error) -> MedicloakError {
    MedicloakError::Database(e.to_string())
}

/// What one run contributes to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub run_id: RunId,
    pub source: String,
    pub document_hash: String,
    pub markers: usize,
    pub regions: usize,
    pub visual_status: String,
    pub degraded: Vec<String>,
}

/// A stored run, as returned by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub run_id: String,
    pub timestamp: String,
    pub source: String,
    pub document_hash: String,
    pub markers: u64,
    pub regions: u64,
    pub visual_status: String,
    pub degraded: Vec<String>,
}

impl AuditEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let degraded: String = row.get(8)?;
        Ok(Self {
            id: row.get(0)?,
            run_id: row.get(1)?,
            timestamp: row.get(2)?,
            source: row.get(3)?,
            document_hash: row.get(4)?,
            markers: row.get(5)?,
            regions: row.get(6)?,
            visual_status: row.get(7)?,
            // A malformed list only loses the detail, not the entry.
            degraded: serde_json::from_str(&degraded).unwrap_or_default(),
        })
    }
}

/// Append-only run log backed by a SQLite database.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the log at `path`, with WAL enabled.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;").map_err(db_err)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(db_err)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        debug!("audit log opened");
        Ok(Self { conn })
    }

    /// Append one run. Recording the same run twice is an error.
    #[instrument(skip_all, fields(run_id = %record.run_id, source = %record.source))]
    pub fn record(&self, record: &RunRecord) -> Result<i64> {
        let degraded = serde_json::to_string(&record.degraded)?;
        self.conn
            .execute(
                "INSERT INTO redaction_runs
                    (run_id, timestamp, source, document_hash, markers, regions, visual_status, degraded)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.run_id.to_string(),
                    Utc::now().to_rfc3339(),
                    record.source,
                    record.document_hash,
                    record.markers as i64,
                    record.regions as i64,
                    record.visual_status,
                    degraded,
                ],
            )
            .map_err(db_err)?;
        let id = self.conn.last_insert_rowid();
        debug!(id, markers = record.markers, regions = record.regions, "run recorded");
        Ok(id)
    }

    /// Every run of the document with this fingerprint, oldest first.
    pub fn entries_for_hash(&self, document_hash: &str) -> Result<Vec<AuditEntry>> {
        self.query(
            &format!("SELECT {COLUMNS} FROM redaction_runs WHERE document_hash = ?1 ORDER BY id ASC"),
            params![document_hash],
        )
    }

    /// The most recent `limit` runs, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditEntry>> {
        self.query(
            &format!("SELECT {COLUMNS} FROM redaction_runs ORDER BY id DESC LIMIT ?1"),
            params![limit],
        )
    }

    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM redaction_runs", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(sql).map_err(db_err)?;
        let rows = stmt.query_map(params, AuditEntry::from_row).map_err(db_err)?;
        rows.map(|row| row.map_err(db_err)).collect()
    }
}
