//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{PageRecord, RunRecord, RunStatus};
use crate::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, course_id, started_at, finished_at, config_hash, status, pages_indexed, pages_skipped";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SearchError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        course_id: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
        pages_indexed: row.get(6)?,
        pages_skipped: row.get(7)?,
    })
}

impl Storage for SqliteStorage {
    fn create_run(&mut self, course_id: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (course_id, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![course_id, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn latest_run(&self, course_id: &str) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM runs WHERE course_id = ?1 ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                params![course_id],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn record_page(
        &mut self,
        run_id: i64,
        url: &str,
        outcome: &str,
        detail: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO pages (run_id, url, outcome, detail, recorded_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, url, outcome, detail, now],
        )?;
        Ok(())
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_indexed: u32,
        pages_skipped: u32,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_indexed = ?3, pages_skipped = ?4
             WHERE id = ?5",
            params![status.to_db_string(), now, pages_indexed, pages_skipped, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn pages_for_run(&self, run_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, url, outcome, detail, recorded_at FROM pages WHERE run_id = ?1 ORDER BY id",
        )?;

        let pages = stmt
            .query_map(params![run_id], |row| {
                Ok(PageRecord {
                    run_id: row.get(0)?,
                    url: row.get(1)?,
                    outcome: row.get(2)?,
                    detail: row.get(3)?,
                    recorded_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(pages)
    }
}
