//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{PageRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for crawl log backends
pub trait Storage: Send {
    /// Starts a run for a course
    ///
    /// # Arguments
    ///
    /// * `course_id` - Course being indexed
    /// * `config_hash` - Hash of the configuration the run used
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, course_id: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run of a course
    fn latest_run(&self, course_id: &str) -> StorageResult<Option<RunRecord>>;

    /// Records the outcome for one URL of a run
    fn record_page(
        &mut self,
        run_id: i64,
        url: &str,
        outcome: &str,
        detail: Option<&str>,
    ) -> StorageResult<()>;

    /// Finishes a run with its final status and page counts
    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_indexed: u32,
        pages_skipped: u32,
    ) -> StorageResult<()>;

    /// Gets the page entries of a run in recording order
    fn pages_for_run(&self, run_id: i64) -> StorageResult<Vec<PageRecord>>;
}
