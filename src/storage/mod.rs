//! Crawl log storage
//!
//! This module records what each index run did:
//! - SQLite database initialization and schema management
//! - One run row per index task, with status and page counts
//! - One page row per URL the crawler considered
//!
//! The dashboard shows the latest run of a course from here.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::Result;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Storage shared between the task worker and the web handlers
pub type SharedStorage = Arc<Mutex<dyn Storage>>;

/// Path value that selects an in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Opens the crawl log named in configuration
///
/// # Arguments
///
/// * `database_path` - Path to the SQLite file, or `:memory:`
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SearchError)` - Failed to open or initialize the database
pub fn open_storage(database_path: &str) -> Result<SqliteStorage> {
    if database_path == IN_MEMORY {
        SqliteStorage::new_in_memory()
    } else {
        SqliteStorage::new(Path::new(database_path))
    }
}

/// Wraps storage for sharing across tasks
pub fn shared(storage: impl Storage + 'static) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// One URL's entry in the crawl log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub run_id: i64,
    pub url: String,
    /// Outcome label, e.g. `indexed` or `robots_denied`
    pub outcome: String,
    pub detail: Option<String>,
    pub recorded_at: String,
}

/// Represents an index run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub course_id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub pages_indexed: u32,
    pub pages_skipped: u32,
}

/// Status of an index run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    /// The index was cleared while the crawl ran; nothing was written
    Discarded,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Discarded => "discarded",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "discarded" => Some(Self::Discarded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
