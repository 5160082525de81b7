//! Deferred index work
//!
//! Admin actions never crawl inline: they enqueue a [`Task`] and return. A
//! single worker drains the queue in FIFO order, so a clear enqueued after an
//! index task always runs after it. Index generations cover the remaining
//! case of a clear landing while a crawl is in flight.

use crate::config::Config;
use crate::crawler::{CrawlReport, Crawler};
use crate::index::IndexManager;
use crate::storage::{RunStatus, SharedStorage, Storage};
use crate::{Result, SearchError};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Builds a crawler for one index task
///
/// Each task gets a fresh crawler so robots.txt is re-fetched per session.
pub type CrawlerFactory = Arc<dyn Fn() -> Result<Crawler> + Send + Sync>;

/// A unit of deferred work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Crawl a course and index what was found
    IndexCourse(String),
    /// Remove every document of a course
    ClearIndex(String),
}

impl Task {
    pub fn course_id(&self) -> &str {
        match self {
            Self::IndexCourse(id) | Self::ClearIndex(id) => id,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexCourse(id) => write!(f, "index course {}", id),
            Self::ClearIndex(id) => write!(f, "clear index of course {}", id),
        }
    }
}

/// What tasks need to run
#[derive(Clone)]
pub struct TaskContext {
    pub config: Arc<Config>,
    /// Recorded with every run
    pub config_hash: String,
    pub index: Arc<IndexManager>,
    pub storage: SharedStorage,
    pub crawler: CrawlerFactory,
}

impl TaskContext {
    /// Context whose crawlers talk HTTP as configured
    pub fn new(
        config: Arc<Config>,
        config_hash: String,
        index: Arc<IndexManager>,
        storage: SharedStorage,
    ) -> Self {
        let crawler_config = config.clone();
        Self {
            config,
            config_hash,
            index,
            storage,
            crawler: Arc::new(move || Crawler::from_config(&crawler_config)),
        }
    }

    /// Replaces the crawler factory
    pub fn with_crawler(mut self, crawler: CrawlerFactory) -> Self {
        self.crawler = crawler;
        self
    }

    fn lock_storage(&self) -> MutexGuard<'_, dyn Storage + 'static> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// FIFO queue of deferred tasks
pub struct TaskQueue {
    pending: Mutex<VecDeque<Task>>,
    notify: Notify,
    /// Held while tasks execute so only one drain runs at a time
    running: tokio::sync::Mutex<()>,
    context: TaskContext,
}

impl TaskQueue {
    pub fn new(context: TaskContext) -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            running: tokio::sync::Mutex::new(()),
            context,
        })
    }

    /// Adds a task and returns immediately
    pub fn enqueue(&self, task: Task) {
        tracing::info!("Queued task: {}", task);
        self.lock_pending().push_back(task);
        self.notify.notify_one();
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.lock_pending().len()
    }

    /// Runs queued tasks in order until the queue is empty
    ///
    /// Task failures are logged and do not stop the drain.
    ///
    /// # Returns
    ///
    /// The number of tasks executed
    pub async fn run_pending(&self) -> usize {
        let _running = self.running.lock().await;
        let mut executed = 0;

        loop {
            let next = self.lock_pending().pop_front();
            let Some(task) = next else {
                break;
            };
            executed += 1;

            if let Err(e) = self.execute(&task).await {
                tracing::error!("Task failed ({}): {}", task, e);
            }
        }

        executed
    }

    /// Starts the background worker
    pub fn spawn_worker(self: &Arc<Self>) -> JoinHandle<()> {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tracing::debug!("Task worker started");
            loop {
                queue.run_pending().await;
                queue.notify.notified().await;
            }
        })
    }

    async fn execute(&self, task: &Task) -> Result<()> {
        match task {
            Task::IndexCourse(course_id) => self.index_course(course_id).await,
            Task::ClearIndex(course_id) => self.context.index.clear(course_id),
        }
    }

    async fn index_course(&self, course_id: &str) -> Result<()> {
        let context = &self.context;
        let course = context
            .config
            .course(course_id)
            .ok_or_else(|| SearchError::CourseNotFound(course_id.to_string()))?;

        let generation = context.index.generation(course_id);
        let run_id = context
            .lock_storage()
            .create_run(course_id, &context.config_hash)?;

        let report = match (context.crawler)() {
            Ok(crawler) => crawler.crawl(course).await,
            Err(e) => {
                self.finish_run(run_id, RunStatus::Failed, &CrawlReport::default())?;
                return Err(e);
            }
        };

        {
            let mut storage = context.lock_storage();
            for (url, outcome) in &report.outcomes {
                storage.record_page(run_id, url, outcome.as_str(), outcome.detail())?;
            }
        }

        let status = match context
            .index
            .index_at_generation(course_id, generation, &report.documents)
        {
            Ok(true) => RunStatus::Completed,
            Ok(false) => RunStatus::Discarded,
            Err(e) => {
                self.finish_run(run_id, RunStatus::Failed, &report)?;
                return Err(e);
            }
        };

        self.finish_run(run_id, status, &report)
    }

    fn finish_run(&self, run_id: i64, status: RunStatus, report: &CrawlReport) -> Result<()> {
        self.context.lock_storage().complete_run(
            run_id,
            status,
            report.indexed_count() as u32,
            report.skipped_count() as u32,
        )?;
        Ok(())
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<Task>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
