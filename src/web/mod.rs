//! Web-facing surface of the search module
//!
//! This module exposes framework-agnostic pieces an application mounts on
//! its own routes:
//! - [`handle_search`] for `GET /search`
//! - [`handle_dashboard`] and [`handle_admin_action`] for the admin page
//! - [`SearchModule`] enable/disable state and [`XsrfTokens`]
//!
//! All shared state lives in an explicit [`AppState`].

mod handlers;
mod module;
mod render;
mod request;
mod xsrf;

pub use handlers::{handle_admin_action, handle_dashboard, handle_search};
pub use module::SearchModule;
pub use render::escape_html;
pub use request::{parse_form, AdminRequest, SearchRequest, ACTION_CLEAR_INDEX, ACTION_INDEX_COURSE};
pub use xsrf::XsrfTokens;

use crate::config::Config;
use crate::index::{IndexManager, QueryService};
use crate::storage::{open_storage, shared, SharedStorage};
use crate::tasks::{TaskContext, TaskQueue};
use crate::Result;
use std::sync::Arc;

/// The authenticated user making a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub is_admin: bool,
}

impl Session {
    pub fn admin(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            is_admin: true,
        }
    }

    pub fn user(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            is_admin: false,
        }
    }
}

/// A handler's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    const HTML: &'static str = "text/html; charset=utf-8";

    pub fn ok(body: String) -> Self {
        Self {
            status: 200,
            content_type: Self::HTML,
            body,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::error(400, message)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::error(403, message)
    }

    pub fn not_found() -> Self {
        Self::error(404, "Not found")
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: Self::HTML,
            body: format!("<p class=\"error\">{}</p>\n", escape_html(message)),
        }
    }
}

/// Everything the handlers share
pub struct AppState {
    pub config: Arc<Config>,
    pub module: SearchModule,
    pub xsrf: XsrfTokens,
    pub index: Arc<IndexManager>,
    pub queries: QueryService,
    pub tasks: Arc<TaskQueue>,
    pub storage: SharedStorage,
}

impl AppState {
    /// Builds the state from configuration, opening the configured crawl log
    pub fn from_config(config: Config, config_hash: String) -> Result<Self> {
        let storage = shared(open_storage(&config.storage.database_path)?);
        let config = Arc::new(config);
        let index = Arc::new(IndexManager::new(&config.search));
        let context = TaskContext::new(config, config_hash, index, storage);
        Ok(Self::with_context(context))
    }

    /// Builds the state around an existing task context
    pub fn with_context(context: TaskContext) -> Self {
        let config = context.config.clone();
        Self {
            module: SearchModule::new(config.module.enabled),
            xsrf: XsrfTokens::new(
                config.module.xsrf_secret.clone(),
                config.module.xsrf_max_age_secs,
            ),
            queries: QueryService::new(context.index.clone(), &config.search),
            index: context.index.clone(),
            storage: context.storage.clone(),
            tasks: TaskQueue::new(context),
            config,
        }
    }
}
