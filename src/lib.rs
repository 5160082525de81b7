//! course-search: crawl, index and search course content
//!
//! This crate crawls the seed pages of an online course while respecting
//! robots.txt, extracts visible text and outbound links from the HTML, keeps a
//! per-course full-text index, and answers search queries through
//! framework-agnostic web handlers.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod index;
pub mod robots;
pub mod storage;
pub mod tasks;
pub mod url;
pub mod web;

use thiserror::Error;

/// Main error type for course-search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("URL is not parseable: {url} ({reason})")]
    NotParseable { url: String, reason: String },

    #[error("Malformed query '{query}': {message}")]
    MalformedQuery { query: String, message: String },

    #[error("Search module is disabled")]
    ModuleDisabled,

    #[error("Unknown course: {0}")]
    CourseNotFound(String),

    #[error("Index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for course-search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ExtractedPage, HtmlExtractor};
pub use index::{Document, IndexManager, QueryService, SearchHit, SearchOutcome};
pub use crate::url::{origin_of, resolve};
pub use web::AppState;
