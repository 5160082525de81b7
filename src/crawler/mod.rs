//! Crawler module for course page fetching
//!
//! This module contains the crawling side of the pipeline:
//! - HTTP fetching behind the [`Fetcher`] capability
//! - Per-course crawl sessions limited to first-degree links
//! - Per-URL outcome reporting

mod coordinator;
mod fetcher;

pub use coordinator::{CrawlReport, Crawler, PageOutcome};
pub use fetcher::{
    build_http_client, fetch_url, is_html_content_type, FetchResult, Fetcher, HttpFetcher,
};

use crate::config::Config;
use crate::Result;

/// Crawls one configured course over HTTP
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `course_id` - Identifier of a `[[course]]` entry
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Documents and per-URL outcomes
/// * `Err(SearchError::CourseNotFound)` - No such course in the configuration
pub async fn crawl_course(config: &Config, course_id: &str) -> Result<CrawlReport> {
    let course = config
        .course(course_id)
        .ok_or_else(|| crate::SearchError::CourseNotFound(course_id.to_string()))?;

    let crawler = Crawler::from_config(config)?;
    Ok(crawler.crawl(course).await)
}
