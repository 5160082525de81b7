//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files, and the [`RobotsPolicy`] capability the crawler and the
//! extractor consult before touching a page.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;

use crate::crawler::{FetchResult, Fetcher};
use crate::url::{origin_of, robots_url};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Ceiling applied before converting a Crawl-delay to a `Duration`
const MAX_CRAWL_DELAY_SECS: f64 = 86_400.0;

/// Answers whether a URL may be crawled
///
/// Implementations never fail: anything that prevents a decision degrades
/// to "allowed".
#[async_trait]
pub trait RobotsPolicy: Send + Sync {
    /// Checks a URL against the policy of its origin
    async fn is_allowed(&self, url: &Url, user_agent: &str) -> bool;

    /// Requested delay between requests to the URL's origin
    async fn crawl_delay(&self, _url: &Url, _user_agent: &str) -> Option<Duration> {
        None
    }
}

/// Fetches robots.txt for the origin of `url`
///
/// Any failure (missing file, non-2xx, unreachable host) yields an
/// allow-all policy.
pub async fn fetch_robots(fetcher: &dyn Fetcher, url: &Url) -> ParsedRobots {
    let Some(robots_location) = robots_url(url) else {
        return ParsedRobots::allow_all();
    };

    match fetcher.fetch(&robots_location).await {
        FetchResult::Success { body, .. } => ParsedRobots::from_content(&body),
        failure => {
            tracing::debug!(
                "No usable robots.txt at {} ({}), allowing all",
                robots_location,
                failure.failure_reason().unwrap_or_default()
            );
            ParsedRobots::allow_all()
        }
    }
}

/// [`RobotsPolicy`] that fetches robots.txt through a [`Fetcher`] and caches
/// the parsed policy per origin for the lifetime of the checker
pub struct RobotsChecker {
    fetcher: Arc<dyn Fetcher>,
    cache: Mutex<RobotsCache>,
}

impl RobotsChecker {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(RobotsCache::new()),
        }
    }

    /// Returns the policy for the URL's origin, fetching it on first use
    pub async fn policy_for(&self, url: &Url) -> ParsedRobots {
        let origin = origin_of(url);

        if let Some(cached) = self.lock_cache().get(&origin) {
            tracing::trace!("Using cached robots.txt for {}", origin);
            return cached.clone();
        }

        tracing::debug!("Fetching robots.txt for {}", origin);
        let robots = fetch_robots(self.fetcher.as_ref(), url).await;
        self.lock_cache().insert(&origin, robots)
    }

    /// Number of origins with a cached policy
    pub fn cached_origins(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, RobotsCache> {
        // The cache holds plain data, so a poisoned lock is still consistent
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RobotsPolicy for RobotsChecker {
    async fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        self.policy_for(url).await.is_allowed(url.as_str(), user_agent)
    }

    async fn crawl_delay(&self, url: &Url, user_agent: &str) -> Option<Duration> {
        self.policy_for(url)
            .await
            .crawl_delay(user_agent)
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(|secs| Duration::from_secs_f64(secs.min(MAX_CRAWL_DELAY_SECS)))
    }
}
