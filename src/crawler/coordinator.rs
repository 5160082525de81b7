//! Crawl coordination for a single course
//!
//! A crawl session walks the course seeds and, when the configured link depth
//! allows it, the first-degree links found on them:
//! - robots.txt is consulted before every fetch
//! - pages that cannot be fetched or parsed are skipped and recorded
//! - only http(s) links inside the course scope join the frontier
//! - Crawl-delay is honoured per origin, capped by configuration

use crate::config::{Config, CourseEntry, CrawlerConfig};
use crate::crawler::{Fetcher, HttpFetcher};
use crate::extract::fetch_and_extract;
use crate::index::Document;
use crate::robots::{RobotsChecker, RobotsPolicy};
use crate::url::{is_crawlable, origin_of, parse_crawl_url, strip_fragment, CrawlScope};
use crate::{Result, SearchError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// What happened to one URL during a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Fetched, parsed and turned into a document
    Indexed,
    /// Disallowed by robots.txt
    RobotsDenied,
    /// Transport failure or non-2xx status
    FetchFailed(String),
    /// Response was not HTML
    NotHtml(String),
    /// Link points outside the course's allowed domains
    OutOfScope,
}

impl PageOutcome {
    /// Short label stored in the crawl log
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indexed => "indexed",
            Self::RobotsDenied => "robots_denied",
            Self::FetchFailed(_) => "fetch_failed",
            Self::NotHtml(_) => "not_html",
            Self::OutOfScope => "out_of_scope",
        }
    }

    /// Failure detail, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::FetchFailed(detail) | Self::NotHtml(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed)
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{} ({})", self.as_str(), detail),
            None => f.write_str(self.as_str()),
        }
    }
}

/// Result of one crawl session
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Course the crawl ran for
    pub course_id: String,
    /// Documents ready for the index, in crawl order
    pub documents: Vec<Document>,
    /// Outcome for every URL the crawler considered
    pub outcomes: Vec<(String, PageOutcome)>,
}

impl CrawlReport {
    pub fn indexed_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_indexed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.indexed_count()
    }

    fn record(&mut self, url: &str, outcome: PageOutcome) {
        self.outcomes.push((url.to_string(), outcome));
    }
}

/// A URL waiting to be fetched
#[derive(Debug, Clone)]
struct QueuedUrl {
    url: Url,
    depth: u32,
}

/// Crawls course pages into documents
///
/// The fetcher and robots policy are injected so tests can run the crawler
/// against fixtures.
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    robots: Arc<dyn RobotsPolicy>,
    config: CrawlerConfig,
    user_agent: String,
}

impl Crawler {
    /// Creates a crawler from its collaborators
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Transport for page requests
    /// * `robots` - Policy consulted before each fetch
    /// * `config` - Depth, page cap and delay settings
    /// * `user_agent` - Product token matched against robots.txt groups
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        robots: Arc<dyn RobotsPolicy>,
        config: CrawlerConfig,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            robots,
            config,
            user_agent: user_agent.into(),
        }
    }

    /// Creates a crawler that talks HTTP with a fresh robots cache
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> =
            Arc::new(HttpFetcher::new(&config.user_agent, &config.crawler)?);
        let robots = Arc::new(RobotsChecker::new(fetcher.clone()));

        Ok(Self::new(
            fetcher,
            robots,
            config.crawler.clone(),
            config.user_agent.crawler_name.clone(),
        ))
    }

    /// Crawls one course
    ///
    /// Never fails as a whole: every problem is attached to the URL that
    /// caused it in the returned report.
    pub async fn crawl(&self, course: &CourseEntry) -> CrawlReport {
        let scope = CrawlScope::for_course(course);
        let mut report = CrawlReport {
            course_id: course.id.clone(),
            ..CrawlReport::default()
        };
        let mut frontier = VecDeque::new();
        let mut visited = HashSet::new();
        let mut last_request: HashMap<String, Instant> = HashMap::new();

        for seed in &course.seeds {
            match parse_crawl_url(seed) {
                Ok(url) => {
                    let url = strip_fragment(&url);
                    if visited.insert(url.to_string()) {
                        frontier.push_back(QueuedUrl { url, depth: 0 });
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping seed {}: {}", seed, e);
                    report.record(seed, PageOutcome::FetchFailed(e.to_string()));
                }
            }
        }

        tracing::info!(
            "Crawling course {} from {} seed(s)",
            course.id,
            frontier.len()
        );

        let mut fetched = 0u32;
        while let Some(queued) = frontier.pop_front() {
            if fetched >= self.config.max_pages {
                tracing::info!(
                    "Page limit of {} reached for course {}, {} URL(s) left unvisited",
                    self.config.max_pages,
                    course.id,
                    frontier.len() + 1
                );
                break;
            }

            let url = queued.url;
            tracing::debug!("Processing {} (depth {})", url, queued.depth);

            if !self.robots.is_allowed(&url, &self.user_agent).await {
                tracing::warn!("Skipping {}: disallowed by robots.txt", url);
                report.record(url.as_str(), PageOutcome::RobotsDenied);
                continue;
            }

            self.wait_for_origin(&url, &mut last_request).await;
            fetched += 1;

            let page = match fetch_and_extract(self.fetcher.as_ref(), &url).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", url, e);
                    report.record(url.as_str(), skip_outcome(e));
                    continue;
                }
            };

            if queued.depth < self.config.link_depth {
                for link in &page.links {
                    let Ok(target) = Url::parse(link) else {
                        continue;
                    };
                    if !is_crawlable(&target) {
                        continue;
                    }
                    let target = strip_fragment(&target);
                    if !visited.insert(target.to_string()) {
                        continue;
                    }
                    if !scope.contains(&target) {
                        tracing::debug!("Not following {}: outside course scope", target);
                        report.record(target.as_str(), PageOutcome::OutOfScope);
                        continue;
                    }
                    frontier.push_back(QueuedUrl {
                        url: target,
                        depth: queued.depth + 1,
                    });
                }
            }

            let title = page.title.unwrap_or_else(|| url.to_string());
            report
                .documents
                .push(Document::new(&course.id, url.as_str(), title, page.content));
            report.record(url.as_str(), PageOutcome::Indexed);
        }

        tracing::info!(
            "Crawl of course {} finished: {} indexed, {} skipped",
            course.id,
            report.indexed_count(),
            report.skipped_count()
        );

        report
    }

    /// Sleeps until the origin's Crawl-delay has passed since its last request
    async fn wait_for_origin(&self, url: &Url, last_request: &mut HashMap<String, Instant>) {
        let origin = origin_of(url);
        let cap = Duration::from_millis(self.config.max_crawl_delay_ms);

        if let Some(delay) = self.robots.crawl_delay(url, &self.user_agent).await {
            let delay = delay.min(cap);
            if let Some(previous) = last_request.get(&origin) {
                let elapsed = previous.elapsed();
                if elapsed < delay {
                    tracing::trace!("Waiting {:?} before next request to {}", delay - elapsed, origin);
                    tokio::time::sleep(delay - elapsed).await;
                }
            }
        }

        last_request.insert(origin, Instant::now());
    }
}

fn skip_outcome(error: SearchError) -> PageOutcome {
    match error {
        SearchError::RobotsDenied { .. } => PageOutcome::RobotsDenied,
        SearchError::FetchFailed { reason, .. } => PageOutcome::FetchFailed(reason),
        SearchError::NotParseable { reason, .. } => PageOutcome::NotHtml(reason),
        other => PageOutcome::FetchFailed(other.to_string()),
    }
}
