//! URL handling module for course-search
//!
//! This module provides link resolution against a page's base URL, origin
//! and robots.txt derivation, and crawl-scope matching for course hosts.

mod domain;
mod resolve;
mod scope;

pub use domain::{extract_domain, origin_of, robots_url};
pub use resolve::{is_crawlable, parse_crawl_url, resolve, strip_fragment};
pub use scope::{matches_wildcard, CrawlScope};
