//! Per-session robots.txt cache
//!
//! Policies are keyed by origin, fetched lazily on the first check for that
//! origin, and never refreshed during a session. A new crawl session starts
//! with an empty cache.

use crate::robots::ParsedRobots;
use std::collections::HashMap;

/// Origin → policy map for one crawl session
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, ParsedRobots>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached policy for an origin
    pub fn get(&self, origin: &str) -> Option<&ParsedRobots> {
        self.entries.get(origin)
    }

    /// Stores the policy for an origin unless one is already cached
    ///
    /// Returns the policy that ends up cached; policies are never replaced
    /// within a session.
    pub fn insert(&mut self, origin: &str, robots: ParsedRobots) -> ParsedRobots {
        self.entries
            .entry(origin.to_string())
            .or_insert(robots)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
