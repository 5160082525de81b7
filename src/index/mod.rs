//! Per-course full-text index
//!
//! Each course gets its own tantivy index holding at most one document per
//! URL. [`IndexManager`] owns the writers, [`QueryService`] reads committed
//! state and turns every query, well-formed or not, into a [`SearchOutcome`].

mod manager;
mod query;
mod schema;

pub use manager::IndexManager;
pub use query::QueryService;

use chrono::{DateTime, Utc};

/// A crawled page ready for indexing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Absolute URL, the document's key within its course
    pub url: String,
    pub title: String,
    /// Visible text of the page
    pub content: String,
    pub course_id: String,
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Creates a document stamped with the current time
    pub fn new(
        course_id: &str,
        url: &str,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            url: url.to_string(),
            title: title.into(),
            content: content.into(),
            course_id: course_id.to_string(),
            indexed_at: Utc::now(),
        }
    }
}

/// One ranked search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    /// Excerpt of the content around the matched terms
    pub snippet: String,
    pub score: f32,
}

/// Result of running a query
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Matches, best first
    Hits(Vec<SearchHit>),
    /// The query was understood but nothing matched
    NoResults,
    /// The query could not be parsed
    MalformedQuery { message: String },
    /// Nothing to search for
    EmptyQuery,
}

impl SearchOutcome {
    /// Hits of the outcome; empty for every informational state
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            Self::Hits(hits) => hits,
            _ => &[],
        }
    }

    pub fn has_hits(&self) -> bool {
        !self.hits().is_empty()
    }
}
