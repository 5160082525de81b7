//! Query execution over course indexes

use super::manager::CourseIndex;
use super::{IndexManager, SearchHit, SearchOutcome};
use crate::config::SearchConfig;
use crate::{Result, SearchError};
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::snippet::SnippetGenerator;
use tantivy::TantivyDocument;

/// Answers free-text queries against committed index state
///
/// Queries never wait on writers: they run on the searcher of the last
/// commit.
pub struct QueryService {
    manager: Arc<IndexManager>,
    results_limit: usize,
    snippet_length: usize,
}

impl QueryService {
    pub fn new(manager: Arc<IndexManager>, config: &SearchConfig) -> Self {
        Self {
            manager,
            results_limit: config.results_limit,
            snippet_length: config.snippet_length,
        }
    }

    /// Searches one course
    ///
    /// Any input produces an outcome:
    ///
    /// | Input | Outcome |
    /// |-------|---------|
    /// | blank | `EmptyQuery` |
    /// | punctuation only | `MalformedQuery` |
    /// | unknown course, or no match | `NoResults` |
    /// | query syntax error | `MalformedQuery` |
    /// | otherwise | `Hits`, best first |
    pub fn search(&self, course_id: &str, query_text: &str) -> SearchOutcome {
        let query_text = match searchable(query_text) {
            Ok(query_text) => query_text,
            Err(outcome) => return outcome,
        };

        let Some(course) = self.manager.course(course_id) else {
            tracing::debug!("Query for unknown course {}", course_id);
            return SearchOutcome::NoResults;
        };

        into_outcome(self.run_query(&course, query_text))
    }

    /// Searches every indexed course and merges the hits by score
    pub fn search_all(&self, query_text: &str) -> SearchOutcome {
        let query_text = match searchable(query_text) {
            Ok(query_text) => query_text,
            Err(outcome) => return outcome,
        };

        let mut hits = Vec::new();
        for course_id in self.manager.course_ids() {
            let Some(course) = self.manager.course(&course_id) else {
                continue;
            };
            match self.run_query(&course, query_text) {
                Ok(course_hits) => hits.extend(course_hits),
                Err(e) => return into_outcome(Err(e)),
            }
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.results_limit);
        into_outcome(Ok(hits))
    }

    fn run_query(&self, course: &CourseIndex, query_text: &str) -> Result<Vec<SearchHit>> {
        let fields = course.fields;
        let parser = QueryParser::for_index(&course.index, vec![fields.title, fields.content]);
        let query = parser
            .parse_query(query_text)
            .map_err(|e| SearchError::MalformedQuery {
                query: query_text.to_string(),
                message: e.to_string(),
            })?;

        let searcher = course.reader.searcher();
        let top_docs = searcher.search(query.as_ref(), &TopDocs::with_limit(self.results_limit))?;

        let mut snippets = SnippetGenerator::create(&searcher, query.as_ref(), fields.content)?;
        snippets.set_max_num_chars(self.snippet_length);

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let text = |field: Field| {
                doc.get_first(field)
                    .and_then(|value| value.as_str())
                    .unwrap_or_default()
                    .to_string()
            };

            let snippet = snippets.snippet_from_doc(&doc);
            let snippet = if snippet.is_empty() {
                // Matched on the title only
                text(fields.content)
                    .chars()
                    .take(self.snippet_length)
                    .collect()
            } else {
                snippet.fragment().to_string()
            };

            hits.push(SearchHit {
                url: text(fields.url),
                title: text(fields.title),
                snippet,
                score,
            });
        }

        Ok(hits)
    }
}

/// Trims a query, or returns the outcome for input with nothing to search
fn searchable(query_text: &str) -> std::result::Result<&str, SearchOutcome> {
    let query_text = query_text.trim();
    if query_text.is_empty() {
        return Err(SearchOutcome::EmptyQuery);
    }

    // Bare operators such as `*` would otherwise parse as match-all
    if !query_text.chars().any(char::is_alphanumeric) {
        tracing::info!("Query {:?} has no searchable terms", query_text);
        return Err(SearchOutcome::MalformedQuery {
            message: "query has no searchable terms".to_string(),
        });
    }

    Ok(query_text)
}

fn into_outcome(result: Result<Vec<SearchHit>>) -> SearchOutcome {
    match result {
        Ok(hits) if hits.is_empty() => SearchOutcome::NoResults,
        Ok(hits) => SearchOutcome::Hits(hits),
        Err(SearchError::MalformedQuery { query, message }) => {
            tracing::info!("Malformed query {:?}: {}", query, message);
            SearchOutcome::MalformedQuery { message }
        }
        Err(e) => {
            tracing::error!("Query failed: {}", e);
            SearchOutcome::NoResults
        }
    }
}
