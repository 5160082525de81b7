//! Request parameter decoding

use std::collections::HashMap;

/// Admin action that queues an index task
pub const ACTION_INDEX_COURSE: &str = "index_course";
/// Admin action that queues a clear task
pub const ACTION_CLEAR_INDEX: &str = "clear_index";

/// Decodes an `application/x-www-form-urlencoded` string
///
/// Later occurrences of a key win.
pub fn parse_form(input: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(input.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parameters of `GET /search`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Restricts the search to one course; all courses when absent
    pub course: Option<String>,
}

impl SearchRequest {
    /// Parses `query=...&course=...`
    ///
    /// # Example
    ///
    /// ```
    /// use course_search::web::SearchRequest;
    ///
    /// let request = SearchRequest::from_query_string("query=cogito+ergo%20sum&course=c1");
    /// assert_eq!(request.query, "cogito ergo sum");
    /// assert_eq!(request.course.as_deref(), Some("c1"));
    /// ```
    pub fn from_query_string(query_string: &str) -> Self {
        let params = parse_form(query_string);
        Self {
            query: params.get("query").cloned().unwrap_or_default(),
            course: non_empty(params.get("course")),
        }
    }
}

/// Body of an admin `POST`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminRequest {
    pub action: String,
    pub course: Option<String>,
    pub xsrf_token: Option<String>,
}

impl AdminRequest {
    /// Parses `action=...&course=...&xsrf_token=...`
    pub fn from_form(body: &str) -> Self {
        let params = parse_form(body);
        Self {
            action: params.get("action").cloned().unwrap_or_default(),
            course: non_empty(params.get("course")),
            xsrf_token: non_empty(params.get("xsrf_token")),
        }
    }
}
