//! Minimal HTML fragments for the search page and the admin dashboard

use super::request::{SearchRequest, ACTION_CLEAR_INDEX, ACTION_INDEX_COURSE};
use crate::index::SearchOutcome;
use crate::storage::RunRecord;
use std::fmt::Write;

/// Escapes text for use in HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Dashboard row for one configured course
#[derive(Debug, Clone)]
pub(crate) struct CourseStatus {
    pub id: String,
    pub title: String,
    pub documents: u64,
    pub latest_run: Option<RunRecord>,
    /// Tokens for the index and clear forms; `None` hides the controls
    pub tokens: Option<(String, String)>,
}

pub(crate) fn render_search(request: &SearchRequest, outcome: &SearchOutcome) -> String {
    let mut html = String::from("<div class=\"search\">\n");
    let _ = writeln!(
        html,
        "<form method=\"get\" action=\"/search\"><input type=\"text\" name=\"query\" value=\"{}\">{}<button type=\"submit\">Search</button></form>",
        escape_html(&request.query),
        request
            .course
            .as_deref()
            .map(|course| format!(
                "<input type=\"hidden\" name=\"course\" value=\"{}\">",
                escape_html(course)
            ))
            .unwrap_or_default()
    );

    match outcome {
        SearchOutcome::Hits(hits) => {
            for hit in hits {
                let _ = writeln!(
                    html,
                    "<div class=\"search-result\"><a href=\"{}\">{}</a><p>{}</p></div>",
                    escape_html(&hit.url),
                    escape_html(&hit.title),
                    escape_html(&hit.snippet)
                );
            }
        }
        SearchOutcome::NoResults => info(
            &mut html,
            &format!("No results found for \"{}\".", escape_html(&request.query)),
        ),
        SearchOutcome::MalformedQuery { message } => info(
            &mut html,
            &format!(
                "The query \"{}\" could not be understood: {}",
                escape_html(&request.query),
                escape_html(message)
            ),
        ),
        SearchOutcome::EmptyQuery => info(&mut html, "Enter a query to search course content."),
    }

    html.push_str("</div>\n");
    html
}

fn info(html: &mut String, message: &str) {
    let _ = writeln!(html, "<div class=\"search-info\">{}</div>", message);
}

pub(crate) fn render_dashboard(enabled: bool, courses: &[CourseStatus]) -> String {
    let mut html = String::from("<div class=\"search-admin\">\n<h2>Search</h2>\n");

    if !enabled {
        html.push_str("<p class=\"search-info\">The search module is disabled.</p>\n");
    }

    for course in courses {
        let _ = writeln!(
            html,
            "<div class=\"search-course\"><h3>{}</h3><p>{} document(s) indexed</p>",
            escape_html(if course.title.is_empty() {
                &course.id
            } else {
                &course.title
            }),
            course.documents
        );

        match &course.latest_run {
            Some(run) => {
                let _ = writeln!(
                    html,
                    "<p class=\"search-run\">Last run {}: {} ({} indexed, {} skipped)</p>",
                    escape_html(&run.started_at),
                    run.status.to_db_string(),
                    run.pages_indexed,
                    run.pages_skipped
                );
            }
            None => html.push_str("<p class=\"search-run\">Never indexed</p>\n"),
        }

        if let Some((index_token, clear_token)) = &course.tokens {
            action_form(&mut html, ACTION_INDEX_COURSE, &course.id, index_token, "Index Course");
            action_form(&mut html, ACTION_CLEAR_INDEX, &course.id, clear_token, "Clear Index");
        }

        html.push_str("</div>\n");
    }

    html.push_str("</div>\n");
    html
}

fn action_form(html: &mut String, action: &str, course_id: &str, token: &str, label: &str) {
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"/admin/search\">\
         <input type=\"hidden\" name=\"action\" value=\"{}\">\
         <input type=\"hidden\" name=\"course\" value=\"{}\">\
         <input type=\"hidden\" name=\"xsrf_token\" value=\"{}\">\
         <button type=\"submit\">{}</button></form>",
        action,
        escape_html(course_id),
        escape_html(token),
        label
    );
}
