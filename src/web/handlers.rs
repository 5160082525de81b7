//! Request handlers
//!
//! Handlers take already-routed input and return a [`Response`]; wiring them
//! to an HTTP server is left to the embedding application.
//!
//! | Handler | Disabled | Not admin | Bad token | Unknown action | OK |
//! |---------|----------|-----------|-----------|----------------|----|
//! | [`handle_search`] | 404 | - | - | - | 200 |
//! | [`handle_dashboard`] | 200, no controls | 403 | - | - | 200 |
//! | [`handle_admin_action`] | 404 | 403 | 403 | 400 | 200 |

use super::render::{escape_html, render_dashboard, render_search, CourseStatus};
use super::request::{AdminRequest, SearchRequest, ACTION_CLEAR_INDEX, ACTION_INDEX_COURSE};
use super::{AppState, Response, Session};
use crate::storage::RunRecord;
use crate::tasks::Task;
use crate::{Result, SearchError};

/// `GET /search?query=...[&course=...]`
///
/// Malformed and empty queries still answer 200 with an informational
/// fragment.
pub fn handle_search(state: &AppState, query_string: &str) -> Response {
    if let Err(e) = require_enabled(state) {
        tracing::debug!("Rejecting search: {}", e);
        return Response::not_found();
    }

    let request = SearchRequest::from_query_string(query_string);
    tracing::debug!("Search {:?} in {:?}", request.query, request.course);

    let outcome = match &request.course {
        Some(course_id) => state.queries.search(course_id, &request.query),
        None => state.queries.search_all(&request.query),
    };

    Response::ok(render_search(&request, &outcome))
}

/// Admin dashboard fragment
///
/// Shows every configured course with its document count and last run;
/// the index and clear controls only appear while the module is enabled.
pub fn handle_dashboard(state: &AppState, session: &Session) -> Response {
    if !session.is_admin {
        return Response::forbidden("Admin access required");
    }

    let enabled = state.module.is_enabled();
    let courses: Vec<CourseStatus> = state
        .config
        .courses
        .iter()
        .map(|course| CourseStatus {
            id: course.id.clone(),
            title: course.title.clone(),
            documents: state.index.document_count(&course.id),
            latest_run: latest_run(state, &course.id),
            tokens: enabled.then(|| {
                (
                    state.xsrf.issue(&session.email, ACTION_INDEX_COURSE),
                    state.xsrf.issue(&session.email, ACTION_CLEAR_INDEX),
                )
            }),
        })
        .collect();

    Response::ok(render_dashboard(enabled, &courses))
}

/// Admin `POST` with `action`, `course` and `xsrf_token` form fields
///
/// Validated actions are queued; the response never waits for the crawl.
pub fn handle_admin_action(state: &AppState, session: &Session, form: &str) -> Response {
    if let Err(e) = require_enabled(state) {
        tracing::debug!("Rejecting admin action: {}", e);
        return Response::not_found();
    }
    if !session.is_admin {
        return Response::forbidden("Admin access required");
    }

    let request = AdminRequest::from_form(form);
    if request.action != ACTION_INDEX_COURSE && request.action != ACTION_CLEAR_INDEX {
        return Response::bad_request(&format!("Unknown action: {}", request.action));
    }

    let token_ok = request
        .xsrf_token
        .as_deref()
        .is_some_and(|token| state.xsrf.validate(token, &session.email, &request.action));
    if !token_ok {
        tracing::warn!(
            "Rejected {} from {}: missing or invalid XSRF token",
            request.action,
            session.email
        );
        return Response::forbidden("Invalid or expired XSRF token");
    }

    let Some(course_id) = request
        .course
        .filter(|id| state.config.course(id).is_some())
    else {
        return Response::bad_request("Unknown course");
    };

    let (task, message) = if request.action == ACTION_INDEX_COURSE {
        (
            Task::IndexCourse(course_id.clone()),
            "Indexing has been queued",
        )
    } else {
        (Task::ClearIndex(course_id.clone()), "Clearing has been queued")
    };
    state.tasks.enqueue(task);

    Response::ok(format!(
        "<div class=\"search-info\">{} for course {}.</div>\n",
        message,
        escape_html(&course_id)
    ))
}

fn require_enabled(state: &AppState) -> Result<()> {
    if state.module.is_enabled() {
        Ok(())
    } else {
        Err(SearchError::ModuleDisabled)
    }
}

fn latest_run(state: &AppState, course_id: &str) -> Option<RunRecord> {
    let storage = state
        .storage
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    match storage.latest_run(course_id) {
        Ok(run) => run,
        Err(e) => {
            tracing::error!("Failed to load last run of course {}: {}", course_id, e);
            None
        }
    }
}
