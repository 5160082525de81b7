//! End-to-end tests for the search module
//!
//! These drive the web handlers the way an admin and a student would: the
//! admin queues index/clear tasks from the dashboard, the worker crawls
//! wiremock servers, and queries go through `handle_search`.

mod common;

use common::*;
use course_search::storage::{RunStatus, Storage};
use course_search::web::{
    handle_admin_action, handle_dashboard, handle_search, AppState, Session, ACTION_CLEAR_INDEX,
    ACTION_INDEX_COURSE,
};
use wiremock::MockServer;

const ADMIN: &str = "admin@example.com";

async fn setup() -> (AppState, MockServer, MockServer) {
    let valid = valid_server().await;
    let banned = banned_server().await;
    let config = create_test_config(vec![
        course("valid", vec![format!("{}/", valid.uri())]),
        course("banned", vec![format!("{}/", banned.uri())]),
    ]);
    let state = AppState::from_config(config, "test-hash".to_string())
        .expect("Failed to build app state");
    (state, valid, banned)
}

/// Pulls the XSRF token of an action's form out of the dashboard fragment
fn token_from_dashboard(html: &str, action: &str, course_id: &str) -> Option<String> {
    let form_start = format!(
        "name=\"action\" value=\"{}\"><input type=\"hidden\" name=\"course\" value=\"{}\">",
        action, course_id
    );
    let rest = &html[html.find(&form_start)? + form_start.len()..];
    let marker = "name=\"xsrf_token\" value=\"";
    let rest = &rest[rest.find(marker)? + marker.len()..];
    Some(rest[..rest.find('"')?].to_string())
}

fn admin_action(state: &AppState, action: &str, course_id: &str) -> u16 {
    let admin = Session::admin(ADMIN);
    let dashboard = handle_dashboard(state, &admin);
    let token = token_from_dashboard(&dashboard.body, action, course_id)
        .expect("Dashboard should offer the action");
    let form = format!("action={}&course={}&xsrf_token={}", action, course_id, token);
    handle_admin_action(state, &admin, &form).status
}

fn search(state: &AppState, query: &str) -> (u16, String) {
    let query_string = format!("query={}&course=valid", query.replace(' ', "+"));
    let response = handle_search(state, &query_string);
    (response.status, response.body)
}

#[tokio::test]
async fn test_index_search_and_clear() {
    let (state, _valid, _banned) = setup().await;

    assert_eq!(admin_action(&state, ACTION_INDEX_COURSE, "valid"), 200);
    assert_eq!(state.tasks.run_pending().await, 1);

    let (status, body) = search(&state, "weather");
    assert_eq!(status, 200);
    assert!(!body.contains("search-result"));
    assert!(body.contains("search-info"));

    let (status, body) = search(&state, "cogito ergo sum");
    assert_eq!(status, 200);
    assert!(body.contains("search-result"));
    assert!(body.contains("Test Page"));

    assert_eq!(admin_action(&state, ACTION_CLEAR_INDEX, "valid"), 200);
    state.tasks.run_pending().await;

    let (status, body) = search(&state, "cogito ergo sum");
    assert_eq!(status, 200);
    assert!(!body.contains("search-result"));
}

#[tokio::test]
async fn test_clear_queued_after_index_wins() {
    let (state, _valid, _banned) = setup().await;

    assert_eq!(admin_action(&state, ACTION_INDEX_COURSE, "valid"), 200);
    assert_eq!(admin_action(&state, ACTION_CLEAR_INDEX, "valid"), 200);
    assert_eq!(state.tasks.run_pending().await, 2);

    assert_eq!(state.index.document_count("valid"), 0);
    let (_, body) = search(&state, "cogito ergo sum");
    assert!(!body.contains("search-result"));
}

#[tokio::test]
async fn test_bad_query() {
    let (state, _valid, _banned) = setup().await;
    admin_action(&state, ACTION_INDEX_COURSE, "valid");
    state.tasks.run_pending().await;

    let response = handle_search(&state, "query=%3A&course=valid");
    assert_eq!(response.status, 200);
    assert!(response.body.contains("search-info"));
}

#[tokio::test]
async fn test_banned_course_indexes_nothing() {
    let (state, _valid, _banned) = setup().await;

    assert_eq!(admin_action(&state, ACTION_INDEX_COURSE, "banned"), 200);
    state.tasks.run_pending().await;

    assert_eq!(state.index.document_count("banned"), 0);

    let storage = state.storage.lock().unwrap();
    let run = storage.latest_run("banned").unwrap().expect("Run recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.pages_indexed, 0);
    assert_eq!(run.pages_skipped, 1);

    let pages = storage.pages_for_run(run.id).unwrap();
    assert_eq!(pages[0].outcome, "robots_denied");
}

#[tokio::test]
async fn test_dashboard_shows_last_run() {
    let (state, _valid, _banned) = setup().await;
    admin_action(&state, ACTION_INDEX_COURSE, "valid");
    state.tasks.run_pending().await;

    // The fixture's relative and protocol-relative links lead nowhere
    let body = handle_dashboard(&state, &Session::admin(ADMIN)).body;
    assert!(body.contains("completed (1 indexed, 2 skipped)"));
    assert!(body.contains("1 document(s) indexed"));
}

#[tokio::test]
async fn test_module_disable_and_enable() {
    let (state, _valid, _banned) = setup().await;
    let admin = Session::admin(ADMIN);

    state.module.disable();

    assert_eq!(handle_search(&state, "query=cogito").status, 404);

    let dashboard = handle_dashboard(&state, &admin);
    assert_eq!(dashboard.status, 200);
    assert!(!dashboard.body.contains("Index Course"));
    assert!(!dashboard.body.contains("Clear Index"));

    state.module.enable();

    assert_eq!(handle_search(&state, "query=cogito").status, 200);
    let dashboard = handle_dashboard(&state, &admin);
    assert!(dashboard.body.contains("Index Course"));
    assert!(dashboard.body.contains("Clear Index"));
}

#[tokio::test]
async fn test_index_without_token_fails() {
    let (state, _valid, _banned) = setup().await;
    let admin = Session::admin(ADMIN);

    let response = handle_admin_action(&state, &admin, "action=index_course&course=valid");
    assert_eq!(response.status, 403);

    let response = handle_admin_action(
        &state,
        &admin,
        "action=index_course&course=valid&xsrf_token=1700000000%2Fdeadbeef",
    );
    assert_eq!(response.status, 403);
    assert_eq!(state.tasks.pending(), 0);
}

#[tokio::test]
async fn test_non_admin_cannot_act() {
    let (state, _valid, _banned) = setup().await;
    let student = Session::user("student@example.com");

    assert_eq!(handle_dashboard(&state, &student).status, 403);

    let token = state.xsrf.issue(&student.email, ACTION_INDEX_COURSE);
    let form = format!("action=index_course&course=valid&xsrf_token={}", token);
    assert_eq!(handle_admin_action(&state, &student, &form).status, 403);
}

#[tokio::test]
async fn test_background_worker_indexes() {
    let (state, _valid, _banned) = setup().await;
    let worker = state.tasks.spawn_worker();

    assert_eq!(admin_action(&state, ACTION_INDEX_COURSE, "valid"), 200);

    for _ in 0..200 {
        if state.index.document_count("valid") > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let (_, body) = search(&state, "cogito ergo sum");
    assert!(body.contains("search-result"));
    worker.abort();
}
