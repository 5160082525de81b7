//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the fetch,
//! robots and extraction pipeline end-to-end over real HTTP.

mod common;

use common::*;
use course_search::crawler::{Crawler, Fetcher, HttpFetcher, PageOutcome};
use course_search::extract::parse_url;
use course_search::robots::RobotsChecker;
use course_search::SearchError;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_parts() -> (Arc<dyn Fetcher>, RobotsChecker) {
    let config = create_test_config(vec![]);
    let fetcher: Arc<dyn Fetcher> = Arc::new(
        HttpFetcher::new(&config.user_agent, &config.crawler).expect("Failed to build client"),
    );
    let robots = RobotsChecker::new(fetcher.clone());
    (fetcher, robots)
}

fn crawler() -> Crawler {
    Crawler::from_config(&create_test_config(vec![])).expect("Failed to build crawler")
}

fn outcome_of<'a>(outcomes: &'a [(String, PageOutcome)], url: &str) -> Option<&'a PageOutcome> {
    outcomes.iter().find(|(u, _)| u == url).map(|(_, o)| o)
}

#[tokio::test]
async fn test_valid_page_extraction() {
    let server = valid_server().await;
    let base_url = format!("{}/", server.uri());
    let (fetcher, robots) = http_parts();

    let page = parse_url(
        fetcher.as_ref(),
        &robots,
        &Url::parse(&base_url).unwrap(),
        USER_AGENT,
    )
    .await
    .expect("Valid page should parse");

    assert_eq!(page.title.as_deref(), Some("Test Page"));

    for text in ["Lorem", "ipsum", "dolor", "Cogito ergo sum"] {
        assert!(page.content.contains(text), "missing {:?}", text);
    }
    for text in ["Loremipsum", "ipsumdolor", "tibiCogito", "sit.Ago"] {
        assert!(!page.content.contains(text), "fused {:?}", text);
    }
    for text in ["alert", "font-size", "body", "script", "style"] {
        assert!(!page.content.contains(text), "leaked {:?}", text);
    }

    assert_eq!(page.links.len(), 3);
    assert!(page
        .links
        .contains(&format!("{}index.php?query=bibi%20quid", base_url)));
    assert!(page.links.contains("http://partial.null/"));
    assert!(page.links.contains("ftp://absolute.null/"));
}

#[tokio::test]
async fn test_banned_page_not_parseable() {
    let server = banned_server().await;
    let (fetcher, robots) = http_parts();

    let result = parse_url(
        fetcher.as_ref(),
        &robots,
        &Url::parse(&format!("{}/", server.uri())).unwrap(),
        USER_AGENT,
    )
    .await;

    assert!(matches!(result, Err(SearchError::NotParseable { .. })));
}

#[tokio::test]
async fn test_crawl_follows_first_degree_links_only() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;
    mount_page(
        &server,
        "/",
        &format!(r#"<title>Home</title>Home <a href="{}/page1">Page 1</a>"#, base_url),
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<title>Page 1</title>Content 1 <a href="/page2">Page 2</a>"#,
    )
    .await;

    // A second-degree link is never fetched
    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = crawler()
        .crawl(&course("c1", vec![format!("{}/", base_url)]))
        .await;

    let urls: Vec<&str> = report.documents.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![format!("{}/", base_url), format!("{}/page1", base_url)]
    );
    assert_eq!(report.documents[1].title, "Page 1");
    assert_eq!(report.documents[1].content, "Content 1 Page 2");
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_robots(&server, "User-agent: *\nDisallow: /admin\n").await;
    mount_page(
        &server,
        "/",
        r#"<title>Home</title><a href="/allowed">Allowed</a><a href="/admin">Admin</a>"#,
    )
    .await;
    mount_page(&server, "/allowed", "<title>Allowed</title>Allowed content").await;

    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = crawler()
        .crawl(&course("c1", vec![format!("{}/", base_url)]))
        .await;

    assert_eq!(report.documents.len(), 2);
    assert_eq!(
        outcome_of(&report.outcomes, &format!("{}/admin", base_url)),
        Some(&PageOutcome::RobotsDenied)
    );
}

#[tokio::test]
async fn test_robots_fetched_once_per_session() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /\n"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "A").await;
    mount_page(&server, "/b", "B").await;

    let report = crawler()
        .crawl(&course("c1", vec![format!("{}/", base_url)]))
        .await;
    assert_eq!(report.documents.len(), 3);
}

#[tokio::test]
async fn test_missing_robots_allows_all() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<title>Open</title>Open content").await;

    let report = crawler()
        .crawl(&course("c1", vec![format!("{}/", server.uri())]))
        .await;

    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].title, "Open");
}

#[tokio::test]
async fn test_bad_pages_are_skipped() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;
    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/broken">Broken</a><a href="/notes.pdf">PDF</a><a href="/ok">OK</a>"#,
    )
    .await;
    mount_page(&server, "/ok", "Still indexed").await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    let report = crawler()
        .crawl(&course("c1", vec![format!("{}/", base_url)]))
        .await;

    assert!(matches!(
        outcome_of(&report.outcomes, &format!("{}/missing", base_url)),
        Some(PageOutcome::FetchFailed(_))
    ));
    assert!(matches!(
        outcome_of(&report.outcomes, &format!("{}/broken", base_url)),
        Some(PageOutcome::FetchFailed(_))
    ));
    assert!(matches!(
        outcome_of(&report.outcomes, &format!("{}/notes.pdf", base_url)),
        Some(PageOutcome::NotHtml(_))
    ));
    assert!(report
        .documents
        .iter()
        .any(|d| d.url == format!("{}/ok", base_url)));
}

#[tokio::test]
async fn test_out_of_scope_links_not_followed() {
    let course_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    mount_page(
        &course_server,
        "/",
        &format!(r#"<a href="{}/elsewhere">Elsewhere</a>"#, other_server.uri()),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&other_server)
        .await;

    // Both servers listen on 127.0.0.1; scope on a host neither uses
    let mut entry = course("c1", vec![format!("{}/", course_server.uri())]);
    entry.allowed_domains = vec!["*.course.null".to_string()];

    let report = crawler().crawl(&entry).await;

    assert_eq!(report.documents.len(), 1);
    assert_eq!(
        outcome_of(&report.outcomes, &format!("{}/elsewhere", other_server.uri())),
        Some(&PageOutcome::OutOfScope)
    );
}
