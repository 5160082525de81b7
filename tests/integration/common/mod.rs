//! Shared fixtures for the integration tests

#![allow(dead_code)]

use course_search::config::{
    Config, CourseEntry, CrawlerConfig, ModuleConfig, SearchConfig, StorageConfig,
    UserAgentConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The page every fixture course is built around
pub const VALID_PAGE: &str = r#"<html>
  <head>
     <title>Test Page</title>
     <script>
         alert('test');
     </script>
     <style>
         body {
           font-size: 12px;
         }
     </style>
  </head>
  <body>
     Lorem ipsum <strong> dolor </strong> sit.
     <a href="index.php?query=bibi%20quid">Ago gratias tibi</a>.
     <a>Cogito ergo sum.</a>
     <a href="//partial.null/"> Partial link </a>
     <a href="ftp://absolute.null/"> Absolute link </a>
  </body>
</html>"#;

pub const USER_AGENT: &str = "TestBot";

/// Creates a test configuration for the given courses
pub fn create_test_config(courses: Vec<CourseEntry>) -> Config {
    Config {
        crawler: CrawlerConfig {
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: USER_AGENT.to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        search: SearchConfig::default(),
        storage: StorageConfig::default(),
        module: ModuleConfig {
            xsrf_secret: "integration-secret".to_string(),
            ..ModuleConfig::default()
        },
        courses,
    }
}

pub fn course(id: &str, seeds: Vec<String>) -> CourseEntry {
    CourseEntry {
        id: id.to_string(),
        title: format!("Course {}", id),
        seeds,
        allowed_domains: vec![],
    }
}

/// Serves an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

/// Serves robots.txt
pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// A server that allows everything and serves the fixture page at `/`
pub async fn valid_server() -> MockServer {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;
    mount_page(&server, "/", VALID_PAGE).await;
    server
}

/// A server whose robots.txt bans every crawler
pub async fn banned_server() -> MockServer {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /\n").await;
    mount_page(&server, "/", VALID_PAGE).await;
    server
}
