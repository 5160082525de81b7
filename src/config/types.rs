use serde::Deserialize;

/// Main configuration structure for course-search
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub module: ModuleConfig,
    #[serde(default, rename = "course")]
    pub courses: Vec<CourseEntry>,
}

impl Config {
    /// Looks up a course by its identifier
    pub fn course(&self, course_id: &str) -> Option<&CourseEntry> {
        self.courses.iter().find(|c| c.id == course_id)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// How many link hops to follow from the seed pages (0 or 1)
    #[serde(rename = "link-depth", default = "default_link_depth")]
    pub link_depth: u32,

    /// Maximum number of pages fetched in one crawl session
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound on any robots.txt Crawl-delay we honour (milliseconds)
    #[serde(rename = "max-crawl-delay-ms", default = "default_max_crawl_delay")]
    pub max_crawl_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            link_depth: default_link_depth(),
            max_pages: default_max_pages(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_crawl_delay_ms: default_max_crawl_delay(),
        }
    }
}

fn default_link_depth() -> u32 {
    1
}

fn default_max_pages() -> u32 {
    500
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_crawl_delay() -> u64 {
    5_000
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the outbound User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Index and query configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of hits returned per query
    #[serde(rename = "results-limit", default = "default_results_limit")]
    pub results_limit: usize,

    /// Maximum snippet length in characters
    #[serde(rename = "snippet-length", default = "default_snippet_length")]
    pub snippet_length: usize,

    /// Memory budget for each course's index writer (bytes)
    #[serde(rename = "writer-memory-bytes", default = "default_writer_memory")]
    pub writer_memory_bytes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_limit: default_results_limit(),
            snippet_length: default_snippet_length(),
            writer_memory_bytes: default_writer_memory(),
        }
    }
}

fn default_results_limit() -> usize {
    10
}

fn default_snippet_length() -> usize {
    200
}

fn default_writer_memory() -> usize {
    20_000_000
}

/// Crawl log storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite crawl log; `:memory:` keeps it in memory
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    ":memory:".to_string()
}

/// Search module registration settings
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    /// Whether the module starts enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Secret mixed into anti-forgery tokens; required, see validation
    #[serde(rename = "xsrf-secret", default)]
    pub xsrf_secret: String,

    /// Maximum anti-forgery token age (seconds)
    #[serde(rename = "xsrf-max-age-secs", default = "default_xsrf_max_age")]
    pub xsrf_max_age_secs: i64,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            xsrf_secret: String::new(),
            xsrf_max_age_secs: default_xsrf_max_age(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_xsrf_max_age() -> i64 {
    24 * 60 * 60
}

/// A course whose pages are crawled into its own index
#[derive(Debug, Clone, Deserialize)]
pub struct CourseEntry {
    /// Course identifier, also the index key
    pub id: String,

    /// Human-readable course title
    #[serde(default)]
    pub title: String,

    /// Pages belonging to the course
    pub seeds: Vec<String>,

    /// Host patterns links may point to (e.g., "*.example.com"); empty allows any host
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,
}
