use crate::config::CourseEntry;
use crate::url::domain::extract_domain;
use url::Url;

/// Checks if a host matches a wildcard pattern
///
/// `"example.com"` matches only itself; `"*.example.com"` matches the bare
/// domain and any subdomain of it.
///
/// # Examples
///
/// ```
/// use course_search::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "notes.example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Hosts a course's crawl may reach
#[derive(Debug, Clone, Default)]
pub struct CrawlScope {
    patterns: Vec<String>,
}

impl CrawlScope {
    /// Creates a scope from host patterns; an empty list admits every host
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Builds the scope declared by a course entry
    pub fn for_course(course: &CourseEntry) -> Self {
        Self::new(course.allowed_domains.clone())
    }

    /// Returns true if the URL's host is inside the scope
    pub fn contains(&self, url: &Url) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        match extract_domain(url) {
            Some(host) => self.patterns.iter().any(|p| matches_wildcard(p, &host)),
            None => false,
        }
    }
}
