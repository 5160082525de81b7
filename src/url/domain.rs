use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use course_search::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the origin (scheme, host and non-default port) of a URL
///
/// Robots policies are fetched and cached per origin. URLs without a
/// tuple origin (e.g. `data:`) serialize as `"null"`.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Returns the robots.txt location governing a URL
pub fn robots_url(url: &Url) -> Option<Url> {
    if url.host_str().is_none() {
        return None;
    }
    url.join("/robots.txt").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain_lowercases() {
        let url = Url::parse("https://Blog.Example.COM:8080/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_origin_of() {
        let url = Url::parse("http://valid.null/index.php?query=x#top").unwrap();
        assert_eq!(origin_of(&url), "http://valid.null");

        let url = Url::parse("http://127.0.0.1:8080/page").unwrap();
        assert_eq!(origin_of(&url), "http://127.0.0.1:8080");

        let url = Url::parse("https://example.com:443/page").unwrap();
        assert_eq!(origin_of(&url), "https://example.com");
    }

    #[test]
    fn test_origin_of_opaque() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        assert_eq!(origin_of(&url), "null");
    }

    #[test]
    fn test_robots_url() {
        let url = Url::parse("http://banned.null/deep/page?x=1").unwrap();
        assert_eq!(
            robots_url(&url).unwrap().as_str(),
            "http://banned.null/robots.txt"
        );

        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert!(robots_url(&url).is_none());
    }
}
