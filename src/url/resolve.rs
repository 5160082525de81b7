use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a link found on a page against the page's URL
///
/// Absolute links come back as-is (whatever their scheme), protocol-relative
/// links (`//host/path`) take the base's scheme, and path-relative links are
/// joined according to RFC 3986. Input that cannot be resolved is returned
/// trimmed but otherwise untouched.
///
/// # Examples
///
/// ```
/// use course_search::url::resolve;
///
/// assert_eq!(resolve("http://valid.null/", "//partial.null/"), "http://partial.null/");
/// assert_eq!(
///     resolve("http://valid.null/", "index.php?query=bibi%20quid"),
///     "http://valid.null/index.php?query=bibi%20quid"
/// );
/// assert_eq!(resolve("http://valid.null/", "ftp://absolute.null/"), "ftp://absolute.null/");
/// ```
pub fn resolve(base_url: &str, href: &str) -> String {
    let href = href.trim();

    let resolved = match Url::parse(base_url) {
        Ok(base) => base.join(href),
        Err(_) => Url::parse(href),
    };

    match resolved {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Returns a copy of the URL without its fragment
///
/// Two links that differ only by `#fragment` name the same document.
pub fn strip_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// Returns true for schemes the crawler can fetch
pub fn is_crawlable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Parses a URL the crawler is asked to start from
///
/// # Returns
///
/// * `Ok(Url)` - An http(s) URL with a host
/// * `Err(UrlError)` - Unparseable, wrong scheme, or no host
pub fn parse_crawl_url(input: &str) -> UrlResult<Url> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;

    if !is_crawlable(&url) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
