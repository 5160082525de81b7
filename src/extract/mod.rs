//! HTML content and link extraction
//!
//! This module turns raw HTML into the pieces the index needs:
//! - An extractor driven by the html5ever tokenizer, producing
//!   whitespace-correct visible text, the page title and the set of absolute
//!   outbound links
//! - [`fetch_page`] / [`parse_url`], which gate extraction on robots.txt and
//!   a usable HTTP response

mod extractor;

pub use extractor::{extract_page, HtmlExtractor};

use crate::crawler::{is_html_content_type, FetchResult, Fetcher};
use crate::robots::RobotsPolicy;
use crate::{Result, SearchError};
use std::collections::BTreeSet;
use url::Url;

/// What the extractor found in one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Text of the first `<title>` element
    pub title: Option<String>,
    /// Visible text with whitespace collapsed
    pub content: String,
    /// Absolute outbound links, one per distinct URL
    pub links: BTreeSet<String>,
}

/// Fetches a page and extracts it, honouring robots.txt first
///
/// # Arguments
///
/// * `fetcher` - Transport used for the page request
/// * `robots` - Policy consulted before anything is fetched
/// * `url` - Page to fetch
/// * `user_agent` - Product token matched against robots.txt groups
///
/// # Returns
///
/// * `Ok(ExtractedPage)` - Content, title and links of the page
/// * `Err(SearchError::RobotsDenied)` - robots.txt disallows the URL
/// * `Err(SearchError::FetchFailed)` - Transport failure or non-2xx status
/// * `Err(SearchError::NotParseable)` - The response is not HTML
pub async fn fetch_page(
    fetcher: &dyn Fetcher,
    robots: &dyn RobotsPolicy,
    url: &Url,
    user_agent: &str,
) -> Result<ExtractedPage> {
    if !robots.is_allowed(url, user_agent).await {
        return Err(SearchError::RobotsDenied {
            url: url.to_string(),
        });
    }

    fetch_and_extract(fetcher, url).await
}

/// Fetches a page and extracts it without consulting robots.txt
///
/// For callers that already checked the policy themselves.
pub async fn fetch_and_extract(fetcher: &dyn Fetcher, url: &Url) -> Result<ExtractedPage> {
    match fetcher.fetch(url).await {
        FetchResult::Success {
            final_url,
            content_type,
            body,
            ..
        } => {
            if !is_html_content_type(&content_type) {
                return Err(SearchError::NotParseable {
                    url: url.to_string(),
                    reason: format!("content type {}", content_type),
                });
            }
            // Relative links resolve against where the redirects ended up
            Ok(extract_page(&body, &final_url))
        }
        failure => Err(SearchError::FetchFailed {
            url: url.to_string(),
            reason: failure.failure_reason().unwrap_or_default(),
        }),
    }
}

/// Returns the parsed page for a URL, or `NotParseable` when it cannot be had
///
/// Every reason a page is unusable (robots denial, transport failure, error
/// status, non-HTML response) collapses into [`SearchError::NotParseable`].
pub async fn parse_url(
    fetcher: &dyn Fetcher,
    robots: &dyn RobotsPolicy,
    url: &Url,
    user_agent: &str,
) -> Result<ExtractedPage> {
    fetch_page(fetcher, robots, url, user_agent)
        .await
        .map_err(|e| match e {
            SearchError::NotParseable { .. } => e,
            other => SearchError::NotParseable {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })
}
