//! Utility functions and helpers.

pub mod http;
pub mod report;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the host from a URL.
pub fn get_domain(url: &Url) -> Option<String> {
    url.host_str().map(|s| s.to_ascii_lowercase())
}

/// Text after the last `/` of a URL, if non-empty.
pub fn last_path_segment(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|segment| !segment.is_empty())
}
