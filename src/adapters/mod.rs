//! Per-source extraction adapters.
//!
//! An adapter turns parsed documents into listing data in two steps:
//!
//! 1. **Index page** → [`Candidate`]s: detail URLs to crawl next, or, for
//!    single-phase sources, terminal [`Announcement`]s.
//! 2. **Detail page** → at most one [`Announcement`], located through a fixed
//!    reference label such as `"Réf :"`.
//!
//! Adapters hold only immutable, pre-parsed selectors. They never fetch and
//! never keep state between calls, so the fetch engine can run them from any
//! task.

mod agencies;
mod reference;
mod registry;
mod selector;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Announcement;

pub use reference::{ReferenceLabel, reference_after_label};
pub use registry::AdapterRegistry;
pub use selector::{LabelledReference, LinkExtractor, SelectorAdapter};

/// A fetched and parsed document.
pub struct Page {
    url: Url,
    document: Html,
}

impl Page {
    /// Parse an HTML body fetched from `url`.
    pub fn parse(url: Url, body: &str) -> Self {
        Self {
            url,
            document: Html::parse_document(body),
        }
    }

    /// URL the document was requested from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Iterate over elements matching `selector`.
    pub fn select<'a, 'b>(
        &'a self,
        selector: &'b Selector,
    ) -> scraper::html::Select<'a, 'b> {
        self.document.select(selector)
    }
}

/// One item found on an index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A detail page to crawl in the second phase.
    Detail(String),
    /// Terminal data for single-phase sources.
    Listing(Announcement),
}

/// Source-specific extraction hooks.
pub trait Adapter: Send + Sync {
    /// Display title used when the source config does not set one.
    fn title(&self) -> Option<&str> {
        None
    }

    /// Append the candidates found on an index page to `out`, in document order.
    fn extract_candidates(&self, page: &Page, out: &mut Vec<Candidate>);

    /// Extract the announcement of a detail page.
    ///
    /// `None` is a soft miss: the page is skipped, nothing is reported as an
    /// error. Single-phase sources keep the default.
    fn extract_reference(&self, page: &Page) -> Option<Announcement> {
        let _ = page;
        None
    }
}

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Whitespace-normalized text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(|chunk| chunk.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.class").is_ok());
        assert!(parse_selector("div.row > article a[rel='bookmark']").is_ok());
        assert!(parse_selector("#C\\:blocRecherche\\.blocRechercheDesk\\.P\\.C\\:U li.item").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(matches!(
            parse_selector("[[invalid"),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn element_text_collapses_whitespace() {
        let page = Page::parse(
            Url::parse("https://example.com/").unwrap(),
            "<p class='ref'>  Réf&nbsp;:\n   <b>12345</b>\t</p>",
        );
        let sel = parse_selector("p.ref").unwrap();
        let text = element_text(page.select(&sel).next().unwrap());
        assert_eq!(text, "Réf : 12345");
    }
}
