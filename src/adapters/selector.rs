//! Selector-driven building blocks and the generic two-phase adapter.

use std::collections::HashSet;

use scraper::Selector;

use super::{Adapter, Candidate, Page, ReferenceLabel, element_text, parse_selector};
use crate::error::Result;
use crate::models::{Announcement, SourceSelectors};
use crate::utils::resolve_url;

/// Collects detail links from the rows of an index page.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    row: Selector,
    link: Option<Selector>,
    attr_name: String,
    url_prefix: Option<String>,
    dedupe: bool,
}

impl LinkExtractor {
    pub fn new(selectors: &SourceSelectors) -> Result<Self> {
        Ok(Self {
            row: parse_selector(&selectors.row_selector)?,
            link: selectors
                .link_selector
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            attr_name: selectors.attr_name.clone(),
            url_prefix: selectors.url_prefix.clone(),
            dedupe: selectors.dedupe,
        })
    }

    /// Rows followed by their first `link` match, resolved against the page URL.
    pub fn rows(row: &str, link: &str) -> Result<Self> {
        Ok(Self {
            row: parse_selector(row)?,
            link: Some(parse_selector(link)?),
            attr_name: "href".to_string(),
            url_prefix: None,
            dedupe: false,
        })
    }

    /// Absolute detail URLs in document order.
    pub fn collect(&self, page: &Page) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for row in page.select(&self.row) {
            let element = match &self.link {
                Some(sel) => row.select(sel).next(),
                None => Some(row),
            };
            let raw = element
                .and_then(|e| e.value().attr(&self.attr_name))
                .map(str::trim)
                .filter(|href| !href.is_empty());

            let Some(raw) = raw else {
                log::debug!("No link found in a listing row of {}", page.url());
                continue;
            };

            let url = match &self.url_prefix {
                Some(prefix) => format!("{prefix}{raw}"),
                None => resolve_url(page.url(), raw),
            };

            if self.dedupe && !seen.insert(url.clone()) {
                continue;
            }
            urls.push(url);
        }
        urls
    }
}

/// Locates a labelled reference among the elements matched by a selector.
#[derive(Debug, Clone)]
pub struct LabelledReference {
    selector: Selector,
    label: ReferenceLabel,
}

impl LabelledReference {
    pub fn new(selector: &str, label: &str) -> Result<Self> {
        Ok(Self {
            selector: parse_selector(selector)?,
            label: ReferenceLabel::new(label)?,
        })
    }

    /// First reference found, scanning matched elements in document order.
    pub fn extract(&self, page: &Page) -> Option<String> {
        page.select(&self.selector)
            .find_map(|element| self.label.extract(&element_text(element)))
    }
}

/// Generic adapter: follow row links, read one labelled reference per detail page.
#[derive(Debug, Clone)]
pub struct SelectorAdapter {
    title: Option<String>,
    links: LinkExtractor,
    reference: LabelledReference,
}

impl SelectorAdapter {
    pub fn new(selectors: &SourceSelectors) -> Result<Self> {
        Ok(Self {
            title: None,
            links: LinkExtractor::new(selectors)?,
            reference: LabelledReference::new(
                &selectors.reference_selector,
                &selectors.reference_label,
            )?,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Adapter for SelectorAdapter {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn extract_candidates(&self, page: &Page, out: &mut Vec<Candidate>) {
        out.extend(self.links.collect(page).into_iter().map(Candidate::Detail));
    }

    fn extract_reference(&self, page: &Page) -> Option<Announcement> {
        match self.reference.extract(page) {
            Some(reference) => Some(Announcement::new(reference, page.url().as_str())),
            None => {
                log::debug!(
                    "No '{}' reference on {}",
                    self.reference.label.label(),
                    page.url()
                );
                None
            }
        }
    }
}
