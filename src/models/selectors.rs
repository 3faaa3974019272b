// src/models/selectors.rs

//! CSS selectors describing a two-phase listing source.

use serde::{Deserialize, Serialize};

/// CSS selectors for a source whose index page links to detail pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSelectors {
    /// Selector for each listing card on the index page
    pub row_selector: String,

    /// Selector for the link element within a row (first match wins).
    /// When unset, the row element itself carries the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_selector: Option<String>,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_attr_name")]
    pub attr_name: String,

    /// Prefix glued in front of the raw attribute value instead of
    /// resolving it against the index page URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_prefix: Option<String>,

    /// Drop repeated detail links (some agencies render each card twice)
    #[serde(default)]
    pub dedupe: bool,

    /// Selector for the element(s) carrying the reference on a detail page
    pub reference_selector: String,

    /// Fixed label preceding the reference value, e.g. "Réf :"
    pub reference_label: String,
}

fn default_attr_name() -> String {
    "href".to_string()
}

impl SourceSelectors {
    /// Selectors for a source where every row is followed by its first `<a>`.
    pub fn new(
        row: impl Into<String>,
        reference: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            row_selector: row.into(),
            link_selector: Some("a".to_string()),
            attr_name: default_attr_name(),
            url_prefix: None,
            dedupe: false,
            reference_selector: reference.into(),
            reference_label: label.into(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link_selector = Some(link.into());
        self
    }

    pub fn without_link(mut self) -> Self {
        self.link_selector = None;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = Some(prefix.into());
        self
    }

    pub fn deduplicated(mut self) -> Self {
        self.dedupe = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let selectors: SourceSelectors = toml::from_str(
            r#"
            row_selector = "div.results article"
            reference_selector = "p.ref"
            reference_label = "Réf :"
            "#,
        )
        .unwrap();

        assert_eq!(selectors.attr_name, "href");
        assert_eq!(selectors.link_selector, None);
        assert!(!selectors.dedupe);
    }

    #[test]
    fn builder_sets_link_and_prefix() {
        let selectors = SourceSelectors::new("li.item", "span.note", "Réf :")
            .with_link("h2 a")
            .with_prefix("https://example.com")
            .deduplicated();

        assert_eq!(selectors.link_selector.as_deref(), Some("h2 a"));
        assert_eq!(selectors.url_prefix.as_deref(), Some("https://example.com"));
        assert!(selectors.dedupe);
    }
}
