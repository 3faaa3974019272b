//! Announcement data structure.

use serde::{Deserialize, Serialize};

/// A listing extracted from a source: its reference and where it lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Announcement {
    /// Source-defined reference, never empty
    pub reference: String,

    /// Absolute URL of the detail page (empty for single-phase sources)
    pub url: String,
}

impl Announcement {
    pub fn new(reference: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            url: url.into(),
        }
    }

    /// Format the announcement for a notification using a template.
    ///
    /// Supported placeholders:
    /// - `{title}`: display title of the source
    /// - `{source}`: source name
    /// - `{reference}`, `{url}`
    pub fn format(&self, template: &str, title: &str, source: &str) -> String {
        template
            .replace("{title}", title)
            .replace("{source}", source)
            .replace("{reference}", &self.reference)
            .replace("{url}", &self.url)
            .trim_end()
            .to_string()
    }
}
