//! Reference extraction from labelled text.
//!
//! Agencies print references as `<label> <value>` inside boilerplate, e.g.
//! `"Réf : 12345"`, `"(ref : AB-12)"` or `"Référence du bien : 4471 €"`.
//! Only the first token after the label is kept, with surrounding
//! punctuation and currency symbols stripped.

use regex::Regex;

use crate::error::{AppError, Result};

/// A compiled reference label.
///
/// Matching is case-insensitive and tolerant to whitespace differences
/// (including non-breaking spaces) between the words of the label, so
/// `"Réf :"` also matches `"RÉF:"` and `"Réf\u{a0}:"`. Labels only match
/// on word boundaries.
#[derive(Debug, Clone)]
pub struct ReferenceLabel {
    label: String,
    pattern: Regex,
}

impl ReferenceLabel {
    pub fn new(label: &str) -> Result<Self> {
        let body = label
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s*");
        if body.is_empty() {
            return Err(AppError::config("reference label is empty"));
        }

        // A label that starts or ends with a word character must not match
        // inside a longer word ("Lot" in "Charlotte" or "Lotissement").
        let trimmed = label.trim();
        let lead = if trimmed.starts_with(char::is_alphanumeric) {
            r"(?:^|[^\p{L}\p{N}])"
        } else {
            ""
        };
        let tail = if trimmed.ends_with(char::is_alphanumeric) {
            r"(?:[^\p{L}\p{N}](.*)|$)"
        } else {
            "(.*)"
        };

        let pattern = Regex::new(&format!("(?is){lead}{body}{tail}"))
            .map_err(|e| AppError::config(format!("invalid reference label '{label}': {e}")))?;

        Ok(Self {
            label: label.to_string(),
            pattern,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Extract the value following the label, if any.
    pub fn extract(&self, text: &str) -> Option<String> {
        let rest = self.pattern.captures(text)?.get(1)?.as_str();
        rest.split_whitespace().find_map(clean_token)
    }
}

/// One-shot variant of [`ReferenceLabel::extract`].
pub fn reference_after_label(text: &str, label: &str) -> Option<String> {
    ReferenceLabel::new(label).ok()?.extract(text)
}

/// Strip leading/trailing noise from a token; `None` when nothing is left.
fn clean_token(token: &str) -> Option<String> {
    let cleaned = token.trim_matches(|c: char| !c.is_alphanumeric());
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
