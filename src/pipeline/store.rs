//! In-memory change detection.

use std::collections::{HashMap, HashSet};

use crate::models::Announcement;

/// References already seen, partitioned by source.
///
/// Nothing is persisted: a restarted process treats every listed item as new.
#[derive(Debug, Default)]
pub struct SeenStore {
    seen: HashMap<String, HashSet<String>>,
}

impl SeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time `(source, reference)` is offered, which also marks it.
    pub fn is_new(&mut self, source: &str, reference: &str) -> bool {
        match self.seen.get_mut(source) {
            Some(references) => references.insert(reference.to_string()),
            None => {
                self.seen
                    .insert(source.to_string(), HashSet::from([reference.to_string()]));
                true
            }
        }
    }

    /// Keep only the announcements not seen before, marking them.
    pub fn diff(&mut self, source: &str, announcements: Vec<Announcement>) -> Vec<Announcement> {
        announcements
            .into_iter()
            .filter(|a| self.is_new(source, &a.reference))
            .collect()
    }

    pub fn seen_count(&self, source: &str) -> usize {
        self.seen.get(source).map_or(0, HashSet::len)
    }

    /// Total references across all sources.
    pub fn len(&self) -> usize {
        self.seen.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
