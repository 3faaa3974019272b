//! Adapter registry: source identity → extraction adapter.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Adapter, agencies};
use crate::error::Result;

/// Maps adapter keys to adapter implementations.
///
/// Adding a source is one `register` call; nothing dispatches on source
/// identity anywhere else.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in agency adapter.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        agencies::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Register an adapter, replacing any previous one under the same key.
    pub fn register(&mut self, key: impl Into<String>, adapter: impl Adapter + 'static) {
        self.adapters.insert(key.into(), Arc::new(adapter));
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(key).cloned()
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Candidate, Page};

    struct Fixed;

    impl Adapter for Fixed {
        fn extract_candidates(&self, _page: &Page, out: &mut Vec<Candidate>) {
            out.push(Candidate::Detail("https://example.com/1".to_string()));
        }
    }

    #[test]
    fn register_and_get() {
        let mut registry = AdapterRegistry::new();
        assert!(registry.is_empty());

        registry.register("fixed", Fixed);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("fixed").is_some());
        assert!(registry.get("other").is_none());
    }

    #[test]
    fn builtin_keys_are_sorted() {
        let registry = AdapterRegistry::builtin().unwrap();
        let keys: Vec<&str> = registry.keys().collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 14);
    }
}
