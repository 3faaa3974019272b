// src/models/source.rs

//! Source configuration and the bound, immutable sources built from it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::{Adapter, AdapterRegistry, SelectorAdapter};
use crate::error::{AppError, Result};
use crate::models::SourceSelectors;

/// A source as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source identity
    pub name: String,

    /// Display title used in notifications (defaults to the adapter's title)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Index page listing the current ads
    pub index_url: String,

    /// Registry key of the adapter (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<String>,

    /// Inline selectors; takes precedence over `adapter`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<SourceSelectors>,
}

impl SourceConfig {
    /// Registry key used to look up the adapter.
    pub fn adapter_key(&self) -> &str {
        self.adapter.as_deref().unwrap_or(&self.name)
    }
}

/// A configured source bound to its adapter.
#[derive(Clone)]
pub struct Source {
    pub name: String,
    pub title: String,
    pub index_url: String,
    pub adapter: Arc<dyn Adapter>,
}

impl Source {
    /// Bind a configured source to its adapter.
    ///
    /// Fails with [`AppError::UnknownSource`] when the adapter key is not
    /// registered: a misconfigured source must never be skipped silently.
    pub fn bind(config: &SourceConfig, registry: &AdapterRegistry) -> Result<Self> {
        let adapter: Arc<dyn Adapter> = match &config.selectors {
            Some(selectors) => Arc::new(SelectorAdapter::new(selectors)?),
            None => registry
                .get(config.adapter_key())
                .ok_or_else(|| AppError::UnknownSource(config.adapter_key().to_string()))?,
        };

        let title = config
            .title
            .clone()
            .or_else(|| adapter.title().map(str::to_string))
            .unwrap_or_else(|| config.name.clone());

        Ok(Self {
            name: config.name.clone(),
            title,
            index_url: config.index_url.clone(),
            adapter,
        })
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("index_url", &self.index_url)
            .finish_non_exhaustive()
    }
}

/// The static, ordered set of sources for this process.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: Vec<Source>,
}

impl SourceCatalog {
    /// Bind every configured source, failing on the first unknown one.
    pub fn bind_all(configs: &[SourceConfig], registry: &AdapterRegistry) -> Result<Self> {
        let sources = configs
            .iter()
            .map(|config| Source::bind(config, registry))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { sources })
    }

    /// Look up a source by name.
    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
