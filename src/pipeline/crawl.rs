// src/pipeline/crawl.rs

//! Two-phase crawl of one source.

use std::sync::Arc;

use reqwest::Client;

use crate::adapters::Candidate;
use crate::error::{AppError, Result};
use crate::fetch::FetchEngine;
use crate::models::{Announcement, CrawlerConfig, Source, SourceCatalog};
use crate::utils::http::create_client;

/// Crawls catalog sources: index page first, then every detail page it links.
#[derive(Debug)]
pub struct Orchestrator {
    client: Client,
    config: CrawlerConfig,
    catalog: SourceCatalog,
}

impl Orchestrator {
    pub fn new(config: CrawlerConfig, catalog: SourceCatalog) -> Result<Self> {
        let client = create_client(&config)?;
        Ok(Self {
            client,
            config,
            catalog,
        })
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Crawl the source called `name`.
    ///
    /// The only error is [`AppError::UnknownSource`]; unreachable pages just
    /// contribute nothing.
    pub async fn scrape(&self, name: &str) -> Result<Vec<Announcement>> {
        let source = self
            .catalog
            .get(name)
            .ok_or_else(|| AppError::UnknownSource(name.to_string()))?;
        Ok(self.scrape_source(source).await)
    }

    /// Crawl one bound source. Order of the result is unspecified.
    pub async fn scrape_source(&self, source: &Source) -> Vec<Announcement> {
        // Index phase
        let mut index = FetchEngine::new(self.client.clone(), &self.config);
        let adapter = Arc::clone(&source.adapter);
        index.on_document(move |page, out| adapter.extract_candidates(page, out));
        index.visit(&source.index_url);

        let mut listings = Vec::new();
        let mut details = Vec::new();
        for candidate in index.wait().await {
            match candidate {
                Candidate::Detail(url) => details.push(url),
                Candidate::Listing(announcement) => listings.push(announcement),
            }
        }
        log::debug!(
            "{}: {} listing(s), {} detail page(s) on index",
            source.name,
            listings.len(),
            details.len()
        );

        if details.is_empty() {
            return listings;
        }

        // Detail phase, with fresh per-domain spacing
        let mut detail = FetchEngine::new(self.client.clone(), &self.config);
        let adapter = Arc::clone(&source.adapter);
        detail.on_document(move |page, out| out.extend(adapter.extract_reference(page)));
        for url in &details {
            detail.visit(url);
        }

        listings.extend(detail.wait().await);
        listings
    }
}
