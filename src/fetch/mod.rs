//! Concurrent, polite fetch engine.
//!
//! An engine is used for one crawl phase: register document handlers with
//! [`FetchEngine::on_document`], enqueue URLs with [`FetchEngine::visit`], then
//! [`FetchEngine::wait`] until every queued fetch has completed and collect
//! what the handlers produced.
//!
//! Fetch failures are logged and dropped; they never abort the batch. Handlers
//! only receive the parsed page and an output buffer, so they cannot enqueue
//! further visits: crawl depth stays at one per phase.

mod cache;
mod charset;
mod throttle;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::adapters::Page;
use crate::error::Result;
use crate::models::CrawlerConfig;
use crate::utils::get_domain;

pub use cache::ResponseCache;
pub use charset::decode_body;
pub use throttle::DomainThrottle;

type Handler<T> = Box<dyn Fn(&Page, &mut Vec<T>) + Send + Sync>;

pub struct FetchEngine<T> {
    client: Client,
    parallelism: usize,
    throttle: DomainThrottle,
    cache: Option<ResponseCache>,
    handlers: Vec<Handler<T>>,
    queue: Vec<Url>,
}

impl<T> FetchEngine<T> {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            parallelism: config.max_concurrent.max(1),
            throttle: DomainThrottle::new(config.request_delay()),
            cache: config
                .cache_dir
                .as_ref()
                .map(|dir| ResponseCache::new(dir, config.cache_ttl())),
            handlers: Vec::new(),
            queue: Vec::new(),
        }
    }

    /// Register a handler run on every successfully fetched document.
    pub fn on_document<F>(&mut self, handler: F)
    where
        F: Fn(&Page, &mut Vec<T>) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Enqueue `url` for the next [`wait`](Self::wait). Unparseable URLs are dropped.
    pub fn visit(&mut self, url: &str) {
        match Url::parse(url) {
            Ok(url) => self.queue.push(url),
            Err(e) => log::warn!("Skipping invalid URL '{}': {}", url, e),
        }
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Fetch everything queued and return the handlers' output.
    ///
    /// Output order follows completion order, not queue order.
    pub async fn wait(&mut self) -> Vec<T> {
        let urls = std::mem::take(&mut self.queue);
        let engine = &*self;
        let mut out = Vec::new();

        let mut responses = stream::iter(urls)
            .map(|url| async move {
                let result = engine.fetch(&url).await;
                (url, result)
            })
            .buffer_unordered(engine.parallelism);

        while let Some((url, result)) = responses.next().await {
            match result {
                Ok(body) => engine.dispatch(url, &body, &mut out),
                Err(e) => log::warn!("Failed to fetch {}: {}", url, e),
            }
        }

        out
    }

    /// Parse `body` and run every handler on it.
    fn dispatch(&self, url: Url, body: &str, out: &mut Vec<T>) {
        let page = Page::parse(url, body);
        for handler in &self.handlers {
            handler(&page, out);
        }
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url).await {
                log::debug!("Cache hit: {}", url);
                return Ok(body);
            }
        }

        if let Some(domain) = get_domain(url) {
            self.throttle.acquire(&domain).await;
        }

        log::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = decode_body(&response.bytes().await?, content_type.as_deref());

        if let Some(cache) = &self.cache {
            cache.put(url, &body).await;
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::create_client;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> CrawlerConfig {
        CrawlerConfig {
            request_delay_ms: 0,
            ..CrawlerConfig::default()
        }
    }

    fn title_handler(page: &Page, out: &mut Vec<String>) {
        let sel = crate::adapters::parse_selector("h1").unwrap();
        for el in page.select(&sel) {
            out.push(crate::adapters::element_text(el));
        }
    }

    async fn html(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn wait_collects_handler_output() {
        let server = MockServer::start().await;
        html(&server, "/a", "<h1>First</h1>").await;
        html(&server, "/b", "<h1>Second</h1><h1>Third</h1>").await;

        let config = fast_config();
        let mut engine: FetchEngine<String> = FetchEngine::new(create_client(&config).unwrap(), &config);
        engine.on_document(title_handler);
        engine.visit(&format!("{}/a", server.uri()));
        engine.visit(&format!("{}/b", server.uri()));
        assert_eq!(engine.queued(), 2);

        let mut titles = engine.wait().await;
        titles.sort();
        assert_eq!(titles, vec!["First", "Second", "Third"]);

        assert_eq!(engine.queued(), 0);
        assert!(engine.wait().await.is_empty());
    }

    #[tokio::test]
    async fn failures_do_not_abort_the_batch() {
        let server = MockServer::start().await;
        html(&server, "/ok", "<h1>Kept</h1>").await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let config = fast_config();
        let mut engine: FetchEngine<String> = FetchEngine::new(create_client(&config).unwrap(), &config);
        engine.on_document(title_handler);
        engine.visit(&format!("{}/missing", server.uri()));
        engine.visit("not a url");
        engine.visit(&format!("{}/ok", server.uri()));
        assert_eq!(engine.queued(), 2);

        assert_eq!(engine.wait().await, vec!["Kept"]);
    }

    #[tokio::test]
    async fn every_handler_sees_every_page() {
        let server = MockServer::start().await;
        html(&server, "/page", "<h1>Only</h1>").await;

        let config = fast_config();
        let mut engine: FetchEngine<String> = FetchEngine::new(create_client(&config).unwrap(), &config);
        engine.on_document(title_handler);
        engine.on_document(|page, out| out.push(page.url().path().to_string()));
        engine.visit(&format!("{}/page", server.uri()));

        let mut out = engine.wait().await;
        out.sort();
        assert_eq!(out, vec!["/page", "Only"]);
    }

    async fn slow_pages(server: &MockServer, count: usize, delay: Duration) -> Vec<String> {
        let mut urls = Vec::new();
        for i in 0..count {
            let route = format!("/slow/{i}");
            Mock::given(method("GET"))
                .and(path(route.as_str()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(format!("<h1>{i}</h1>"))
                        .set_delay(delay),
                )
                .mount(server)
                .await;
            urls.push(format!("{}{}", server.uri(), route));
        }
        urls
    }

    #[tokio::test]
    async fn parallelism_is_bounded_by_max_concurrent() {
        let server = MockServer::start().await;
        let delay = Duration::from_millis(200);
        let urls = slow_pages(&server, 6, delay).await;

        let config = CrawlerConfig {
            max_concurrent: 2,
            ..fast_config()
        };
        let mut engine: FetchEngine<String> = FetchEngine::new(create_client(&config).unwrap(), &config);
        engine.on_document(title_handler);
        for url in &urls {
            engine.visit(url);
        }

        let start = Instant::now();
        let titles = engine.wait().await;
        let elapsed = start.elapsed();

        assert_eq!(titles.len(), 6);
        // Six requests two at a time need at least three rounds.
        assert!(elapsed >= delay * 3, "finished in {elapsed:?}");
    }

    #[tokio::test]
    async fn requests_overlap_up_to_the_bound() {
        let server = MockServer::start().await;
        let delay = Duration::from_millis(300);
        let urls = slow_pages(&server, 4, delay).await;

        let config = CrawlerConfig {
            max_concurrent: 4,
            ..fast_config()
        };
        let mut engine: FetchEngine<String> = FetchEngine::new(create_client(&config).unwrap(), &config);
        engine.on_document(title_handler);
        for url in &urls {
            engine.visit(url);
        }

        let start = Instant::now();
        assert_eq!(engine.wait().await.len(), 4);
        assert!(start.elapsed() < delay * 4, "finished in {:?}", start.elapsed());
    }

    #[tokio::test]
    async fn latin1_pages_are_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latin1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                b"<html><head><meta charset=\"iso-8859-1\"></head><h1>R\xe9f : 12</h1></html>".to_vec(),
                "text/html",
            ))
            .mount(&server)
            .await;

        let config = fast_config();
        let mut engine: FetchEngine<String> = FetchEngine::new(create_client(&config).unwrap(), &config);
        engine.on_document(title_handler);
        engine.visit(&format!("{}/latin1", server.uri()));

        assert_eq!(engine.wait().await, vec!["Réf : 12"]);
    }

    #[tokio::test]
    async fn cached_responses_skip_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Cached</h1>"))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let config = CrawlerConfig {
            cache_dir: Some(tmp.path().to_path_buf()),
            ..fast_config()
        };
        let client = create_client(&config).unwrap();
        let url = format!("{}/index", server.uri());

        for _ in 0..2 {
            let mut engine: FetchEngine<String> = FetchEngine::new(client.clone(), &config);
            engine.on_document(title_handler);
            engine.visit(&url);
            assert_eq!(engine.wait().await, vec!["Cached"]);
        }
    }
}
