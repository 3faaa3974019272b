// src/pipeline/schedule.rs

//! Sweep loop: crawl every source, notify what is new, sleep, repeat.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Announcement;
use crate::notify::{Channel, Delivery, Dispatcher};
use crate::pipeline::{Orchestrator, SeenStore};
use crate::utils::report;

/// Counters for one sweep over the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: usize,
    pub discovered: usize,
    pub new: usize,
    pub sent: usize,
    pub abandoned: usize,
    pub failed: usize,
}

impl SweepReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            sources: 0,
            discovered: 0,
            new: 0,
            sent: 0,
            abandoned: 0,
            failed: 0,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Sent { .. } => self.sent += 1,
            Delivery::Abandoned { .. } => self.abandoned += 1,
            Delivery::Failed => self.failed += 1,
        }
    }

    pub fn log(&self) {
        report::summary(
            "Sweep",
            &[
                ("Started", self.started_at.to_rfc3339()),
                ("Sources", self.sources.to_string()),
                ("Discovered", self.discovered.to_string()),
                ("New", self.new.to_string()),
                ("Sent", self.sent.to_string()),
                ("Abandoned", self.abandoned.to_string()),
                ("Failed", self.failed.to_string()),
                (
                    "Duration",
                    format!("{:.1}s", self.duration().num_milliseconds() as f64 / 1000.0),
                ),
            ],
        );
    }
}

pub struct Scheduler<C> {
    orchestrator: Orchestrator,
    dispatcher: Dispatcher<C>,
    store: SeenStore,
    interval: Duration,
}

impl<C: Channel> Scheduler<C> {
    pub fn new(orchestrator: Orchestrator, dispatcher: Dispatcher<C>, interval: Duration) -> Self {
        Self {
            orchestrator,
            dispatcher,
            store: SeenStore::new(),
            interval,
        }
    }

    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    /// Sweep forever, pausing `interval` between sweeps.
    pub async fn run(&mut self) {
        report::header("Listing watch");
        log::info!(
            "Watching {} source(s) every {} min",
            self.orchestrator.catalog().len(),
            self.interval.as_secs() / 60
        );

        loop {
            self.sweep().await;
            log::info!("Next sweep in {:?}", self.interval);
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Crawl every source once, in catalog order, and notify new listings.
    pub async fn sweep(&mut self) -> SweepReport {
        let mut sweep = SweepReport::start();

        for source in self.orchestrator.catalog().iter() {
            let found = self.orchestrator.scrape_source(source).await;
            let discovered = found.len();
            let fresh = self.store.diff(&source.name, found);
            log::info!(
                "{}: {} listing(s), {} new",
                source.name,
                discovered,
                fresh.len()
            );

            sweep.sources += 1;
            sweep.discovered += discovered;
            sweep.new += fresh.len();

            for announcement in &fresh {
                log_new(&source.name, announcement);
                let delivery = self
                    .dispatcher
                    .notify(&source.title, &source.name, announcement)
                    .await;
                sweep.record(delivery);
            }
        }

        sweep.finished_at = Utc::now();
        sweep.log();
        sweep
    }
}

fn log_new(source: &str, announcement: &Announcement) {
    if announcement.url.is_empty() {
        log::info!("New listing on {}: {}", source, announcement.reference);
    } else {
        log::info!(
            "New listing on {}: {} ({})",
            source,
            announcement.reference,
            announcement.url
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::adapters::AdapterRegistry;
    use crate::models::{CrawlerConfig, NotifierConfig, SourceCatalog, SourceConfig, SourceSelectors};
    use crate::notify::SendError;

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Channel for Recorder {
        async fn send(&self, text: &str) -> Result<(), SendError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    async fn serve(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    /// Serve an index listing `refs`, each with its own detail page.
    async fn publish(server: &MockServer, refs: &[&str]) {
        server.reset().await;
        let rows: String = refs
            .iter()
            .map(|r| format!("<li class='ad'><a href='/annonce/{r}'>{r}</a></li>"))
            .collect();
        serve(server, "/annonces", format!("<ul>{rows}</ul>")).await;
        for r in refs {
            serve(
                server,
                &format!("/annonce/{r}"),
                format!("<div class='ref'>Réf : {r}</div>"),
            )
            .await;
        }
    }

    fn scheduler(server: &MockServer, recorder: Recorder) -> Scheduler<Recorder> {
        let sources = vec![SourceConfig {
            name: "agency".to_string(),
            title: Some("Agency".to_string()),
            index_url: format!("{}/annonces", server.uri()),
            adapter: None,
            selectors: Some(SourceSelectors::new("li.ad", "div.ref", "Réf :")),
        }];
        let catalog = SourceCatalog::bind_all(&sources, &AdapterRegistry::new()).unwrap();
        let crawler = CrawlerConfig {
            request_delay_ms: 0,
            ..CrawlerConfig::default()
        };
        let notifier = NotifierConfig {
            message_template: "{title} {reference}".to_string(),
            ..NotifierConfig::default()
        };

        Scheduler::new(
            Orchestrator::new(crawler, catalog).unwrap(),
            Dispatcher::new(recorder, &notifier),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn notifies_only_new_listings_across_sweeps() {
        let server = MockServer::start().await;
        let recorder = Recorder::default();
        let mut scheduler = scheduler(&server, recorder.clone());

        publish(&server, &["A", "B"]).await;
        let first = scheduler.sweep().await;
        assert_eq!((first.discovered, first.new, first.sent), (2, 2, 2));

        publish(&server, &["A", "B", "C"]).await;
        let second = scheduler.sweep().await;
        assert_eq!((second.discovered, second.new, second.sent), (3, 1, 1));

        let mut sent = recorder.sent.lock().unwrap().clone();
        assert_eq!(sent.pop().as_deref(), Some("Agency C"));
        sent.sort();
        assert_eq!(sent, vec!["Agency A", "Agency B"]);
        assert_eq!(scheduler.store().seen_count("agency"), 3);
    }

    #[tokio::test]
    async fn unreachable_source_is_retried_next_sweep() {
        let server = MockServer::start().await;
        let recorder = Recorder::default();
        let mut scheduler = scheduler(&server, recorder.clone());

        let down = scheduler.sweep().await;
        assert_eq!((down.sources, down.discovered, down.sent), (1, 0, 0));

        publish(&server, &["A"]).await;
        let up = scheduler.sweep().await;
        assert_eq!(up.sent, 1);
        assert!(up.duration() >= chrono::Duration::zero());
    }
}
