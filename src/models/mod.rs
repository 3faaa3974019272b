// src/models/mod.rs

//! Domain models for the listing watcher.

mod announcement;
mod config;
mod selectors;
mod source;

// Re-export all public types
pub use announcement::Announcement;
pub use config::{
    Config, CrawlerConfig, ENV_BOT_TOKEN, ENV_CHANNEL, NotifierConfig, SchedulerConfig,
};
pub use selectors::SourceSelectors;
pub use source::{Source, SourceCatalog, SourceConfig};
