//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Environment variable overriding `notifier.bot_token`.
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable overriding `notifier.channel`.
pub const ENV_CHANNEL: &str = "TELEGRAM_CHANNEL";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Notification channel settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Sweep cadence
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Monitored sources, swept in declaration order
    #[serde(default = "defaults::sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or return the default when the file does not exist.
    ///
    /// Any other failure (unreadable file, malformed TOML, missing field) is
    /// an error: falling back would silently drop the configured sources.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(&path) {
            Err(AppError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!(
                    "Config file {:?} not found. Using defaults.",
                    path.as_ref()
                );
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// Apply credential overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply credential overrides from an arbitrary lookup.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe a token set in the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(ENV_BOT_TOKEN) {
            self.notifier.bot_token = token;
        }
        if let Some(channel) = non_empty(ENV_CHANNEL) {
            self.notifier.channel = channel;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.notifier.max_attempts == 0 {
            return Err(AppError::validation("notifier.max_attempts must be > 0"));
        }
        if self.scheduler.interval_minutes == 0 {
            return Err(AppError::validation(
                "scheduler.interval_minutes must be > 0",
            ));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(AppError::validation("Source with empty name"));
            }
            if !names.insert(source.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate source name '{}'",
                    source.name
                )));
            }
            url::Url::parse(&source.index_url).map_err(|e| {
                AppError::validation(format!(
                    "Source '{}' has an invalid index_url '{}': {}",
                    source.name, source.index_url, e
                ))
            })?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            notifier: NotifierConfig::default(),
            scheduler: SchedulerConfig::default(),
            sources: defaults::sources(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Minimum spacing between two requests to the same domain, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent requests per crawl phase
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Skip TLS certificate validation (agencies often serve broken chains)
    #[serde(default = "defaults::accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    /// Directory for the response cache; caching is off when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// How long a cached response stays valid, in seconds
    #[serde(default = "defaults::cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            accept_invalid_certs: defaults::accept_invalid_certs(),
            cache_dir: None,
            cache_ttl_secs: defaults::cache_ttl(),
        }
    }
}

/// Telegram notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Bot token; usually supplied through `TELEGRAM_BOT_TOKEN`
    #[serde(default)]
    pub bot_token: String,

    /// Destination chat or public channel (`@name`)
    #[serde(default)]
    pub channel: String,

    /// Total send attempts for one message while the API keeps rate limiting
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Message template.
    ///
    /// Supported placeholders: `{title}`, `{source}`, `{reference}`, `{url}`.
    #[serde(default = "defaults::message_template")]
    pub message_template: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            bot_token: String::new(),
            channel: String::new(),
            max_attempts: defaults::max_attempts(),
            message_template: defaults::message_template(),
        }
    }
}

/// Sweep cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Pause between two full sweeps, in minutes
    #[serde(default = "defaults::interval_minutes")]
    pub interval_minutes: u64,
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: defaults::interval_minutes(),
        }
    }
}

mod defaults {
    use crate::models::SourceConfig;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/91.0.4472.124 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        2_000
    }
    pub fn max_concurrent() -> usize {
        2
    }
    pub fn accept_invalid_certs() -> bool {
        true
    }
    pub fn cache_ttl() -> u64 {
        300
    }

    // Notifier defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn max_attempts() -> u32 {
        5
    }
    pub fn message_template() -> String {
        "Nouvelle annonce : {title}\nRéférence : {reference}\n{url}".into()
    }

    // Scheduler defaults
    pub fn interval_minutes() -> u64 {
        15
    }

    // Source defaults
    pub fn sources() -> Vec<SourceConfig> {
        vec![SourceConfig {
            name: "afedim".to_string(),
            title: None,
            index_url: "https://www.afedim.fr/fr/location/annonces/Appartement-Maison-Parking-Garage/Rennes-France/1-5-pieces/surface-0-100-m2/budget-0-90000-euros/rayon-10-km/disponible-/options-/exclusPlafondRess-/Resultats".to_string(),
            adapter: None,
            selectors: None,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_sources() {
        let mut config = Config::default();
        let duplicate = config.sources[0].clone();
        config.sources.push(duplicate);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_index_url() {
        let mut config = Config::default();
        config.sources[0].index_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn politeness_defaults() {
        let crawler = CrawlerConfig::default();
        assert_eq!(crawler.max_concurrent, 2);
        assert_eq!(crawler.request_delay(), Duration::from_secs(2));
        assert!(crawler.accept_invalid_certs);
        assert!(crawler.cache_dir.is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [scheduler]
            interval_minutes = 5

            [[sources]]
            name = "giboire"
            index_url = "https://www.giboire.com/recherche-location/"
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.interval(), Duration::from_secs(300));
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].adapter_key(), "giboire");
        assert_eq!(config.notifier.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].name, "afedim");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [[sources]]
            name = "giboire"
            index_url = "https://www.giboire.com/recherche-location/"

            [[sources]]
            name = "foncia"
            "#,
        )
        .unwrap();

        assert!(matches!(
            Config::load_or_default(&path),
            Err(AppError::Toml(_))
        ));
    }

    #[test]
    fn huge_interval_saturates() {
        let scheduler = SchedulerConfig {
            interval_minutes: u64::MAX,
        };
        assert_eq!(scheduler.interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn env_overrides_credentials() {
        let mut config = Config::default();
        config.notifier.channel = "@from_file".to_string();

        config.apply_overrides(|key| match key {
            ENV_BOT_TOKEN => Some("123:abc".to_string()),
            ENV_CHANNEL => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.notifier.bot_token, "123:abc");
        assert_eq!(config.notifier.channel, "@from_file");
    }
}
