// src/utils/http.rs

//! HTTP client utilities.

use reqwest::Client;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Create the HTTP client shared by every fetch engine.
///
/// Robots directives are never consulted and redirects are followed with
/// reqwest's default policy. Certificate validation follows
/// `accept_invalid_certs`.
pub fn create_client(config: &CrawlerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()?;
    Ok(client)
}
