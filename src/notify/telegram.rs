//! Telegram Bot API channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{Channel, SendError};
use crate::error::{AppError, Result};
use crate::models::{ENV_BOT_TOKEN, ENV_CHANNEL, NotifierConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cooldown used when a 429 carries no `retry_after`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Posts messages to one chat or public channel through a bot.
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramChannel {
    /// Check the credentials with `getMe` and return a ready channel.
    ///
    /// Missing or rejected credentials are fatal.
    pub async fn connect(config: &NotifierConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(AppError::notifier(format!(
                "no bot token configured (set notifier.bot_token or {ENV_BOT_TOKEN})"
            )));
        }
        if config.channel.trim().is_empty() {
            return Err(AppError::notifier(format!(
                "no channel configured (set notifier.channel or {ENV_CHANNEL})"
            )));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let channel = Self {
            client,
            endpoint: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                config.bot_token.trim()
            ),
            chat_id: config.channel.trim().to_string(),
        };

        let me = channel.get_me().await?;
        log::info!(
            "Telegram bot @{} ready, posting to {}",
            me.username.as_deref().unwrap_or("?"),
            channel.chat_id
        );
        Ok(channel)
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    async fn get_me(&self) -> Result<BotUser> {
        // Errors are stripped of their URL: it embeds the token.
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| AppError::notifier(format!("getMe failed: {}", e.without_url())))?;
        let status = response.status();
        let body: ApiResponse<BotUser> = response.json().await.map_err(|e| {
            AppError::notifier(format!("getMe returned HTTP {status}: {}", e.without_url()))
        })?;

        match body {
            ApiResponse {
                ok: true,
                result: Some(user),
                ..
            } => Ok(user),
            ApiResponse { description, .. } => Err(AppError::notifier(format!(
                "bot credentials rejected: {}",
                description.unwrap_or_else(|| format!("HTTP {status}"))
            ))),
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn send(&self, text: &str) -> std::result::Result<(), SendError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            .map_err(|e| SendError::failed(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .json::<ApiResponse<serde_json::Value>>()
            .await
            .ok();

        if status.is_success() && body.as_ref().is_some_and(|b| b.ok) {
            return Ok(());
        }

        let retry_after = body
            .as_ref()
            .and_then(|b| b.parameters.as_ref())
            .and_then(|p| p.retry_after)
            .map(Duration::from_secs);
        match retry_after {
            Some(cooldown) => Err(SendError::RateLimited(cooldown)),
            None if status == StatusCode::TOO_MANY_REQUESTS => {
                Err(SendError::RateLimited(DEFAULT_RETRY_AFTER))
            }
            None => Err(SendError::failed(
                body.and_then(|b| b.description)
                    .unwrap_or_else(|| format!("HTTP {status}")),
            )),
        }
    }
}
