//! Notification delivery.
//!
//! A [`Channel`] sends one preformatted text. The [`Dispatcher`] owns the
//! message template and the rate-limit retry policy; a channel only reports
//! whether the provider asked it to back off.

mod dry_run;
mod telegram;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Announcement, NotifierConfig};

pub use dry_run::LogChannel;
pub use telegram::TelegramChannel;

/// Why a channel could not deliver a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The provider asked to wait before sending again
    #[error("rate limited, retry after {0:?}")]
    RateLimited(Duration),

    /// Any other failure; not retried
    #[error("{0}")]
    Failed(String),
}

impl SendError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[async_trait]
pub trait Channel: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), SendError>;
}

/// Outcome of one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent { attempts: u32 },
    /// Still rate limited after the last allowed attempt
    Abandoned { attempts: u32 },
    Failed,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent { .. })
    }
}

pub struct Dispatcher<C> {
    channel: C,
    max_attempts: u32,
    template: String,
}

impl<C: Channel> Dispatcher<C> {
    pub fn new(channel: C, config: &NotifierConfig) -> Self {
        Self {
            channel,
            max_attempts: config.max_attempts.max(1),
            template: config.message_template.clone(),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn format_message(&self, title: &str, source: &str, announcement: &Announcement) -> String {
        announcement.format(&self.template, title, source)
    }

    /// Send one announcement, sleeping through rate-limit cooldowns.
    ///
    /// Never returns an error: failures are logged and reported through the
    /// returned [`Delivery`] so the sweep carries on with the next item.
    pub async fn notify(&self, title: &str, source: &str, announcement: &Announcement) -> Delivery {
        let text = self.format_message(title, source, announcement);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.channel.send(&text).await {
                Ok(()) => {
                    log::info!(
                        "Notified {} [{}] (attempt {})",
                        source,
                        announcement.reference,
                        attempt
                    );
                    return Delivery::Sent { attempts: attempt };
                }
                Err(SendError::RateLimited(cooldown)) => {
                    if attempt >= self.max_attempts {
                        log::warn!(
                            "Giving up on {} [{}] after {} rate-limited attempts",
                            source,
                            announcement.reference,
                            attempt
                        );
                        return Delivery::Abandoned { attempts: attempt };
                    }
                    log::warn!(
                        "Rate limited while notifying {} [{}], retrying in {:?}",
                        source,
                        announcement.reference,
                        cooldown
                    );
                    tokio::time::sleep(cooldown).await;
                }
                Err(SendError::Failed(e)) => {
                    log::warn!(
                        "Notification failed for {} [{}]: {}",
                        source,
                        announcement.reference,
                        e
                    );
                    return Delivery::Failed;
                }
            }
        }
    }
}
