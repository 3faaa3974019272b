//! Per-domain request spacing.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hands out request slots so that two requests to the same domain start at
/// least `delay` apart, whatever the number of concurrent fetches.
#[derive(Debug)]
pub struct DomainThrottle {
    delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl DomainThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the next free slot on `domain`.
    pub async fn acquire(&self, domain: &str) {
        if self.delay.is_zero() {
            return;
        }

        let start = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let start = match slots.get(domain) {
                Some(&next) if next > now => next,
                _ => now,
            };
            slots.insert(domain.to_string(), start + self.delay);
            start
        };

        tokio::time::sleep_until(start).await;
    }
}
