use async_trait::async_trait;

use super::{Channel, SendError};

/// Channel that logs messages instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

#[async_trait]
impl Channel for LogChannel {
    async fn send(&self, text: &str) -> Result<(), SendError> {
        log::info!("[DRY RUN] {}", text.replace('\n', " | "));
        Ok(())
    }
}
