//! On-disk response cache.
//!
//! Bodies are stored as `{dir}/{sha256(url)}.html`; an entry older than the
//! configured time-to-live is ignored and overwritten by the next fetch. The
//! cache is best effort: read or write failures only fall back to the network.

use std::path::PathBuf;
use std::time::Duration;

use sha2::{Digest, Sha256};
use url::Url;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    fn path(&self, url: &Url) -> PathBuf {
        let digest = Sha256::digest(url.as_str().as_bytes());
        self.dir.join(format!("{}.html", hex::encode(digest)))
    }

    /// Cached body for `url`, if present and fresh.
    pub async fn get(&self, url: &Url) -> Option<String> {
        let path = self.path(url);
        let metadata = tokio::fs::metadata(&path).await.ok()?;
        let age = metadata.modified().ok()?.elapsed().unwrap_or_default();
        if age > self.ttl {
            return None;
        }
        tokio::fs::read_to_string(&path).await.ok()
    }

    /// Store `body` for `url`.
    pub async fn put(&self, url: &Url, body: &str) {
        if let Err(e) = self.write(url, body).await {
            log::debug!("Cache write failed for {}: {}", url, e);
        }
    }

    /// Write to a temp file, then rename, so readers never see partial bodies.
    async fn write(&self, url: &Url, body: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(url);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
