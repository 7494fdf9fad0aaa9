use crate::error::FetchError;
use async_trait::async_trait;

/// Source of raw catalogue pages.
/// The crawl driver only talks to this, so tests can serve pages from memory.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Download the document at `url`
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
