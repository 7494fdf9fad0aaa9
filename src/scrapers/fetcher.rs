use crate::error::FetchError;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::CrawlParams;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// reqwest-backed fetcher: one GET per call, fixed timeout, no retries
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(params: &CrawlParams) -> Result<Self> {
        let client = Client::builder()
            .timeout(params.timeout)
            .user_agent(params.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "catalogue returned error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let html = response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        debug!(%url, bytes = html.len(), "downloaded page");
        Ok(html)
    }
}
