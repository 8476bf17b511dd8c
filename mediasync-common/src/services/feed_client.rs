//! Channel feed download

use crate::config::FeedConfig;
use crate::error::body_excerpt;
use crate::feed::extract_records;
use crate::models::VideoRecord;
use crate::{Error, Result};
use std::time::Duration;
use url::Url;

use super::USER_AGENT;

const FEED_PATH: &str = "/feeds/videos.xml";
const FEED_TIMEOUT_SECS: u64 = 15;

/// Downloads and extracts one channel feed
pub struct FeedClient {
    http_client: reqwest::Client,
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Feed URL for the configured channel
    pub fn feed_url(&self) -> Result<Url> {
        let base = format!("{}{}", self.config.base_url, FEED_PATH);
        Url::parse_with_params(&base, &[("channel_id", self.config.channel_id.as_str())])
            .map_err(|e| Error::Config(format!("Invalid feed URL {}: {}", base, e)))
    }

    /// Download the raw feed body
    pub async fn fetch_body(&self) -> Result<Vec<u8>> {
        let url = self.feed_url()?;
        tracing::debug!(url = %url, "Fetching channel feed");

        let response = match self.http_client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                log_network_hints(&url);
                return Err(Error::FeedFetch(format!(
                    "Network error while fetching feed ({}): {}",
                    url, e
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::FeedFetch(format!(
                "Feed request returned {}: {}",
                status.as_u16(),
                body_excerpt(&text)
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::FeedFetch(format!("Failed to read feed body: {}", e)))?;
        Ok(body.to_vec())
    }

    /// Download the feed and extract up to `max_items` records
    pub async fn fetch_records(&self, max_items: Option<usize>) -> Result<Vec<VideoRecord>> {
        let body = self.fetch_body().await?;
        let records = extract_records(&body, max_items)?;
        tracing::info!(
            channel_id = %self.config.channel_id,
            count = records.len(),
            "Extracted feed entries"
        );
        Ok(records)
    }
}

fn log_network_hints(url: &Url) {
    tracing::error!("Possible causes: no internet access from this environment, DNS failure, or proxy/firewall blocking outbound requests.");
    tracing::error!("Quick checks:");
    tracing::error!("  - Can you `curl {}` from this machine?", url);
    tracing::error!("  - Check environment proxy vars: $http_proxy $https_proxy");
    tracing::error!("  - Check /etc/resolv.conf for DNS servers");
}
