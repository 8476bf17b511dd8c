//! Video metadata API client
//!
//! Looks up durations and snippets for feed videos. Ids are sent in batches
//! of at most [`MAX_IDS_PER_REQUEST`] with a short pause between batches. A
//! failed batch is logged and skipped; its ids stay unknown.

use crate::config::MetadataConfig;
use crate::duration::parse_iso_duration;
use crate::error::body_excerpt;
use crate::models::{non_blank, DurationDetails};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::USER_AGENT;

/// Upstream limit on ids per `videos` request
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// Parts requested by default: duration plus the snippet used for enrichment
pub const VIDEO_PARTS: &str = "snippet,contentDetails";
/// Duration only
pub const DURATION_PARTS: &str = "contentDetails";

const METADATA_TIMEOUT_SECS: u64 = 10;
const BATCH_PAUSE_MS: u64 = 100;

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: Option<String>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

impl Thumbnails {
    /// "high" when present, else "default"
    fn best_url(&self) -> Option<String> {
        let url = |t: &Option<Thumbnail>| t.as_ref().and_then(|t| non_blank(t.url.as_deref()));
        url(&self.high).or_else(|| url(&self.default))
    }
}

/// Split ids into request-sized batches
pub fn batches(ids: &[String]) -> std::slice::Chunks<'_, String> {
    ids.chunks(MAX_IDS_PER_REQUEST)
}

/// Metadata API client
pub struct MetadataClient {
    http_client: reqwest::Client,
    config: MetadataConfig,
    parts: &'static str,
    batch_pause: Duration,
}

impl MetadataClient {
    pub fn new(config: MetadataConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(METADATA_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            config,
            parts: VIDEO_PARTS,
            batch_pause: Duration::from_millis(BATCH_PAUSE_MS),
        })
    }

    /// Override the `part` list sent with every request
    pub fn with_parts(mut self, parts: &'static str) -> Self {
        self.parts = parts;
        self
    }

    /// Override the pause between batch requests
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    /// Look up every id the API recognizes.
    ///
    /// Ids the API does not return are absent from the map. Failed batches
    /// are logged and skipped.
    pub async fn fetch_details(&self, ids: &[String]) -> HashMap<String, DurationDetails> {
        let mut details = HashMap::new();
        if ids.is_empty() {
            return details;
        }

        for (index, batch) in batches(ids).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.batch_pause).await;
            }

            match self.fetch_batch(index, batch).await {
                Ok(items) => {
                    if items.is_empty() {
                        tracing::warn!(batch = index, "No items returned for batch");
                    }
                    details.extend(items.into_iter().filter_map(details_from_item));
                }
                Err(e) => {
                    tracing::error!(batch = index, ids = batch.len(), error = %e, "Metadata request failed for batch");
                }
            }
        }

        tracing::info!(
            requested = ids.len(),
            recognized = details.len(),
            "Metadata lookup complete"
        );
        details
    }

    async fn fetch_batch(&self, index: usize, ids: &[String]) -> Result<Vec<VideoItem>> {
        let batch_error = |message: String| Error::EnrichmentBatch {
            batch: index,
            message,
        };

        let url = format!("{}/videos", self.config.base_url);
        let joined = ids.join(",");
        tracing::debug!(batch = index, ids = ids.len(), "Querying metadata API");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("part", self.parts),
                ("id", joined.as_str()),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| batch_error(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(batch_error(format!(
                "API error {}: {}",
                status.as_u16(),
                body_excerpt(&text)
            )));
        }

        let list: VideoListResponse = response
            .json()
            .await
            .map_err(|e| batch_error(format!("parse error: {}", e)))?;
        Ok(list.items)
    }
}

fn details_from_item(item: VideoItem) -> Option<(String, DurationDetails)> {
    let id = non_blank(item.id.as_deref())?;
    let duration_iso = item
        .content_details
        .and_then(|c| non_blank(c.duration.as_deref()));
    let duration_seconds = parse_iso_duration(duration_iso.as_deref());

    let (title, description, thumbnail_url) = match item.snippet {
        Some(snippet) => (
            snippet.title,
            snippet.description,
            snippet.thumbnails.best_url(),
        ),
        None => (None, None, None),
    };

    Some((
        id,
        DurationDetails {
            duration_iso,
            duration_seconds,
            title,
            description,
            thumbnail_url,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: serde_json::Value) -> VideoItem {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_batches_never_exceed_limit() {
        let ids: Vec<String> = (0..120).map(|i| format!("id{}", i)).collect();
        let sizes: Vec<usize> = batches(&ids).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_batch() {
        let ids: Vec<String> = (0..100).map(|i| format!("id{}", i)).collect();
        assert_eq!(batches(&ids).count(), 2);
    }

    #[test]
    fn test_details_prefer_high_thumbnail() {
        let (id, details) = details_from_item(item(serde_json::json!({
            "id": "abc",
            "contentDetails": { "duration": "PT4M5S" },
            "snippet": {
                "title": "Title",
                "description": "Desc",
                "thumbnails": {
                    "default": { "url": "https://i.ytimg.com/default.jpg" },
                    "high": { "url": "https://i.ytimg.com/high.jpg" }
                }
            }
        })))
        .unwrap();

        assert_eq!(id, "abc");
        assert_eq!(details.duration_iso.as_deref(), Some("PT4M5S"));
        assert_eq!(details.duration_seconds, 245);
        assert_eq!(details.title.as_deref(), Some("Title"));
        assert_eq!(
            details.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/high.jpg")
        );
    }

    #[test]
    fn test_details_fall_back_to_default_thumbnail() {
        let (_, details) = details_from_item(item(serde_json::json!({
            "id": "abc",
            "snippet": { "thumbnails": { "default": { "url": "https://i.ytimg.com/default.jpg" } } }
        })))
        .unwrap();
        assert_eq!(
            details.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/default.jpg")
        );
    }

    #[test]
    fn test_missing_duration_parses_as_zero() {
        let (_, details) = details_from_item(item(serde_json::json!({ "id": "live" }))).unwrap();
        assert_eq!(details.duration_iso, None);
        assert_eq!(details.duration_seconds, 0);
        assert_eq!(details.thumbnail_url, None);
    }

    #[test]
    fn test_parts_default_and_override() {
        let config = MetadataConfig {
            api_key: "key".to_string(),
            base_url: "http://localhost".to_string(),
        };
        let client = MetadataClient::new(config).unwrap();
        assert_eq!(client.parts, VIDEO_PARTS);
        assert_eq!(client.with_parts(DURATION_PARTS).parts, "contentDetails");
    }

    #[test]
    fn test_item_without_id_is_dropped() {
        assert!(details_from_item(item(serde_json::json!({ "snippet": {} }))).is_none());
    }
}
