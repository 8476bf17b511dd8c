//! Video record model and its persisted row shape

use serde::{Deserialize, Serialize};

/// Base for synthesized thumbnail URLs
const THUMBNAIL_BASE_URL: &str = "https://img.youtube.com/vi";

/// Base for watch page URLs
const WATCH_BASE_URL: &str = "https://www.youtube.com/watch";

/// One video extracted from the channel feed, optionally enriched.
///
/// `video_id` is never empty for a record built through [`VideoRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// ISO-8601 timestamp as published by the feed
    pub published_at: Option<String>,
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_iso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

impl VideoRecord {
    /// Create a record with only an id; the thumbnail defaults to the
    /// platform's `hqdefault.jpg` for that id.
    ///
    /// Returns `None` when the id is blank.
    pub fn new(video_id: &str) -> Option<Self> {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return None;
        }
        Some(Self {
            video_id: video_id.to_string(),
            title: None,
            description: None,
            published_at: None,
            thumbnail_url: default_thumbnail_url(video_id),
            duration_iso: None,
            duration_seconds: None,
        })
    }

    /// Watch page URL for this video
    pub fn watch_url(&self) -> String {
        format!("{}?v={}", WATCH_BASE_URL, self.video_id)
    }

    /// Persisted representation of this record
    pub fn to_row(&self) -> StoreRow {
        StoreRow::from(self)
    }
}

/// Thumbnail used when neither the feed nor the metadata API supplies one
pub fn default_thumbnail_url(video_id: &str) -> String {
    format!("{}/{}/hqdefault.jpg", THUMBNAIL_BASE_URL, video_id)
}

/// Row written to the store table.
///
/// Every column is serialized, `None` as `null`, so an upsert replaces all of
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRow {
    pub video_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub published_at: Option<String>,
    /// ISO-8601 duration, or the decimal seconds when only those are known
    pub duration: Option<String>,
    pub duration_seconds: Option<u64>,
}

impl From<&VideoRecord> for StoreRow {
    fn from(record: &VideoRecord) -> Self {
        let duration = non_blank(record.duration_iso.as_deref())
            .or_else(|| record.duration_seconds.map(|secs| secs.to_string()));

        Self {
            video_id: record.video_id.clone(),
            title: non_blank(record.title.as_deref()),
            description: non_blank(record.description.as_deref()),
            thumbnail_url: non_blank(Some(&record.thumbnail_url)),
            published_at: non_blank(record.published_at.as_deref()),
            duration,
            duration_seconds: record.duration_seconds,
        }
    }
}

/// Duration and snippet fields the metadata API knows about one video
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurationDetails {
    pub duration_iso: Option<String>,
    pub duration_seconds: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Trim a value and drop it when nothing is left
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
