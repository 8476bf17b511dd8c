//! Metadata API `videos` endpoint
//!
//! Answers `videos` lookups from seeded videos, returning only the requested
//! parts. Records every batch of ids and `part` list it receives and can be
//! told to fail chosen batches.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

#[derive(Debug, Deserialize)]
pub struct VideosListParams {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub key: String,
}

/// Seeded video as the API would describe it
#[derive(Debug, Clone, Default)]
pub struct MockVideo {
    pub id: String,
    /// `None` omits `contentDetails.duration` (e.g. upcoming streams)
    pub duration: Option<String>,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
}

impl MockVideo {
    pub fn new(id: &str, duration: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            duration: duration.map(str::to_string),
            title: format!("API title {}", id),
            description: format!("API description {}", id),
            thumbnail_url: Some(format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id)),
        }
    }

    fn to_item(&self, parts: &[&str]) -> Value {
        let mut content_details = json!({});
        if let Some(duration) = &self.duration {
            content_details["duration"] = json!(duration);
        }
        let mut thumbnails = json!({});
        if let Some(url) = &self.thumbnail_url {
            thumbnails["high"] = json!({ "url": url, "width": 480, "height": 360 });
        }
        let mut item = json!({
            "kind": "youtube#video",
            "etag": format!("etag-{}", self.id),
            "id": self.id,
        });
        if parts.contains(&"snippet") {
            item["snippet"] = json!({
                "title": self.title,
                "description": self.description,
                "thumbnails": thumbnails,
            });
        }
        if parts.contains(&"contentDetails") {
            item["contentDetails"] = content_details;
        }
        item
    }
}

/// Videos known to the mock API
#[derive(Default)]
pub struct MetadataState {
    videos: RwLock<HashMap<String, MockVideo>>,
    batches: RwLock<Vec<Vec<String>>>,
    parts: RwLock<Vec<String>>,
    failing_batches: RwLock<HashSet<usize>>,
    required_key: RwLock<Option<String>>,
}

impl MetadataState {
    pub fn add_video(&self, video: MockVideo) {
        self.videos.write().unwrap().insert(video.id.clone(), video);
    }

    /// Answer the zero-based `batch`-th request with 500
    pub fn fail_batch(&self, batch: usize) {
        self.failing_batches.write().unwrap().insert(batch);
    }

    /// Reject requests whose `key` differs with 403
    pub fn require_key(&self, key: &str) {
        *self.required_key.write().unwrap() = Some(key.to_string());
    }

    /// Ids of every request received, in order
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.read().unwrap().clone()
    }

    /// `part` parameter of every request received, in order
    pub fn requested_parts(&self) -> Vec<String> {
        self.parts.read().unwrap().clone()
    }
}

async fn list_videos(
    State(state): State<Arc<MetadataState>>,
    Query(params): Query<VideosListParams>,
) -> impl IntoResponse {
    let ids: Vec<String> = params
        .id
        .split(',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    state.parts.write().unwrap().push(params.part.clone());
    let parts: Vec<&str> = params.part.split(',').map(str::trim).collect();

    let index = {
        let mut batches = state.batches.write().unwrap();
        batches.push(ids.clone());
        batches.len() - 1
    };

    if let Some(key) = state.required_key.read().unwrap().as_ref() {
        if &params.key != key {
            let error = json!({ "error": { "code": 403, "message": "API key not valid" } });
            return (StatusCode::FORBIDDEN, Json(error));
        }
    }

    if state.failing_batches.read().unwrap().contains(&index) {
        let error = json!({ "error": { "code": 500, "message": "Backend Error" } });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(error));
    }

    if ids.len() > 50 {
        let error = json!({ "error": { "code": 400, "message": "Too many ids" } });
        return (StatusCode::BAD_REQUEST, Json(error));
    }

    let videos = state.videos.read().unwrap();
    let items: Vec<Value> = ids
        .iter()
        .filter_map(|id| videos.get(id))
        .map(|video| video.to_item(&parts))
        .collect();

    let response = json!({
        "kind": "youtube#videoListResponse",
        "etag": "mock-etag",
        "pageInfo": { "totalResults": items.len(), "resultsPerPage": items.len() },
        "items": items,
    });
    (StatusCode::OK, Json(response))
}

pub fn create_router(state: Arc<MetadataState>) -> Router {
    Router::new()
        .route("/videos", get(list_videos))
        .with_state(state)
}
