//! Channel feed host

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::{Arc, RwLock};

#[derive(Debug, Deserialize)]
struct FeedParams {
    #[serde(default)]
    channel_id: String,
}

struct FeedResponse {
    status: StatusCode,
    body: String,
}

/// Feed body served to every request, plus the channel ids requested
pub struct FeedState {
    response: RwLock<FeedResponse>,
    requested: RwLock<Vec<String>>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            response: RwLock::new(FeedResponse {
                status: StatusCode::OK,
                body: crate::fixtures::empty_feed(),
            }),
            requested: RwLock::new(Vec::new()),
        }
    }
}

impl FeedState {
    /// Serve `body` with 200 OK
    pub fn set_body(&self, body: impl Into<String>) {
        self.set_response(200, body);
    }

    /// Serve `body` with an arbitrary status
    pub fn set_response(&self, status: u16, body: impl Into<String>) {
        let mut response = self.response.write().unwrap();
        response.status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        response.body = body.into();
    }

    /// Channel ids of every feed request so far
    pub fn requested_channels(&self) -> Vec<String> {
        self.requested.read().unwrap().clone()
    }
}

async fn get_feed(
    State(state): State<Arc<FeedState>>,
    Query(params): Query<FeedParams>,
) -> impl IntoResponse {
    state.requested.write().unwrap().push(params.channel_id);
    let response = state.response.read().unwrap();
    (
        response.status,
        [(header::CONTENT_TYPE, "application/atom+xml; charset=UTF-8")],
        response.body.clone(),
    )
}

pub fn create_router(state: Arc<FeedState>) -> Router {
    Router::new()
        .route("/feeds/videos.xml", get(get_feed))
        .with_state(state)
}
