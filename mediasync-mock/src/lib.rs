//! In-process HTTP mocks for mediasync integration tests
//!
//! One `axum` server answers all three upstreams:
//! - `GET /feeds/videos.xml` (channel feed)
//! - `GET /youtube/v3/videos` (metadata API)
//! - `POST | GET | PATCH /rest/v1/{table}` (PostgREST-style store)
//!
//! State is shared through `Arc`s so tests can seed it before a run and
//! inspect it afterwards.

pub mod feed;
pub mod fixtures;
pub mod metadata;
pub mod store;

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub use feed::FeedState;
pub use metadata::{MetadataState, MockVideo};
pub use store::{StoreRequest, StoreState};

/// Path prefix of the metadata API on the mock server
pub const METADATA_PATH: &str = "/youtube/v3";

/// Shared state of every mocked upstream
#[derive(Clone, Default)]
pub struct MockState {
    pub feed: Arc<FeedState>,
    pub metadata: Arc<MetadataState>,
    pub store: Arc<StoreState>,
}

/// Build the combined router
pub fn create_router(state: MockState) -> Router {
    Router::new()
        .merge(feed::create_router(state.feed.clone()))
        .nest(METADATA_PATH, metadata::create_router(state.metadata.clone()))
        .merge(store::create_router(state.store.clone()))
}

/// Running mock server
pub struct MockServer {
    pub addr: SocketAddr,
    pub state: MockState,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Bind `127.0.0.1:0` and serve `state` in a background task
    pub async fn start(state: MockState) -> std::io::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = create_router(state.clone());

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Base URL for the feed host and the store
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Base URL for the metadata API
    pub fn metadata_base_url(&self) -> String {
        format!("{}{}", self.base_url(), METADATA_PATH)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
