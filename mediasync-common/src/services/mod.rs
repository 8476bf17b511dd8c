//! HTTP clients for the feed host, the metadata API and the store

pub mod feed_client;
pub mod metadata_client;
pub mod store_client;

pub use feed_client::FeedClient;
pub use metadata_client::MetadataClient;
pub use store_client::{PatchOutcome, StoreClient, UpsertResponse};

/// User-Agent sent with every outbound request
pub const USER_AGENT: &str = concat!("mediasync/", env!("CARGO_PKG_VERSION"));
