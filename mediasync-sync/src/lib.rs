//! mediasync-sync library
//!
//! Fetch the channel feed, optionally enrich it from the metadata API, drop
//! videos shorter than the threshold and upsert the rest into the store.

pub mod job;

pub use job::{run, SyncOutcome, SyncReport, DRY_RUN_PREVIEW_ROWS};
