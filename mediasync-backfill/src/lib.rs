//! mediasync-backfill library
//!
//! Finds stored videos without a duration, looks the durations up in the
//! metadata API and patches each row individually.

pub mod job;

pub use job::{run, BackfillReport};
