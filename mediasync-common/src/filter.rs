//! Merge metadata into feed records and apply the minimum-duration filter

use crate::models::{non_blank, DurationDetails, VideoRecord};
use std::collections::HashMap;

/// Apply looked-up details to feed records, preserving feed order.
///
/// Records whose id was not recognized keep unknown durations. Non-blank
/// title, description and thumbnail from the details replace the feed values.
pub fn merge_details(
    records: Vec<VideoRecord>,
    details: &HashMap<String, DurationDetails>,
) -> Vec<VideoRecord> {
    records
        .into_iter()
        .map(|mut record| {
            if let Some(found) = details.get(&record.video_id) {
                record.duration_iso = found.duration_iso.clone();
                record.duration_seconds = Some(found.duration_seconds);
                if let Some(title) = non_blank(found.title.as_deref()) {
                    record.title = Some(title);
                }
                if let Some(description) = non_blank(found.description.as_deref()) {
                    record.description = Some(description);
                }
                if let Some(thumbnail) = non_blank(found.thumbnail_url.as_deref()) {
                    record.thumbnail_url = thumbnail;
                }
            }
            record
        })
        .collect()
}

/// Unknown durations always pass
pub fn passes_min_duration(record: &VideoRecord, min_duration_secs: u64) -> bool {
    record
        .duration_seconds
        .map_or(true, |secs| secs >= min_duration_secs)
}

/// Keep records that pass [`passes_min_duration`]
pub fn retain_min_duration(records: Vec<VideoRecord>, min_duration_secs: u64) -> Vec<VideoRecord> {
    let before = records.len();
    let kept: Vec<VideoRecord> = records
        .into_iter()
        .filter(|r| passes_min_duration(r, min_duration_secs))
        .collect();
    tracing::debug!(
        before,
        after = kept.len(),
        min_duration_secs,
        "Applied duration filter"
    );
    kept
}
