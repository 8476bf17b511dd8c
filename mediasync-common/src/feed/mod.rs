//! Feed entry extraction
//!
//! Turns a channel feed body into [`VideoRecord`]s without duration fields.
//! The body is parsed structurally with `feed-rs`; every field is then looked
//! up through an ordered list of strategies and the first non-blank answer
//! wins. The video id comes only from the entry's `videoId` element,
//! `yt:`-namespaced first and bare second (see [`video_ids`]). When the
//! structural parser rejects the body, extraction degrades to a substring
//! scan of the `<entry>` elements (see [`scan`]).
//!
//! Entries without a video id are skipped. Missing optional fields never
//! abort an entry or its siblings. `max_items` counts emitted records, not
//! raw entries.

mod scan;
mod video_ids;

use crate::models::{non_blank, VideoRecord};
use crate::{Error, Result};
use feed_rs::model::Entry;
use video_ids::{collect_video_ids, VideoIdCandidates};

type Lookup = fn(&Entry) -> Option<String>;

const TITLE_LOOKUPS: &[Lookup] = &[title_from_entry, title_from_media_group];
const DESCRIPTION_LOOKUPS: &[Lookup] = &[description_from_media_group, description_from_summary];
const PUBLISHED_LOOKUPS: &[Lookup] = &[published_from_entry];
const THUMBNAIL_LOOKUPS: &[Lookup] = &[thumbnail_from_media_group];

/// Extract records from a raw feed body, keeping at most `max_items`.
///
/// Fails with [`Error::FeedParse`] only when the body can be read neither
/// structurally nor by the substring scan.
pub fn extract_records(body: &[u8], max_items: Option<usize>) -> Result<Vec<VideoRecord>> {
    let records: Vec<VideoRecord> = match feed_rs::parser::parse(body) {
        Ok(feed) => {
            let ids = collect_video_ids(body);
            if ids.len() != feed.entries.len() {
                tracing::warn!(
                    entries = feed.entries.len(),
                    id_slots = ids.len(),
                    "Entry count differs between parsers; unmatched entries have no video id"
                );
            }
            feed.entries
                .iter()
                .enumerate()
                .filter_map(|(index, entry)| {
                    let video_id = ids.get(index).and_then(VideoIdCandidates::resolve);
                    record_from_entry(entry, video_id)
                })
                .collect()
        }
        Err(parse_err) => {
            let text = String::from_utf8_lossy(body);
            if !scan::has_entries(&text) {
                return Err(Error::FeedParse(parse_err.to_string()));
            }
            tracing::warn!(
                error = %parse_err,
                "Structured feed parse failed, falling back to substring scan"
            );
            scan::scan_records(&text)
        }
    };

    Ok(match max_items {
        Some(n) => records.into_iter().take(n).collect(),
        None => records,
    })
}

fn record_from_entry(entry: &Entry, video_id: Option<String>) -> Option<VideoRecord> {
    let Some(video_id) = video_id else {
        tracing::debug!(entry_id = %entry.id, "Skipping feed entry without a video id");
        return None;
    };

    let mut record = VideoRecord::new(&video_id)?;
    record.title = first_match(entry, TITLE_LOOKUPS);
    record.description = first_match(entry, DESCRIPTION_LOOKUPS);
    record.published_at = first_match(entry, PUBLISHED_LOOKUPS);
    if let Some(thumbnail) = first_match(entry, THUMBNAIL_LOOKUPS) {
        record.thumbnail_url = thumbnail;
    }
    Some(record)
}

fn first_match(entry: &Entry, lookups: &[Lookup]) -> Option<String> {
    lookups
        .iter()
        .find_map(|lookup| lookup(entry).and_then(|v| non_blank(Some(&v))))
}

fn title_from_entry(entry: &Entry) -> Option<String> {
    entry.title.as_ref().map(|t| t.content.clone())
}

fn title_from_media_group(entry: &Entry) -> Option<String> {
    entry
        .media
        .iter()
        .find_map(|m| m.title.as_ref().map(|t| t.content.clone()))
}

fn description_from_media_group(entry: &Entry) -> Option<String> {
    entry
        .media
        .iter()
        .find_map(|m| m.description.as_ref().map(|d| d.content.clone()))
}

fn description_from_summary(entry: &Entry) -> Option<String> {
    entry.summary.as_ref().map(|s| s.content.clone())
}

fn published_from_entry(entry: &Entry) -> Option<String> {
    entry.published.map(|p| p.to_rfc3339())
}

fn thumbnail_from_media_group(entry: &Entry) -> Option<String> {
    entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .find(|uri| !uri.trim().is_empty())
}
