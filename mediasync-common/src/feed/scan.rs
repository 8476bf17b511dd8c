//! Substring scan of `<entry>` elements
//!
//! Degraded path for bodies the structural parser rejects. Tags are looked up
//! namespaced first, then bare.

use crate::models::{non_blank, VideoRecord};
use chrono::{DateTime, Utc};

const VIDEO_ID_TAGS: &[&str] = &["yt:videoId", "videoId"];
const TITLE_TAGS: &[&str] = &["title", "media:title"];
const PUBLISHED_TAGS: &[&str] = &["published"];
const DESCRIPTION_TAGS: &[&str] = &["media:description", "description"];
const THUMBNAIL_TAGS: &[&str] = &["media:thumbnail", "thumbnail"];

pub(super) fn has_entries(text: &str) -> bool {
    entry_chunks(text).next().is_some()
}

pub(super) fn scan_records(text: &str) -> Vec<VideoRecord> {
    entry_chunks(text).filter_map(scan_entry).collect()
}

fn scan_entry(chunk: &str) -> Option<VideoRecord> {
    let video_id = first_text(chunk, VIDEO_ID_TAGS)?;
    let mut record = VideoRecord::new(&video_id)?;

    record.title = first_text(chunk, TITLE_TAGS);
    record.description = first_text(chunk, DESCRIPTION_TAGS);
    record.published_at = first_text(chunk, PUBLISHED_TAGS).map(normalize_timestamp);
    if let Some(thumbnail) = THUMBNAIL_TAGS
        .iter()
        .find_map(|tag| attribute(chunk, tag, "url"))
    {
        record.thumbnail_url = thumbnail;
    }
    Some(record)
}

/// Bodies of `<entry>` / `<entry ...>` elements
fn entry_chunks(text: &str) -> impl Iterator<Item = &str> {
    text.split("<entry")
        .skip(1)
        .filter(|chunk| chunk.starts_with('>') || chunk.starts_with(char::is_whitespace))
        .map(|chunk| chunk.split("</entry>").next().unwrap_or(chunk))
}

fn first_text(chunk: &str, tags: &[&str]) -> Option<String> {
    tags.iter().find_map(|tag| element_text(chunk, tag))
}

/// Position just past `<tag` where the tag name ends
fn open_tag(chunk: &str, tag: &str) -> Option<usize> {
    let needle = format!("<{}", tag);
    let mut from = 0;
    while let Some(pos) = chunk[from..].find(&needle) {
        let end = from + pos + needle.len();
        match chunk[end..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => return Some(end),
            _ => from = end,
        }
    }
    None
}

fn element_text(chunk: &str, tag: &str) -> Option<String> {
    let after_name = open_tag(chunk, tag)?;
    let tag_close = after_name + chunk[after_name..].find('>')?;
    if chunk[..tag_close].ends_with('/') {
        return None;
    }
    let content_start = tag_close + 1;
    let closing = format!("</{}>", tag);
    let content_end = content_start + chunk[content_start..].find(&closing)?;
    non_blank(Some(&unescape(&chunk[content_start..content_end])))
}

fn attribute(chunk: &str, tag: &str, name: &str) -> Option<String> {
    let after_name = open_tag(chunk, tag)?;
    let tag_body = &chunk[after_name..after_name + chunk[after_name..].find('>')?];

    for quote in ['"', '\''] {
        let needle = format!("{}={}", name, quote);
        if let Some(pos) = tag_body.find(&needle) {
            let value_start = pos + needle.len();
            let value_len = tag_body[value_start..].find(quote)?;
            return non_blank(Some(&unescape(&tag_body[value_start..value_start + value_len])));
        }
    }
    None
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Render RFC 3339 timestamps the same way the structured path does
fn normalize_timestamp(raw: String) -> String {
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc).to_rfc3339())
        .unwrap_or(raw)
}
