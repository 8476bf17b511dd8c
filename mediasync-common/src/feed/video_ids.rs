//! Per-entry `videoId` elements
//!
//! `feed-rs` drops extension elements, so the ids are read in a separate
//! namespace-aware pass with `quick-xml`, one slot per `<entry>` in document
//! order.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

/// Namespace of the `yt:` extension elements
const YT_NAMESPACE: &[u8] = b"http://www.youtube.com/xml/schemas/2015";
const YT_PREFIX: &[u8] = b"yt";

const ENTRY: &[u8] = b"entry";
const VIDEO_ID: &[u8] = b"videoId";

/// `videoId` values found inside one entry
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(super) struct VideoIdCandidates {
    /// `{yt namespace}videoId`
    pub namespaced: Option<String>,
    /// `videoId` in any other namespace, or none
    pub bare: Option<String>,
}

type IdLookup = fn(&VideoIdCandidates) -> Option<&String>;

const VIDEO_ID_LOOKUPS: &[IdLookup] = &[namespaced_id, bare_id];

fn namespaced_id(candidates: &VideoIdCandidates) -> Option<&String> {
    candidates.namespaced.as_ref()
}

fn bare_id(candidates: &VideoIdCandidates) -> Option<&String> {
    candidates.bare.as_ref()
}

impl VideoIdCandidates {
    /// Namespaced first, then bare
    pub fn resolve(&self) -> Option<String> {
        VIDEO_ID_LOOKUPS
            .iter()
            .filter_map(|lookup| lookup(self))
            .map(|id| id.trim())
            .find(|id| !id.is_empty())
            .map(str::to_string)
    }
}

enum IdKind {
    Namespaced,
    Bare,
}

fn classify(ns: &ResolveResult<'_>) -> IdKind {
    match ns {
        ResolveResult::Bound(Namespace(uri)) if *uri == YT_NAMESPACE => IdKind::Namespaced,
        ResolveResult::Unknown(prefix) if prefix.as_slice() == YT_PREFIX => IdKind::Namespaced,
        _ => IdKind::Bare,
    }
}

/// One [`VideoIdCandidates`] per `<entry>`, in document order.
///
/// Reading stops at the first XML error; entries seen so far are kept.
pub(super) fn collect_video_ids(body: &[u8]) -> Vec<VideoIdCandidates> {
    let mut reader = NsReader::from_reader(body);

    let mut buf = Vec::new();
    let mut entries: Vec<VideoIdCandidates> = Vec::new();
    let mut in_entry = false;
    let mut reading: Option<IdKind> = None;

    loop {
        match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, Event::Start(e))) => {
                let local = e.local_name();
                if local.as_ref() == ENTRY && !in_entry {
                    in_entry = true;
                    entries.push(VideoIdCandidates::default());
                } else if in_entry && local.as_ref() == VIDEO_ID {
                    reading = Some(classify(&ns));
                }
            }
            Ok((_, Event::Empty(e))) => {
                if e.local_name().as_ref() == ENTRY && !in_entry {
                    entries.push(VideoIdCandidates::default());
                }
            }
            Ok((_, Event::Text(text))) => {
                if let (Some(kind), Some(entry)) = (reading.as_ref(), entries.last_mut()) {
                    let value = text.unescape().map(|v| v.into_owned()).unwrap_or_default();
                    let slot = match kind {
                        IdKind::Namespaced => &mut entry.namespaced,
                        IdKind::Bare => &mut entry.bare,
                    };
                    if slot.is_none() {
                        *slot = Some(value);
                    }
                }
            }
            Ok((_, Event::End(e))) => {
                let local = e.local_name();
                if local.as_ref() == VIDEO_ID {
                    reading = None;
                } else if local.as_ref() == ENTRY {
                    in_entry = false;
                    reading = None;
                }
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => {
                tracing::debug!(error = %e, entries = entries.len(), "Stopped reading video ids");
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(body: &str) -> Vec<Option<String>> {
        collect_video_ids(body.as_bytes())
            .iter()
            .map(VideoIdCandidates::resolve)
            .collect()
    }

    #[test]
    fn test_namespaced_id_wins_over_bare() {
        let body = r#"<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015">
            <entry><videoId>bare</videoId><yt:videoId>ns</yt:videoId></entry>
        </feed>"#;
        assert_eq!(ids(body), vec![Some("ns".to_string())]);
    }

    #[test]
    fn test_prefix_bound_to_other_uri_is_bare() {
        let body = r#"<feed xmlns:yt="urn:other" xmlns:v="http://www.youtube.com/xml/schemas/2015">
            <entry><yt:videoId>other</yt:videoId><v:videoId>real</v:videoId></entry>
        </feed>"#;
        let entries = collect_video_ids(body.as_bytes());
        assert_eq!(entries[0].namespaced.as_deref(), Some("real"));
        assert_eq!(entries[0].bare.as_deref(), Some("other"));
    }

    #[test]
    fn test_one_slot_per_entry() {
        let body = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><videoId>a</videoId></entry>
            <entry><title>no id</title></entry>
            <entry><videoId>  </videoId></entry>
        </feed>"#;
        assert_eq!(ids(body), vec![Some("a".to_string()), None, None]);
    }

    #[test]
    fn test_video_id_outside_entry_is_ignored() {
        let body = "<feed><videoId>channel</videoId><entry><title>t</title></entry></feed>";
        assert_eq!(ids(body), vec![None]);
    }
}
